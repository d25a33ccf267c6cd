use std::str::FromStr;
use std::time::Instant;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::PropFinError;
use crate::mortgage::validator;
use crate::types::{with_metadata, AmortizationSchedule, ComputationOutput, Money, PaymentRecord};
use crate::PropFinResult;

/// Column headers expected in a lender payment-history export.
const DATE_COL: &str = "date";
const PRINCIPAL_COL: &str = "principal paid";
const INTEREST_COL: &str = "interest paid";
const TOTAL_COL: &str = "total paid";
const BALANCE_COL: &str = "principal balance";

/// Date formats seen across lender exports.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y", "%Y/%m/%d"];

/// Parse a lender payment-history CSV into an amortization schedule.
///
/// Expected columns: `Date, Principal Paid, Interest Paid, Total Paid,
/// Principal Balance` (order-independent, case-insensitive). Rows are
/// re-sorted chronologically and renumbered from 1. The result is checked
/// against the schedule validator; a history that does not terminate near
/// zero is still returned, with the discrepancy as a warning.
pub fn parse_payment_history(
    csv_text: &str,
) -> PropFinResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| PropFinError::StatementParse(e.to_string()))?
        .clone();

    let col = |name: &str| -> PropFinResult<usize> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| PropFinError::StatementParse(format!("Missing column '{name}'")))
    };

    let date_idx = col(DATE_COL)?;
    let principal_idx = col(PRINCIPAL_COL)?;
    let interest_idx = col(INTEREST_COL)?;
    let total_idx = col(TOTAL_COL)?;
    let balance_idx = col(BALANCE_COL)?;

    let mut rows: Vec<(NaiveDate, Money, Money, Money, Money)> = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| PropFinError::StatementParse(e.to_string()))?;
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        let date = parse_date(field(date_idx)).ok_or_else(|| {
            PropFinError::StatementParse(format!(
                "Row {}: unrecognized date '{}'",
                line + 1,
                field(date_idx)
            ))
        })?;

        let money = |idx: usize, name: &str| -> PropFinResult<Money> {
            parse_money(field(idx)).ok_or_else(|| {
                PropFinError::StatementParse(format!(
                    "Row {}: unrecognized {name} amount '{}'",
                    line + 1,
                    field(idx)
                ))
            })
        };

        // lenders export payments as debits; portions are stored unsigned
        let principal = money(principal_idx, "principal")?.abs();
        let interest = money(interest_idx, "interest")?.abs();
        let total = money(total_idx, "total")?.abs();
        let balance = money(balance_idx, "balance")?.abs();

        rows.push((date, principal, interest, total, balance));
    }

    if rows.is_empty() {
        return Err(PropFinError::StatementParse(
            "Statement contains no payment rows".into(),
        ));
    }

    rows.sort_by_key(|r| r.0);

    let mut payments = Vec::with_capacity(rows.len());
    let mut total_interest = Decimal::ZERO;

    for (i, (date, principal, interest, total, balance)) in rows.into_iter().enumerate() {
        total_interest += interest;
        payments.push(PaymentRecord {
            payment_number: (i + 1) as u32,
            payment_date: date,
            total_payment: total,
            principal_portion: principal,
            interest_portion: interest,
            remaining_balance: balance,
        });
    }

    let total_payment_count = payments.len() as u32;
    let final_payment_date = payments
        .last()
        .map(|p| p.payment_date)
        .ok_or_else(|| PropFinError::StatementParse("Statement contains no payment rows".into()))?;

    let schedule = AmortizationSchedule {
        payments,
        total_interest,
        total_payment_count,
        final_payment_date,
    };

    let validation = validator::validate(&schedule);
    if let Some(warning) = validation.warning {
        warnings.push(warning);
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Lender Payment History Import",
        &serde_json::json!({ "rows": total_payment_count }),
        warnings,
        elapsed,
        schedule,
    ))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Tolerant money parsing: `$`, thousands separators and whitespace are
/// stripped; parentheses mean negative.
fn parse_money(raw: &str) -> Option<Money> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let negative_parens = trimmed.starts_with('(') && trimmed.ends_with(')');
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '(' | ')'))
        .collect();

    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if negative_parens { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const STATEMENT: &str = "\
Date,Principal Paid,Interest Paid,Total Paid,Principal Balance
2024-02-01,\"$1,150.25\",\"$849.75\",\"$2,000.00\",\"$247,699.50\"
2024-01-01,\"$1,145.75\",\"$854.25\",\"$2,000.00\",\"$248,849.75\"
2024-03-01,\"$1,154.80\",\"$845.20\",\"$2,000.00\",\"$246,544.70\"
";

    #[test]
    fn test_rows_sorted_and_renumbered() {
        let out = parse_payment_history(STATEMENT).unwrap();
        let s = &out.result;
        assert_eq!(s.total_payment_count, 3);
        assert_eq!(
            s.payments[0].payment_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(s.payments[0].payment_number, 1);
        assert_eq!(s.payments[2].payment_number, 3);
        assert_eq!(s.total_interest, dec!(2549.20));
    }

    #[test]
    fn test_non_terminating_history_warns_but_parses() {
        let out = parse_payment_history(STATEMENT).unwrap();
        // balance never reaches zero: usable, but flagged
        assert!(!out.warnings.is_empty());
        assert_eq!(out.result.payments.last().unwrap().remaining_balance, dec!(246544.70));
    }

    #[test]
    fn test_terminating_history_is_clean() {
        let csv = "\
Date,Principal Paid,Interest Paid,Total Paid,Principal Balance
03/01/2025,\"$980.00\",\"$20.00\",\"$1,000.00\",\"$990.00\"
04/01/2025,\"$990.00\",\"$4.10\",\"$994.10\",\"$0.00\"
";
        let out = parse_payment_history(csv).unwrap();
        assert!(out.warnings.is_empty());
        assert_eq!(out.result.payments.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_signed_and_parenthesized_amounts() {
        assert_eq!(parse_money("($1,234.56)"), Some(dec!(-1234.56)));
        assert_eq!(parse_money("-42.10"), Some(dec!(-42.10)));
        assert_eq!(parse_money("$ 1 500.00"), Some(dec!(1500.00)));
        assert_eq!(parse_money("junk"), None);
    }

    #[test]
    fn test_mixed_date_formats() {
        assert!(parse_date("2024-05-09").is_some());
        assert!(parse_date("05/09/2024").is_some());
        assert!(parse_date("May 9, 2024").is_some());
        assert!(parse_date("not a date").is_none());
    }

    #[test]
    fn test_missing_column_fails() {
        let csv = "Date,Principal Paid,Total Paid,Principal Balance\n2024-01-01,1,2,3\n";
        let err = parse_payment_history(csv).unwrap_err();
        assert!(matches!(err, PropFinError::StatementParse(_)));
    }

    #[test]
    fn test_empty_statement_fails() {
        let csv = "Date,Principal Paid,Interest Paid,Total Paid,Principal Balance\n";
        assert!(parse_payment_history(csv).is_err());
    }
}
