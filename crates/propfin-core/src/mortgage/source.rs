use std::collections::HashMap;

use chrono::NaiveDate;

use crate::mortgage::schedule::build_schedule;
use crate::types::{AmortizationSchedule, MortgageTerms};
use crate::PropFinResult;

/// Where a mortgage's amortization schedule comes from.
///
/// Most mortgages compute their schedule from the annuity formula. Some
/// carry a lender-provided payment history that diverges from theory
/// (irregular payments, rate changes, skipped payments); for those, the
/// recorded history must take precedence over anything computed.
pub trait ScheduleSource {
    fn schedule(
        &self,
        terms: &MortgageTerms,
        as_of: NaiveDate,
    ) -> PropFinResult<AmortizationSchedule>;
}

/// Derives the schedule from the level-payment annuity formula.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComputedAnnuitySource;

impl ScheduleSource for ComputedAnnuitySource {
    fn schedule(
        &self,
        terms: &MortgageTerms,
        as_of: NaiveDate,
    ) -> PropFinResult<AmortizationSchedule> {
        build_schedule(terms, as_of)
    }
}

/// Returns a pre-validated, externally supplied schedule verbatim.
#[derive(Debug, Clone)]
pub struct AuthoritativeRecordSource {
    schedule: AmortizationSchedule,
}

impl AuthoritativeRecordSource {
    pub fn new(schedule: AmortizationSchedule) -> Self {
        Self { schedule }
    }
}

impl ScheduleSource for AuthoritativeRecordSource {
    fn schedule(
        &self,
        _terms: &MortgageTerms,
        _as_of: NaiveDate,
    ) -> PropFinResult<AmortizationSchedule> {
        Ok(self.schedule.clone())
    }
}

/// Resolves a mortgage to its schedule source by lender reference.
///
/// Mortgages with a registered payment history get the recorded schedule;
/// everything else falls through to the annuity computation.
#[derive(Debug, Clone, Default)]
pub struct ScheduleRegistry {
    overrides: HashMap<String, AmortizationSchedule>,
}

impl ScheduleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authoritative schedule for a lender reference.
    pub fn register(&mut self, lender_reference: impl Into<String>, schedule: AmortizationSchedule) {
        self.overrides.insert(lender_reference.into(), schedule);
    }

    pub fn has_override(&self, terms: &MortgageTerms) -> bool {
        terms
            .lender_reference
            .as_deref()
            .is_some_and(|r| self.overrides.contains_key(r))
    }

    /// Schedule for `terms`: the registered override when present, the
    /// computed annuity schedule otherwise.
    pub fn resolve(
        &self,
        terms: &MortgageTerms,
        as_of: NaiveDate,
    ) -> PropFinResult<AmortizationSchedule> {
        if let Some(reference) = terms.lender_reference.as_deref() {
            if let Some(schedule) = self.overrides.get(reference) {
                return AuthoritativeRecordSource::new(schedule.clone()).schedule(terms, as_of);
            }
        }
        ComputedAnnuitySource.schedule(terms, as_of)
    }
}
