use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PropFinError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error(
        "Non-amortizing payment: level payment {payment} does not exceed interest due {interest_due}"
    )]
    NonAmortizingPayment {
        payment: Decimal,
        interest_due: Decimal,
    },

    #[error("Unrecognized payment frequency: '{0}'")]
    InvalidFrequency(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Statement parse error: {0}")]
    StatementParse(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for PropFinError {
    fn from(e: serde_json::Error) -> Self {
        PropFinError::SerializationError(e.to_string())
    }
}
