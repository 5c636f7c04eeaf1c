use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoanScenarioError {
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration { field: String, reason: String },

    #[error("Non-convergent schedule: balance {remaining_balance} not amortised at period {period}")]
    NonConvergentSchedule {
        period: u32,
        remaining_balance: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl LoanScenarioError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        LoanScenarioError::InvalidConfiguration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for LoanScenarioError {
    fn from(e: serde_json::Error) -> Self {
        LoanScenarioError::SerializationError(e.to_string())
    }
}
