use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unknown genre: '{0}'")]
    UnknownGenre(String),

    #[error("Unknown country: '{0}'")]
    UnknownCountry(String),

    #[error("Malformed decay curve: {0}")]
    MalformedCurve(String),

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Numeric overflow in {context}")]
    Overflow { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PricingError {
    /// Lookup-table problems: missing keys or a curve that breaks the anchor rules.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            PricingError::UnknownGenre(_)
                | PricingError::UnknownCountry(_)
                | PricingError::MalformedCurve(_)
        )
    }

    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PricingError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for PricingError {
    fn from(e: serde_json::Error) -> Self {
        PricingError::SerializationError(e.to_string())
    }
}
