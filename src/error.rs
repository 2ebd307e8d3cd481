//! Error types shared by every calculator in the crate

use thiserror::Error;

/// Errors raised while validating inputs, applying lending rules or loading tables
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// An input value is outside the range the formulas accept
    #[error("invalid input '{field}': {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// Down payment below the federal minimum for an insured mortgage
    #[error("down payment of ${down_payment:.2} is below the minimum of ${minimum:.2}")]
    InsufficientDownPayment { down_payment: f64, minimum: f64 },

    /// High-ratio financing requested where default insurance cannot be obtained
    #[error("mortgage default insurance unavailable: {0}")]
    InsuranceUnavailable(String),

    /// Province, territory or municipality code that is not recognised
    #[error("unknown jurisdiction: {0}")]
    UnknownJurisdiction(String),

    /// Malformed assumption table
    #[error("invalid assumptions in {file}: {reason}")]
    Assumptions { file: String, reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Reject negative or non-finite money amounts
pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AnalysisError::invalid(field, format!("must be a non-negative amount, got {}", value)));
    }
    Ok(())
}

/// Reject rates outside [0, 1]
pub(crate) fn ensure_fraction(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(AnalysisError::invalid(field, format!("must be between 0 and 1, got {}", value)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AnalysisError::invalid("purchase_price", "must be positive");
        assert_eq!(err.to_string(), "invalid input 'purchase_price': must be positive");

        let err = AnalysisError::InsufficientDownPayment { down_payment: 10_000.0, minimum: 25_000.0 };
        assert_eq!(err.to_string(), "down payment of $10000.00 is below the minimum of $25000.00");
    }

    #[test]
    fn test_range_checks() {
        assert!(ensure_non_negative("x", 0.0).is_ok());
        assert!(ensure_non_negative("x", -1.0).is_err());
        assert!(ensure_non_negative("x", f64::NAN).is_err());
        assert!(ensure_fraction("x", 1.0).is_ok());
        assert!(ensure_fraction("x", 1.01).is_err());
    }
}
