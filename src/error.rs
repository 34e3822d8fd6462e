// src/error.rs
use std::fmt;

/// External error taxonomy exposed through the simulation context.
///
/// Every pricing operation records one of these in the context's last-error
/// slot; callers inspect it after each call. The set is deliberately small —
/// there are no recoverable transient faults in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorCode {
    /// Operation completed
    #[default]
    Success,
    /// An allocation failed
    OutOfMemory,
    /// Rejected numeric precondition
    InvalidArgument,
    /// Worker spawn failed
    ThreadingError,
}

impl ErrorCode {
    /// Fixed English translation for each code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Success => "success",
            ErrorCode::OutOfMemory => "out of memory",
            ErrorCode::InvalidArgument => "invalid argument",
            ErrorCode::ThreadingError => "thread creation failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal error type for the pricing engine
#[derive(Debug, Clone)]
pub enum PricingError {
    /// Invalid parameter values
    InvalidParameters {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Invalid simulation configuration
    InvalidConfiguration { field: String, reason: String },

    /// Worker thread spawn failure during parallel dispatch
    ThreadSpawn { worker: usize, reason: String },

    /// Numerical instability in an estimator
    NumericalInstability { method: String, reason: String },
}

impl PricingError {
    /// Fold the internal error into the external taxonomy.
    ///
    /// The sentinel-returning context wrappers use this at the outer
    /// boundary; internal code propagates `PricingError` with `?`.
    pub fn code(&self) -> ErrorCode {
        match self {
            PricingError::InvalidParameters { .. } => ErrorCode::InvalidArgument,
            PricingError::InvalidConfiguration { .. } => ErrorCode::InvalidArgument,
            PricingError::ThreadSpawn { .. } => ErrorCode::ThreadingError,
            PricingError::NumericalInstability { .. } => ErrorCode::InvalidArgument,
        }
    }
}

impl fmt::Display for PricingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingError::InvalidParameters {
                parameter,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid parameter '{}' = {}: {}",
                    parameter, value, constraint
                )
            }
            PricingError::InvalidConfiguration { field, reason } => {
                write!(f, "Invalid configuration for '{}': {}", field, reason)
            }
            PricingError::ThreadSpawn { worker, reason } => {
                write!(f, "Failed to spawn worker thread {}: {}", worker, reason)
            }
            PricingError::NumericalInstability { method, reason } => {
                write!(f, "Numerical instability in {}: {}", method, reason)
            }
        }
    }
}

impl std::error::Error for PricingError {}

/// Result type alias for pricing operations
pub type PricingResult<T> = Result<T, PricingError>;

/// Validation utilities
pub mod validation {
    use super::{PricingError, PricingResult};

    /// Validate that a parameter is positive
    pub fn validate_positive(name: &str, value: f64) -> PricingResult<()> {
        if value <= 0.0 || !value.is_finite() {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a parameter is non-negative
    pub fn validate_non_negative(name: &str, value: f64) -> PricingResult<()> {
        if value < 0.0 || !value.is_finite() {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be non-negative (≥ 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> PricingResult<()> {
        if !value.is_finite() {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate a correlation parameter
    pub fn validate_correlation(name: &str, rho: f64) -> PricingResult<()> {
        if !(-1.0..=1.0).contains(&rho) {
            Err(PricingError::InvalidParameters {
                parameter: name.to_string(),
                value: rho,
                constraint: "must be in range [-1, 1]".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate a path count
    pub fn validate_paths(paths: usize) -> PricingResult<()> {
        if paths == 0 {
            Err(PricingError::InvalidConfiguration {
                field: "paths".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate a step/observation count
    pub fn validate_steps(steps: usize) -> PricingResult<()> {
        if steps == 0 {
            Err(PricingError::InvalidConfiguration {
                field: "steps".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("sigma", 0.2).is_ok());
        assert!(validate_positive("sigma", 0.0).is_err());
        assert!(validate_positive("sigma", -0.1).is_err());
        assert!(validate_positive("sigma", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_correlation() {
        assert!(validate_correlation("rho", 0.5).is_ok());
        assert!(validate_correlation("rho", -1.0).is_ok());
        assert!(validate_correlation("rho", 1.0).is_ok());
        assert!(validate_correlation("rho", 1.1).is_err());
        assert!(validate_correlation("rho", -1.1).is_err());
    }

    #[test]
    fn test_error_code_folding() {
        let err = PricingError::InvalidParameters {
            parameter: "s0".to_string(),
            value: -1.0,
            constraint: "must be positive".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        let err = PricingError::ThreadSpawn {
            worker: 3,
            reason: "resource exhausted".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::ThreadingError);
    }

    #[test]
    fn test_error_strings() {
        assert_eq!(ErrorCode::Success.as_str(), "success");
        assert_eq!(ErrorCode::OutOfMemory.as_str(), "out of memory");
        assert_eq!(ErrorCode::InvalidArgument.as_str(), "invalid argument");
        assert_eq!(ErrorCode::ThreadingError.as_str(), "thread creation failed");
    }

    #[test]
    fn test_error_display() {
        let error = PricingError::InvalidParameters {
            parameter: "sigma".to_string(),
            value: -0.1,
            constraint: "must be positive".to_string(),
        };

        let display = format!("{}", error);
        assert!(display.contains("sigma"));
        assert!(display.contains("-0.1"));
        assert!(display.contains("positive"));
    }
}
