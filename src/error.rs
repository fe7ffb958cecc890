use thiserror::Error;

/// Why a single telemetry line was dropped
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Rejected filter configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a finite number, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("Failed to read config: {0}")]
    Load(String),
}

/// Fail unless `value` is finite and non-negative.
pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { name, value });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { name, value });
    }
    Ok(value)
}
