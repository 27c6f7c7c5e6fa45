use std::fmt;

/// Errors raised while parsing a cron expression.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CronError {
    /// The expression does not have exactly five fields.
    #[error("expected 5 fields, found {0}")]
    FieldCount(usize),

    /// A field (or a comma-separated part of one) is empty.
    #[error("empty {field} field")]
    EmptyField { field: &'static str },

    /// A value is neither a number nor a recognized name.
    #[error("invalid {field} value '{value}'")]
    InvalidValue { field: &'static str, value: String },

    /// A numeric value falls outside the field's bounds.
    #[error("{field} value {value} out of range {min}-{max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// A range whose start is after its end.
    #[error("invalid {field} range '{range}'")]
    InvalidRange { field: &'static str, range: String },

    /// A step that is zero or not a number.
    #[error("invalid {field} step '{step}'")]
    InvalidStep { field: &'static str, step: String },
}

/// Errors that can occur in the condition gate.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// Group configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Group configuration could not be parsed.
    #[error("configuration parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Reading configuration from disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PartialEq for GateError {
    fn eq(&self, other: &Self) -> bool {
        // Compare by display representation for test convenience.
        fmt::format(format_args!("{self}")) == fmt::format(format_args!("{other}"))
    }
}

/// Convenience alias for gate results.
pub type GateResult<T> = Result<T, GateError>;
