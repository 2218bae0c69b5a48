//! Error types for dotkit operations.

use thiserror::Error;

/// The main error type for dotkit operations.
///
/// Variants follow the failure kinds callers need to tell apart: lookups that
/// miss, conflict-policy hits, schema violations, and I/O or parse failures.
#[derive(Error, Debug)]
pub enum DotkitError {
    /// A kit, hook, or artifact lookup missed
    #[error("Not found: {0}")]
    NotFound(String),

    /// ERROR conflict policy hit an existing destination
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Manifest or hook schema violation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Kit-related error
    #[error("Kit error: {0}")]
    Kit(String),

    /// Hook execution error
    #[error("Hook execution error: {0}")]
    Hook(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal bug - should never happen in production
    #[error("Bug detected: {0}\n\nThis is an internal error. Please report this issue at:\nhttps://github.com/dotkit-dev/dotkit/issues")]
    Bug(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl DotkitError {
    /// Whether this error is a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DotkitError::NotFound(_))
    }

    /// Whether this error came from the ERROR conflict policy.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DotkitError::Conflict(_))
    }
}

/// A specialized Result type for dotkit operations.
pub type Result<T> = std::result::Result<T, DotkitError>;

/// Helper macro to create and return a DotkitError::Bug
///
/// This should be used for conditions that should never occur
/// in normal operation and indicate a bug in dotkit itself.
///
/// # Example
///
/// ```ignore
/// if some_impossible_condition {
///     bug!("This should never happen: {:?}", condition);
/// }
/// ```
#[macro_export]
macro_rules! bug {
    ($msg:expr) => {
        return Err($crate::DotkitError::Bug($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::DotkitError::Bug(format!($fmt, $($arg)*)))
    };
}

/// Helper macro to bail out with a DotkitError
///
/// This is used for expected error conditions.
///
/// # Example
///
/// ```ignore
/// if !valid {
///     bail!(Validation, "Invalid manifest: {}", reason);
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($variant:ident, $msg:expr) => {
        return Err($crate::DotkitError::$variant($msg.to_string()))
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::DotkitError::$variant(format!($fmt, $($arg)*)))
    };
    ($msg:expr) => {
        return Err($crate::DotkitError::Other($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::DotkitError::Other(format!($fmt, $($arg)*)))
    };
}
