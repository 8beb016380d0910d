//! Error types for SyncView
//!
//! Pane-local failures (missing assets, unreachable render servers, absent
//! delegate renderers) are recovered inside the pane and only ever logged.
//! The variants below surface to callers for configuration and caller errors.

use std::fmt;

/// Result type for SyncView operations
pub type Result<T> = std::result::Result<T, Error>;

/// SyncView errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Initialization failed (backend creation, mount)
    InitializationFailed(String),

    /// Rendering backend error
    BackendError(String),

    /// Asset missing, unreadable or corrupt
    AssetUnavailable(String),

    /// Remote frame request failed (transport error, non-2xx status)
    RemoteRequestFailed(String),

    /// Optional delegate renderer could not be acquired or rejected a scene
    DelegateUnavailable(String),

    /// No viewport registered under this id
    UnknownViewport(String),

    /// A viewport with this id is already registered
    DuplicateViewport(String),

    /// Configuration or scene descriptor could not be parsed
    InvalidConfig(String),

    /// Colour string is not `#rrggbb`
    InvalidColor(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::AssetUnavailable(msg) => write!(f, "Asset unavailable: {}", msg),
            Error::RemoteRequestFailed(msg) => write!(f, "Remote request failed: {}", msg),
            Error::DelegateUnavailable(msg) => write!(f, "Delegate renderer unavailable: {}", msg),
            Error::UnknownViewport(id) => write!(f, "Unknown viewport: {}", id),
            Error::DuplicateViewport(id) => write!(f, "Duplicate viewport: {}", id),
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::InvalidColor(text) => write!(f, "Invalid color: {}", text),
        }
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}

/// Log a backend error and build the corresponding `Error::BackendError`
///
/// # Example
///
/// ```no_run
/// # use syncview_core::viewer_err;
/// let err = viewer_err!("syncview::HeadlessBackend", "Unknown geometry handle {:?}", 3);
/// ```
#[macro_export]
macro_rules! viewer_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!(),
        );
        $crate::syncview::Error::BackendError(message)
    }};
}

/// Log a backend error and return it from the current function
#[macro_export]
macro_rules! viewer_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::viewer_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
