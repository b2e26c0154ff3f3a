// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in tack return `error::Result<T>`.  No panics in
// production paths; errors surface as user-facing dialogs (see
// `platform::win32::window::show_error_dialog`) or as log records.

use thiserror::Error;

/// Every error that tack can produce.
#[derive(Debug, Error)]
pub enum TackError {
    /// A Win32 API call returned a failure code.
    #[cfg(windows)]
    #[error("{function} failed (error {code:#010x})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// A standard I/O error (file open, read, write, …).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file exists but is not valid JSON for `Settings`.
    #[error("invalid settings file: {0}")]
    Settings(#[from] serde_json::Error),

    /// A Replace All pattern failed to compile.
    #[error("invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),
}

// Convert a windows-crate error (HRESULT) directly into a TackError so that
// `?` can be used on `windows::core::Result<T>` throughout the platform module.
#[cfg(windows)]
impl From<windows::core::Error> for TackError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_error_display_names_the_cause() {
        let err: TackError = regex::Regex::new("(").unwrap_err().into();
        assert!(err.to_string().starts_with("invalid search pattern:"));
    }

    #[test]
    fn io_error_keeps_source() {
        use std::error::Error as _;
        let err: TackError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.to_string(), "I/O error: gone");
        assert!(err.source().is_some());
    }
}
