use std::fmt;
use thiserror::Error;

/// Error type for module decoding, encoding and validation
///
/// Every variant is fatal to the call that produced it: a failed decode never
/// hands back a partial module and a failed encode makes no promise about what
/// reached the sink. Each error carries enough context (field name, stream
/// offset) to locate the problem, plus a machine-readable code.
///
/// `FieldTooLong` and `InvalidText` are validation failures for text fields;
/// they share the `Validation` category with `ValidationFailed`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModError {
    // ========== I/O ERRORS (1000-1099) ==========
    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Permission denied when accessing file
    #[error("Permission denied accessing file: {path}")]
    PermissionDenied { path: String },

    /// Any other failure reported by the underlying stream
    #[error("I/O error ({kind:?}): {reason}")]
    Io {
        kind: std::io::ErrorKind,
        reason: String,
    },

    // ========== SHORT I/O ERRORS (1100-1199) ==========
    /// The byte source ended before a field was complete
    #[error("Short read of {field} at offset {offset}: needed {needed} bytes, only {available} available")]
    ShortRead {
        field: String,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The byte sink accepted fewer bytes than a field requires
    #[error("Short write of {field} at offset {offset}: expected {expected} bytes, sink accepted {written}")]
    ShortWrite {
        field: String,
        offset: usize,
        expected: usize,
        written: usize,
    },

    // ========== FORMAT ERRORS (2000-2099) ==========
    /// Magic tag is not the recognized "M.K."
    #[error("Format mismatch: expected tag '{expected}', found '{found}' at offset {offset}")]
    FormatMismatch {
        expected: String,
        found: String,
        offset: usize,
    },

    // ========== VALIDATION ERRORS (3000-3099) ==========
    /// A structurally complete module violates a range invariant
    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },

    /// Text does not fit its fixed-length field
    #[error("Text for {field} is {len} bytes, field holds at most {max}")]
    FieldTooLong {
        field: String,
        len: usize,
        max: usize,
    },

    /// Text contains a character that has no single-byte encoding
    #[error("Text for {field} contains {character:?}, which is outside Latin-1")]
    InvalidText { field: String, character: char },
}

impl ModError {
    /// Get the error code for machine-readable processing
    pub fn code(&self) -> u16 {
        match self {
            // I/O Errors (1000-1099)
            Self::FileNotFound { .. } => 1001,
            Self::PermissionDenied { .. } => 1002,
            Self::Io { .. } => 1003,

            // Short I/O Errors (1100-1199)
            Self::ShortRead { .. } => 1101,
            Self::ShortWrite { .. } => 1102,

            // Format Errors (2000-2099)
            Self::FormatMismatch { .. } => 2001,

            // Validation Errors (3000-3099)
            Self::ValidationFailed { .. } => 3001,
            Self::FieldTooLong { .. } => 3002,
            Self::InvalidText { .. } => 3003,
        }
    }

    /// Get the error category for grouping related errors
    pub fn category(&self) -> ErrorCategory {
        match self.code() {
            1000..=1099 => ErrorCategory::IO,
            1100..=1199 => ErrorCategory::ShortIo,
            2000..=2099 => ErrorCategory::Format,
            3000..=3099 => ErrorCategory::Validation,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether the operation could be resumed after this error.
    ///
    /// Always false: decode and encode have no resynchronisation path.
    pub fn is_recoverable(&self) -> bool {
        false
    }

    /// Get suggested action for handling this error
    pub fn suggested_action(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "Check file path and ensure file exists",
            Self::PermissionDenied { .. } => "Check file permissions and user access rights",
            Self::ShortRead { .. } => "File appears to be truncated",
            Self::ShortWrite { .. } => "Check that the destination has room for the whole module",
            Self::FormatMismatch { .. } => "Verify this is a 31-sample M.K. module",
            Self::FieldTooLong { .. } | Self::InvalidText { .. } => {
                "Shorten the name or replace characters outside Latin-1"
            },
            Self::ValidationFailed { .. } => "Fix the reported field before encoding",
            _ => "Check file integrity and module format compliance",
        }
    }
}

/// Error categories for grouping related error types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    IO,
    ShortIo,
    Format,
    Validation,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IO => write!(f, "I/O"),
            Self::ShortIo => write!(f, "Short I/O"),
            Self::Format => write!(f, "Format"),
            Self::Validation => write!(f, "Validation"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result type alias for module operations
pub type ModResult<T> = Result<T, ModError>;

// Field-less conversion; FieldReader/FieldWriter build the richer variants themselves.
impl From<std::io::Error> for ModError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ModError::FileNotFound {
                path: "unknown".to_string(),
            },
            std::io::ErrorKind::PermissionDenied => ModError::PermissionDenied {
                path: "unknown".to_string(),
            },
            std::io::ErrorKind::UnexpectedEof => ModError::ShortRead {
                field: "unknown".to_string(),
                offset: 0,
                needed: 0,
                available: 0,
            },
            std::io::ErrorKind::WriteZero => ModError::ShortWrite {
                field: "unknown".to_string(),
                offset: 0,
                expected: 0,
                written: 0,
            },
            kind => ModError::Io {
                kind,
                reason: err.to_string(),
            },
        }
    }
}
