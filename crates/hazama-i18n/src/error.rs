//! Error type shared by catalog loading and settings parsing.

use std::io;
use std::path::PathBuf;

/// Errors from i18n operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nError {
    /// A translation source was not well-formed.
    MalformedResource {
        /// Byte offset in the input where the problem was detected.
        position: u64,
        /// Human-readable description.
        reason: String,
    },
    /// A file could not be read.
    Io {
        path: PathBuf,
        kind: io::ErrorKind,
        message: String,
    },
    /// The settings file could not be parsed.
    Config(String),
}

impl I18nError {
    pub(crate) fn malformed(position: u64, reason: impl Into<String>) -> Self {
        Self::MalformedResource {
            position,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: &io::Error) -> Self {
        Self::Io {
            path: path.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Whether this error means the file simply does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { kind, .. } if *kind == io::ErrorKind::NotFound)
    }
}

impl std::fmt::Display for I18nError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedResource { position, reason } => {
                write!(f, "malformed resource at byte {position}: {reason}")
            }
            Self::Io { path, message, .. } => {
                write!(f, "cannot read {}: {message}", path.display())
            }
            Self::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for I18nError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_malformed() {
        let err = I18nError::malformed(42, "message outside of a context");
        assert_eq!(
            err.to_string(),
            "malformed resource at byte 42: message outside of a context"
        );
    }

    #[test]
    fn not_found_detection() {
        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(I18nError::io("lang/xx.ts", &missing).is_not_found());

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(!I18nError::io("lang/xx.ts", &denied).is_not_found());
        assert!(!I18nError::Config("bad".into()).is_not_found());
    }
}
