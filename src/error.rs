use crate::session::Phase;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot scan {}: {source}", .path.display())]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("scan cancelled")]
    Cancelled,
}

impl ScanError {
    pub(crate) fn not_a_directory(path: PathBuf) -> Self {
        Self::InvalidRoot {
            path,
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        }
    }
}

/// An entry the scanner could not read. Traversal carries on without it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("skipped {}: {reason}", .path.display())]
pub struct TraversalSkip {
    pub path: PathBuf,
    pub reason: String,
}

impl TraversalSkip {
    pub fn new(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("cannot {action} while {from:?}")]
    InvalidTransition { from: Phase, action: &'static str },

    #[error("nothing selected")]
    NothingSelected,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_path() {
        let err = ScanError::not_a_directory(PathBuf::from("/tmp/file.txt"));
        assert_eq!(err.to_string(), "cannot scan /tmp/file.txt: not a directory");

        let skip = TraversalSkip::new("/root/secret", "permission denied");
        assert_eq!(skip.to_string(), "skipped /root/secret: permission denied");
    }
}
