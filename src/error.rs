use std::{error::Error, fmt, path::Path};

use backtrace::Backtrace;
use log::error;

/// Failure categories surfaced by queue and heap operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Priority 0 is the reserved empty-slot sentinel.
    PriorityZero,
    /// The heap reached its configured node capacity.
    Full,
    /// No item is available.
    Empty,
    /// On-disk state contradicts itself.
    Corrupt,
    /// Underlying filesystem failure; the details name path and operation.
    Io,
    /// Invalid argument or configuration.
    Invalid,
}

pub struct QueueError {
    kind: ErrorKind,
    details: String,
    backtrace: Backtrace,
}

impl QueueError {
    pub fn new(kind: ErrorKind, msg: &str) -> QueueError {
        QueueError {
            kind,
            details: msg.to_string(),
            backtrace: Backtrace::new(),
        }
    }

    pub fn empty(msg: &str) -> QueueError {
        QueueError::new(ErrorKind::Empty, msg)
    }

    pub fn invalid(msg: &str) -> QueueError {
        QueueError::new(ErrorKind::Invalid, msg)
    }

    pub fn io(op: &str, path: &Path, cause: std::io::Error) -> QueueError {
        QueueError::new(
            ErrorKind::Io,
            &format!("{} {}: {}", op, path.display(), cause),
        )
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn show_backtrace(&self) {
        error!("{}\n{:?}", self.details, self.backtrace);
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.details)
    }
}

impl fmt::Debug for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.details)
    }
}

impl Error for QueueError {
    fn description(&self) -> &str {
        &self.details
    }
}
