use std::{error::Error, fmt};

use backtrace::Backtrace;
use log::error;

/// The category of a `SmallError`, callers use it to decide whether the
/// whole transaction has to be rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The lock acquisition ran out of its retry budget, the transaction
    /// must be completed with `commit = false`.
    TransactionAborted,

    /// A logical violation inside the storage/execution core (no clean page
    /// to evict, schema mismatch, bad record id...).
    Db,

    /// `next` was called on an iterator that has nothing to give.
    NoSuchElement,

    /// The aggregate operator is not supported for the field type.
    IllegalOperator,

    /// Read/write fault against the backing file.
    Io,
}

#[derive(Debug)]
pub struct SmallError {
    kind: ErrorKind,
    details: String,
}

impl SmallError {
    pub fn new(msg: &str) -> SmallError {
        Self::with_kind(ErrorKind::Db, msg)
    }

    pub fn with_kind(kind: ErrorKind, msg: &str) -> SmallError {
        SmallError {
            kind,
            details: msg.to_string(),
        }
    }

    pub fn aborted(msg: &str) -> SmallError {
        Self::with_kind(ErrorKind::TransactionAborted, msg)
    }

    pub fn no_such_element(msg: &str) -> SmallError {
        Self::with_kind(ErrorKind::NoSuchElement, msg)
    }

    pub fn illegal_operator(msg: &str) -> SmallError {
        Self::with_kind(ErrorKind::IllegalOperator, msg)
    }

    pub fn io(msg: &str) -> SmallError {
        Self::with_kind(ErrorKind::Io, msg)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_aborted(&self) -> bool {
        self.kind == ErrorKind::TransactionAborted
    }

    pub fn show_backtrace(&self) {
        let bt = Backtrace::new();
        error!("error: [{}], backtrace: {:?}", self, bt);
    }
}

impl fmt::Display for SmallError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.details)
    }
}

impl Error for SmallError {
    fn description(&self) -> &str {
        &self.details
    }
}

impl From<std::io::Error> for SmallError {
    fn from(e: std::io::Error) -> Self {
        SmallError::io(&e.to_string())
    }
}
