use core::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::{heap::BufferPool, types::SmallResult};

pub type TransactionID = u32;

static TRANSACTION_ID: AtomicU32 = AtomicU32::new(1);

/// An opaque token that identifies a transaction. Locks and dirty pages
/// are attributed to it.
///
/// A transaction is used by a single thread, but the token itself can be
/// freely copied (e.g. into the lock table).
#[derive(Eq, Hash, PartialEq, Clone, Copy)]
pub struct Transaction {
    // increase monotonically by 1
    id: TransactionID,
}

impl Transaction {
    pub fn new() -> Self {
        Self {
            id: TRANSACTION_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Flush all pages dirtied by this transaction, then release its
    /// locks.
    pub fn commit(&self, buffer_pool: &BufferPool) -> SmallResult {
        buffer_pool.transaction_complete(self, true)
    }

    /// Discard all pages dirtied by this transaction, then release its
    /// locks.
    pub fn abort(&self, buffer_pool: &BufferPool) -> SmallResult {
        buffer_pool.transaction_complete(self, false)
    }

    pub fn get_id(&self) -> TransactionID {
        self.id
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "tx_{}", self.id)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_id() {
        let a = Transaction::new();
        let b = Transaction::new();
        assert!(b.get_id() > a.get_id());
        assert_ne!(a, b);
        assert_eq!(format!("{}", a), format!("tx_{}", a.get_id()));
    }
}
