use core::fmt;
use std::collections::{HashMap, HashSet};

use super::Transaction;
use crate::heap::HeapPageID;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Lock {
    XLock,
    SLock,
}

/// The access a caller asks for when fetching a page.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

impl Permission {
    pub fn to_lock(&self) -> Lock {
        match self {
            Permission::ReadOnly => Lock::SLock,
            Permission::ReadWrite => Lock::XLock,
        }
    }
}

/// Page-granularity lock table.
///
/// For every page, either any number of transactions hold a shared lock,
/// or exactly one transaction holds the exclusive lock. A lock request
/// never blocks here, it reports failure and lets the caller decide
/// whether to retry.
#[derive(Default)]
pub struct LockManager {
    s_lock_map: HashMap<HeapPageID, HashSet<Transaction>>,
    x_lock_map: HashMap<HeapPageID, Transaction>,

    hold_pages: HashMap<Transaction, HashSet<HeapPageID>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to add a lock on the given page, this api is idempotent.
    ///
    /// # Return
    ///
    /// Whether the lock is granted.
    pub fn add_lock(&mut self, tx: &Transaction, lock: &Lock, page_id: &HeapPageID) -> bool {
        if let Some(holder) = self.x_lock_map.get(page_id) {
            if holder != tx {
                return false;
            }

            // The exclusive lock covers both kinds of request.
            return true;
        }

        match lock {
            Lock::SLock => {
                self.s_lock_map
                    .entry(*page_id)
                    .or_insert_with(HashSet::new)
                    .insert(*tx);
            }
            Lock::XLock => {
                if let Some(holders) = self.s_lock_map.get(page_id) {
                    if holders.iter().any(|holder| holder != tx) {
                        return false;
                    }
                }

                // upgrade: the requester is the only shared holder (or
                // there is no holder at all)
                self.s_lock_map.remove(page_id);
                self.x_lock_map.insert(*page_id, *tx);
            }
        }

        self.hold_pages
            .entry(*tx)
            .or_insert_with(HashSet::new)
            .insert(*page_id);
        true
    }

    /// Remove the lock held by `tx` on the page, whatever its kind.
    pub fn unlock(&mut self, tx: &Transaction, page_id: &HeapPageID) {
        if let Some(holders) = self.s_lock_map.get_mut(page_id) {
            holders.remove(tx);
            if holders.is_empty() {
                self.s_lock_map.remove(page_id);
            }
        }

        if self.x_lock_map.get(page_id) == Some(tx) {
            self.x_lock_map.remove(page_id);
        }

        if let Some(pages) = self.hold_pages.get_mut(tx) {
            pages.remove(page_id);
            if pages.is_empty() {
                self.hold_pages.remove(tx);
            }
        }
    }

    /// Remove every lock held by `tx`.
    pub fn release_locks(&mut self, tx: &Transaction) {
        let pages = match self.hold_pages.remove(tx) {
            Some(pages) => pages,
            None => return,
        };

        for page_id in pages {
            self.unlock(tx, &page_id);
        }
    }

    pub fn holds_lock(&self, tx: &Transaction, page_id: &HeapPageID) -> bool {
        self.hold_pages
            .get(tx)
            .map_or(false, |pages| pages.contains(page_id))
    }

    /// The kind of lock `tx` holds on the page, if any.
    pub fn lock_kind(&self, tx: &Transaction, page_id: &HeapPageID) -> Option<Lock> {
        if self.x_lock_map.get(page_id) == Some(tx) {
            return Some(Lock::XLock);
        }

        match self.s_lock_map.get(page_id) {
            Some(holders) if holders.contains(tx) => Some(Lock::SLock),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.s_lock_map.clear();
        self.x_lock_map.clear();
        self.hold_pages.clear();
    }
}

impl fmt::Display for LockManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut depiction = "\n".to_string();

        depiction.push_str("s_lock_map: {");
        for (k, v) in self.s_lock_map.iter() {
            depiction.push_str(&format!("\n\t{} -> [", k));
            for tx in v {
                depiction.push_str(&format!("\n\t\t{}, ", tx));
            }
            depiction.push_str("\n\t]");
        }
        depiction.push_str("\n}\n");

        depiction.push_str("x_lock_map: {");
        for (k, v) in self.x_lock_map.iter() {
            depiction.push_str(&format!("\n\t{} -> {}, ", k, v));
        }
        depiction.push_str("\n}\n");

        depiction.push_str("hold_pages: {");
        for (k, v) in self.hold_pages.iter() {
            depiction.push_str(&format!("\n\t{} -> [", k));
            for page_id in v {
                depiction.push_str(&format!("\n\t\t{}, ", page_id));
            }
            depiction.push_str("\n\t]");
        }
        depiction.push_str("\n}\n");

        write!(f, "{}", depiction)
    }
}

impl fmt::Debug for LockManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
