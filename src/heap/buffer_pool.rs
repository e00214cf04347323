use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, RwLock},
    thread::sleep,
    time::Duration,
};

use log::{debug, error};

use super::{HeapPage, HeapPageID};
use crate::{
    common::Catalog,
    error::SmallError,
    storage::Tuple,
    transaction::{Lock, LockManager, Permission, Transaction},
    types::{Pod, ResultPod, SmallResult},
    utils::HandyRwLock,
};

pub const PAGE_SIZE: usize = 4096;

/// Default number of pages passed to the constructor.
pub const DEFAULT_PAGES: usize = 50;

/// How hard `get_page` tries to acquire a page lock before aborting the
/// transaction.
#[derive(Debug, Clone, Copy)]
pub struct LockPolicy {
    pub retries: usize,
    pub interval: Duration,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            retries: 5,
            interval: Duration::from_millis(20),
        }
    }
}

/// Everything guarded by the coarse cache latch.
#[derive(Default)]
struct PoolState {
    pages: HashMap<HeapPageID, Pod<HeapPage>>,

    // pages fetched with write permission by each transaction
    dirty_pages: HashMap<Transaction, HashSet<HeapPageID>>,

    // eviction order, the page with the smallest stamp goes first
    stamps: HashMap<HeapPageID, u64>,
    clock: u64,
}

impl PoolState {
    fn stamp(&mut self, pid: &HeapPageID) {
        self.clock += 1;
        self.stamps.insert(*pid, self.clock);
    }

    // Called on a cache hit, only LRU cares about it.
    fn touch(&mut self, pid: &HeapPageID) {
        if !cfg!(feature = "replacement_fifo") {
            self.stamp(pid);
        }
    }

    fn remove(&mut self, pid: &HeapPageID) -> Option<Pod<HeapPage>> {
        self.stamps.remove(pid);
        self.pages.remove(pid)
    }
}

/// A fixed-capacity page cache over the heap tables of a catalog.
///
/// - Every page is locked on behalf of a transaction before it's handed
///   out (shared for read-only, exclusive for read-write).
/// - NO-STEAL: dirty pages are never written back or evicted before
///   their transaction commits.
/// - FORCE: commit writes all pages dirtied by the transaction.
pub struct BufferPool {
    page_limit: usize,

    catalog: Arc<Catalog>,

    state: RwLock<PoolState>,

    lock_manager: RwLock<LockManager>,

    lock_policy: LockPolicy,
}

impl BufferPool {
    pub fn new(page_limit: usize, catalog: Arc<Catalog>) -> Self {
        Self::with_lock_policy(page_limit, catalog, LockPolicy::default())
    }

    pub fn with_lock_policy(
        page_limit: usize,
        catalog: Arc<Catalog>,
        lock_policy: LockPolicy,
    ) -> Self {
        Self {
            page_limit,
            catalog,
            state: RwLock::new(PoolState::default()),
            lock_manager: RwLock::new(LockManager::new()),
            lock_policy,
        }
    }

    pub fn get_page_size() -> usize {
        PAGE_SIZE
    }

    pub fn get_page_limit(&self) -> usize {
        self.page_limit
    }

    pub fn get_catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The number of pages currently cached.
    pub fn cached_pages_count(&self) -> usize {
        self.state.rl().pages.len()
    }

    pub fn is_cached(&self, pid: &HeapPageID) -> bool {
        self.state.rl().pages.contains_key(pid)
    }

    /// Retrieve the specified page with the associated permission.
    ///
    /// The lock is acquired first, this may sleep and retry while another
    /// transaction holds a conflicting lock, and fails with
    /// `TransactionAborted` once the retry budget is spent. Then the page
    /// is looked up in the cache, or loaded from its table (evicting a
    /// clean page if the pool is full).
    pub fn get_page(
        &self,
        tx: &Transaction,
        perm: Permission,
        pid: &HeapPageID,
    ) -> ResultPod<HeapPage> {
        self.acquire_lock(tx, &perm.to_lock(), pid)?;

        let mut state = self.state.wl();
        if perm == Permission::ReadWrite {
            state
                .dirty_pages
                .entry(*tx)
                .or_insert_with(HashSet::new)
                .insert(*pid);
        }

        if let Some(page_rc) = state.pages.get(pid).cloned() {
            state.touch(pid);
            return Ok(page_rc);
        }

        if state.pages.len() >= self.page_limit {
            self.evict(&mut state)?;
        }

        let table = self.catalog.get_table(pid.get_table_id())?;
        let page_rc = Arc::new(RwLock::new(table.read_page(pid)?));
        state.pages.insert(*pid, Arc::clone(&page_rc));
        state.stamp(pid);
        Ok(page_rc)
    }

    fn acquire_lock(&self, tx: &Transaction, lock: &Lock, pid: &HeapPageID) -> SmallResult {
        for _ in 0..self.lock_policy.retries {
            if self.lock_manager.wl().add_lock(tx, lock, pid) {
                return Ok(());
            }

            sleep(self.lock_policy.interval);
        }

        error!(
            "acquire lock failed, args: {}, {:?}, {}, lock table: {}",
            tx,
            lock,
            pid,
            self.lock_manager.rl()
        );
        let err = SmallError::aborted(&format!(
            "{} can't acquire {:?} on {} after {} attempts",
            tx, lock, pid, self.lock_policy.retries
        ));
        err.show_backtrace();
        Err(err)
    }

    /// Release the lock `tx` holds on the page.
    ///
    /// Only safe when the transaction didn't modify the page.
    pub fn release_page(&self, tx: &Transaction, pid: &HeapPageID) {
        self.lock_manager.wl().unlock(tx, pid);
    }

    pub fn holds_lock(&self, tx: &Transaction, pid: &HeapPageID) -> bool {
        self.lock_manager.rl().holds_lock(tx, pid)
    }

    /// Add a tuple to the table on behalf of `tx`, the modified page is
    /// marked dirty.
    pub fn insert_tuple(&self, tx: &Transaction, table_id: u32, tuple: &Tuple) -> SmallResult {
        let table = self.catalog.get_table(table_id)?;
        let page_rc = table.insert_tuple(self, tx, tuple)?;
        self.set_dirty(tx, page_rc)
    }

    /// Remove a tuple (located by its record id) on behalf of `tx`, the
    /// modified page is marked dirty.
    pub fn delete_tuple(&self, tx: &Transaction, tuple: &Tuple) -> SmallResult {
        let rid = tuple
            .get_rid()
            .ok_or_else(|| SmallError::new(&format!("tuple {} has no record id", tuple)))?;
        let table = self.catalog.get_table(rid.pid.get_table_id())?;
        let page_rc = table.delete_tuple(self, tx, tuple)?;
        self.set_dirty(tx, page_rc)
    }

    fn set_dirty(&self, tx: &Transaction, page_rc: Pod<HeapPage>) -> SmallResult {
        let pid = {
            let mut page = page_rc.wl();
            page.mark_dirty(Some(*tx));
            page.get_pid()
        };

        let mut state = self.state.wl();

        // The page may have been evicted (while still clean) after it was
        // handed out.
        if !state.pages.contains_key(&pid) {
            if state.pages.len() >= self.page_limit {
                self.evict(&mut state)?;
            }
            state.stamp(&pid);
        }
        state.pages.insert(pid, page_rc);

        state
            .dirty_pages
            .entry(*tx)
            .or_insert_with(HashSet::new)
            .insert(pid);
        Ok(())
    }

    /// Commit or abort the transaction.
    ///
    /// On commit, every page dirtied by `tx` is written to disk; on abort,
    /// they are dropped from the cache so the next reader gets the disk
    /// version. Either way all locks of `tx` are released afterwards, even
    /// when a write fails.
    pub fn transaction_complete(&self, tx: &Transaction, commit: bool) -> SmallResult {
        let result = {
            let mut state = self.state.wl();
            let pids = state.dirty_pages.remove(tx).unwrap_or_default();

            let mut result = Ok(());
            for pid in pids {
                let outcome = if commit {
                    self.flush_page_by(&mut state, &pid, Some(tx))
                } else {
                    self.discard_page_by(&mut state, &pid, tx);
                    Ok(())
                };

                if let Err(e) = outcome {
                    error!("{} failed to flush {}: {}", tx, pid, e);
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
            result
        };

        self.lock_manager.wl().release_locks(tx);
        debug!("{} completed, commit: {}", tx, commit);
        result
    }

    /// Write all pages dirtied by `tx` to disk, the transaction keeps its
    /// locks.
    pub fn flush_pages(&self, tx: &Transaction) -> SmallResult {
        let mut state = self.state.wl();
        let pids: Vec<HeapPageID> = state
            .dirty_pages
            .get(tx)
            .map(|pids| pids.iter().cloned().collect())
            .unwrap_or_default();

        for pid in pids {
            self.flush_page_by(&mut state, &pid, Some(tx))?;
        }
        Ok(())
    }

    /// Write the page to disk if it's cached and dirty, no matter which
    /// transaction dirtied it.
    pub fn flush_page(&self, pid: &HeapPageID) -> SmallResult {
        let mut state = self.state.wl();
        self.flush_page_by(&mut state, pid, None)
    }

    /// Write all dirty pages to disk.
    ///
    /// This breaks NO-STEAL for running transactions, it's meant for
    /// tests and shutdown.
    pub fn flush_all_pages(&self) -> SmallResult {
        let mut state = self.state.wl();
        let pids: Vec<HeapPageID> = state.pages.keys().cloned().collect();
        for pid in pids {
            self.flush_page_by(&mut state, &pid, None)?;
        }
        Ok(())
    }

    // Flush the page if it's dirty, and (when `owner` is given) dirtied
    // by that transaction.
    fn flush_page_by(
        &self,
        state: &mut PoolState,
        pid: &HeapPageID,
        owner: Option<&Transaction>,
    ) -> SmallResult {
        let page_rc = match state.pages.get(pid) {
            Some(page_rc) => Arc::clone(page_rc),
            None => return Ok(()),
        };

        let mut page = page_rc.wl();
        let dirtied_by = match page.is_dirty() {
            Some(tx) => tx,
            None => return Ok(()),
        };
        if owner.map_or(false, |owner| owner != &dirtied_by) {
            return Ok(());
        }

        let table = self.catalog.get_table(pid.get_table_id())?;
        table.write_page(&page)?;
        page.mark_dirty(None);
        debug!("flush page {} (dirtied by {})", pid, dirtied_by);
        Ok(())
    }

    /// Remove the page from the cache without writing it back.
    pub fn discard_page(&self, pid: &HeapPageID) {
        self.state.wl().remove(pid);
    }

    // Drop the page if `tx` is the one that dirtied it, a page that is
    // clean or dirtied by someone else is left alone.
    fn discard_page_by(&self, state: &mut PoolState, pid: &HeapPageID, tx: &Transaction) {
        let dirtied_by_tx = state
            .pages
            .get(pid)
            .map_or(false, |page_rc| page_rc.rl().is_dirty() == Some(*tx));

        if dirtied_by_tx {
            state.remove(pid);
            debug!("discard page {} (dirtied by {})", pid, tx);
        }
    }

    /// Evict one clean page from the cache.
    ///
    /// Fails when every cached page is dirty.
    pub fn evict_page(&self) -> SmallResult {
        let mut state = self.state.wl();
        self.evict(&mut state)
    }

    // Pick the clean page with the smallest stamp: the least recently used
    // one by default, the earliest loaded one with `replacement_fifo`.
    fn evict(&self, state: &mut PoolState) -> SmallResult {
        let stamps = &state.stamps;
        let victim = state
            .pages
            .iter()
            .filter(|(_, page_rc)| page_rc.rl().is_dirty().is_none())
            .map(|(pid, _)| *pid)
            .min_by_key(|pid| stamps.get(pid).cloned().unwrap_or(0));

        match victim {
            Some(pid) => {
                // flushing a clean page is a no-op, so the victim is simply
                // dropped
                state.remove(&pid);
                debug!("evict page {}", pid);
                Ok(())
            }
            None => Err(SmallError::new(&format!(
                "all {} cached pages are dirty, no page can be evicted",
                state.pages.len()
            ))),
        }
    }

    /// Drop all cached pages and locks.
    pub fn clear(&self) {
        let mut state = self.state.wl();
        *state = PoolState::default();
        self.lock_manager.wl().clear();
    }
}
