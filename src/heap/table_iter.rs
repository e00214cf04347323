use std::{sync::Arc, vec};

use super::{BufferPool, HeapPageID};
use crate::{
    error::SmallError,
    storage::Tuple,
    transaction::{Permission, Transaction},
    utils::HandyRwLock,
};

/// Iterate over all tuples of a heap table, in page order then slot
/// order.
///
/// Pages are fetched lazily with read-only permission. The tuples of the
/// current page are copied out, so the page latch is not held between two
/// calls. The page lock is held until the transaction completes.
pub struct HeapTableIterator {
    buffer_pool: Arc<BufferPool>,
    tx: Transaction,
    table_id: u32,

    // the index of the next page to load
    page_index: usize,
    page_it: vec::IntoIter<Tuple>,
}

impl HeapTableIterator {
    pub fn new(buffer_pool: &Arc<BufferPool>, tx: &Transaction, table_id: u32) -> Self {
        Self {
            buffer_pool: Arc::clone(buffer_pool),
            tx: *tx,
            table_id,
            page_index: 0,
            page_it: Vec::new().into_iter(),
        }
    }

    /// Restart from the first page. Locks acquired so far are kept.
    pub fn rewind(&mut self) {
        self.page_index = 0;
        self.page_it = Vec::new().into_iter();
    }

    fn next_tuple(&mut self) -> Result<Option<Tuple>, SmallError> {
        loop {
            if let Some(t) = self.page_it.next() {
                return Ok(Some(t));
            }

            // The page count is checked every time since the table may grow
            // during the scan.
            let table = self.buffer_pool.get_catalog().get_table(self.table_id)?;
            if self.page_index >= table.pages_count()? {
                return Ok(None);
            }

            let pid = HeapPageID::new(self.table_id, self.page_index as u32);
            let page_rc = self
                .buffer_pool
                .get_page(&self.tx, Permission::ReadOnly, &pid)?;
            let tuples: Vec<Tuple> = page_rc.rl().iter().cloned().collect();

            self.page_it = tuples.into_iter();
            self.page_index += 1;
        }
    }
}

impl Iterator for HeapTableIterator {
    type Item = Result<Tuple, SmallError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_tuple().transpose()
    }
}
