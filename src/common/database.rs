use std::sync::Arc;

use super::Catalog;
use crate::heap::{BufferPool, LockPolicy, DEFAULT_PAGES};

/// The shared components of a database: the catalog and the buffer pool
/// on top of it.
///
/// There is no global instance, every component that needs storage access
/// gets these handles explicitly.
pub struct Database {
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
}

impl Database {
    pub fn new(page_limit: usize) -> Self {
        Self::with_lock_policy(page_limit, LockPolicy::default())
    }

    pub fn with_lock_policy(page_limit: usize, lock_policy: LockPolicy) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::with_lock_policy(
            page_limit,
            Arc::clone(&catalog),
            lock_policy,
        ));

        Self {
            catalog,
            buffer_pool,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DEFAULT_PAGES)
    }
}
