use std::{path::Path, sync::Arc};

use small_heap_db::{
    heap::{BufferPool, HeapPage, HeapPageID, LockPolicy, DEFAULT_PAGES},
    storage::{small_int_schema, TupleScheme},
    utils, Catalog, Database, HeapTable,
};
use tempfile::TempDir;

/// Everything a test needs: a database and the directory holding its
/// table files. The directory is removed when the env is dropped.
pub struct TestEnv {
    pub db: Database,
    pub dir: TempDir,
}

impl TestEnv {
    pub fn pool(&self) -> &Arc<BufferPool> {
        self.db.buffer_pool()
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        self.db.catalog()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// # Conduct the initialization
///
/// - Setting up log configurations.
/// - Create a fresh database in a temporary directory.
pub fn setup() -> TestEnv {
    setup_with_pages(DEFAULT_PAGES)
}

pub fn setup_with_pages(page_limit: usize) -> TestEnv {
    setup_with_policy(page_limit, LockPolicy::default())
}

pub fn setup_with_policy(page_limit: usize, lock_policy: LockPolicy) -> TestEnv {
    utils::init_log();

    TestEnv {
        db: Database::with_lock_policy(page_limit, lock_policy),
        dir: tempfile::tempdir().unwrap(),
    }
}

/// Create an empty table named `name` and register it in the catalog.
pub fn new_table(env: &TestEnv, name: &str, scheme: &TupleScheme) -> Arc<HeapTable> {
    let path = env.path().join(format!("{}.dat", name));
    let table = Arc::new(HeapTable::new(path, scheme).unwrap());
    env.catalog().add_table(Arc::clone(&table), name, "");
    table
}

/// Create an empty table of `columns` int fields, named `{name}-{i}`.
pub fn new_int_table(env: &TestEnv, name: &str, columns: usize) -> Arc<HeapTable> {
    new_table(env, name, &small_int_schema(columns, name))
}

/// Append `count` empty pages to the table file, bypassing the buffer
/// pool.
pub fn append_empty_pages(table: &HeapTable, count: usize) {
    let start = table.pages_count().unwrap();
    for i in start..start + count {
        let pid = HeapPageID::new(table.get_id(), i as u32);
        let page = HeapPage::new(&pid, &HeapPage::empty_page_data(), table.get_scheme()).unwrap();
        table.write_page(&page).unwrap();
    }
}

/// A lock policy that gives up quickly, for tests that expect aborts.
pub fn impatient_policy() -> LockPolicy {
    LockPolicy {
        retries: 5,
        interval: std::time::Duration::from_millis(5),
    }
}
