mod buffer_pool;
mod page;
mod page_id;
mod table;
mod table_iter;

pub use buffer_pool::{BufferPool, LockPolicy, DEFAULT_PAGES, PAGE_SIZE};
pub use page::HeapPage;
pub use page_id::HeapPageID;
pub use table::HeapTable;
pub use table_iter::HeapTableIterator;
