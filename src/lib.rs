pub mod common;
pub mod error;
pub mod heap;
pub mod io;
pub mod operator;
pub mod storage;
pub mod transaction;
pub mod types;
pub mod utils;

mod log;

pub use common::{Catalog, Database};
pub use error::{ErrorKind, SmallError};
pub use heap::{BufferPool, HeapPage, HeapPageID, HeapTable, LockPolicy};
pub use operator::{OpIterator, Op, Predicate};
pub use storage::{Field, Tuple, TupleScheme, Type};
pub use transaction::{Permission, Transaction};
