//! Pull-based relational operators.
//!
//! Every operator implements `OpIterator`, owns its children and pulls
//! tuples from them on demand. A plan is a tree of boxed operators with
//! table scans at the leaves.

mod aggregate;
mod aggregator;
mod chunk_join;
mod delete;
mod filter;
mod insert;
mod join;
mod order_by;
mod predicate;
mod seq_scan;

pub use aggregate::Aggregate;
pub use aggregator::{AggregateOp, Aggregator, IntegerAggregator, StringAggregator};
pub use chunk_join::{Chunk, ChunkJoin};
pub use delete::Delete;
pub use filter::Filter;
pub use insert::Insert;
pub use join::Join;
pub use order_by::OrderBy;
pub use predicate::{JoinPredicate, Op, Predicate};
pub use seq_scan::SeqScan;

use crate::{
    error::SmallError,
    storage::{Tuple, TupleScheme},
    types::SmallResult,
};

/// The open flag and the look-ahead tuple shared by all operators.
#[derive(Default)]
pub struct OpState {
    opened: bool,
    next: Option<Tuple>,
}

impl OpState {
    pub fn open(&mut self) {
        self.opened = true;
        self.next = None;
    }

    pub fn close(&mut self) {
        self.opened = false;
        self.next = None;
    }

    /// Drop the look-ahead tuple, used by `rewind`.
    pub fn reset(&mut self) {
        self.next = None;
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }
}

/// The iterator contract of all operators.
///
/// An operator starts closed, `open` prepares it (opening the children),
/// `close` releases it. `has_next`, `next` and `rewind` are only valid
/// between `open` and `close`.
pub trait OpIterator: Send {
    fn open(&mut self) -> SmallResult;

    fn close(&mut self);

    /// Restart from the first tuple.
    fn rewind(&mut self) -> SmallResult;

    /// The scheme of the produced tuples, fixed at construction.
    fn get_tuple_scheme(&self) -> &TupleScheme;

    fn get_children(&self) -> Vec<&dyn OpIterator>;

    /// Replace the children, the count must match what the operator
    /// expects.
    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> SmallResult;

    /// Produce the next tuple, `None` when there is no more.
    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError>;

    fn state(&mut self) -> &mut OpState;

    fn has_next(&mut self) -> Result<bool, SmallError> {
        if !self.state().is_open() {
            return Err(SmallError::new("operator is not open"));
        }

        if self.state().next.is_none() {
            let next = self.fetch_next()?;
            self.state().next = next;
        }
        Ok(self.state().next.is_some())
    }

    fn next(&mut self) -> Result<Tuple, SmallError> {
        if !self.state().is_open() {
            return Err(SmallError::no_such_element("operator is not open"));
        }

        if !self.has_next()? {
            return Err(SmallError::no_such_element("no more tuples"));
        }

        self.state()
            .next
            .take()
            .ok_or_else(|| SmallError::no_such_element("no more tuples"))
    }
}

/// Check that exactly `expect` children are given.
fn take_children(
    children: Vec<Box<dyn OpIterator>>,
    expect: usize,
) -> Result<Vec<Box<dyn OpIterator>>, SmallError> {
    if children.len() != expect {
        return Err(SmallError::new(&format!(
            "expect {} children, got {}",
            expect,
            children.len()
        )));
    }
    Ok(children)
}

/// Pull all remaining tuples out of an open operator.
pub fn collect_tuples(op: &mut dyn OpIterator) -> Result<Vec<Tuple>, SmallError> {
    let mut tuples = Vec::new();
    while op.has_next()? {
        tuples.push(op.next()?);
    }
    Ok(tuples)
}
