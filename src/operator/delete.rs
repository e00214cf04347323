use std::sync::Arc;

use log::debug;

use super::{take_children, OpIterator, OpState};
use crate::{
    error::SmallError,
    heap::BufferPool,
    storage::{Field, Tuple, TupleScheme, Type},
    transaction::Transaction,
    types::SmallResult,
};

/// Delete all tuples of the child from their tables, the tuples are
/// located by their record ids.
///
/// Like `Insert`, it produces a single `(count)` tuple and never applies
/// the deletion twice.
pub struct Delete {
    buffer_pool: Arc<BufferPool>,
    tx: Transaction,
    child: Box<dyn OpIterator>,
    scheme: TupleScheme,

    count: Option<i32>,
    emitted: bool,

    state: OpState,
}

impl Delete {
    pub fn new(buffer_pool: &Arc<BufferPool>, tx: &Transaction, child: Box<dyn OpIterator>) -> Self {
        Self {
            buffer_pool: Arc::clone(buffer_pool),
            tx: *tx,
            child,
            scheme: TupleScheme::from_named(&[(Type::Int, "count")]),
            count: None,
            emitted: false,
            state: OpState::default(),
        }
    }
}

impl OpIterator for Delete {
    fn open(&mut self) -> SmallResult {
        self.child.open()?;
        self.emitted = false;
        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.state.close();
        self.child.close();
    }

    fn rewind(&mut self) -> SmallResult {
        self.emitted = false;
        self.state.reset();
        Ok(())
    }

    fn get_tuple_scheme(&self) -> &TupleScheme {
        &self.scheme
    }

    fn get_children(&self) -> Vec<&dyn OpIterator> {
        vec![&*self.child]
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> SmallResult {
        let mut children = take_children(children, 1)?;
        self.child = children.remove(0);
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        if self.emitted {
            return Ok(None);
        }

        let count = match self.count {
            Some(count) => count,
            None => {
                let mut count = 0;
                while self.child.has_next()? {
                    let t = self.child.next()?;
                    self.buffer_pool.delete_tuple(&self.tx, &t)?;
                    count += 1;
                }
                debug!("{} deleted {} tuples", self.tx, count);
                self.count = Some(count);
                count
            }
        };

        self.emitted = true;
        Ok(Some(Tuple::new(vec![Field::Int(count)])))
    }

    fn state(&mut self) -> &mut OpState {
        &mut self.state
    }
}
