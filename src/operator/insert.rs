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

/// Insert all tuples of the child into a table.
///
/// The first fetch drains the child and produces a single `(count)`
/// tuple. The mutation is applied once: after a `rewind` the same count
/// is produced again without touching the table.
pub struct Insert {
    buffer_pool: Arc<BufferPool>,
    tx: Transaction,
    table_id: u32,
    child: Box<dyn OpIterator>,
    scheme: TupleScheme,

    // `None` until the child is drained
    count: Option<i32>,
    emitted: bool,

    state: OpState,
}

impl Insert {
    pub fn new(
        buffer_pool: &Arc<BufferPool>,
        tx: &Transaction,
        child: Box<dyn OpIterator>,
        table_id: u32,
    ) -> Result<Self, SmallError> {
        let table_scheme = buffer_pool.get_catalog().get_tuple_scheme(table_id)?;
        if child.get_tuple_scheme() != &table_scheme {
            return Err(SmallError::new(&format!(
                "child scheme {} doesn't match table scheme {}",
                child.get_tuple_scheme(),
                table_scheme
            )));
        }

        Ok(Self {
            buffer_pool: Arc::clone(buffer_pool),
            tx: *tx,
            table_id,
            child,
            scheme: TupleScheme::from_named(&[(Type::Int, "count")]),
            count: None,
            emitted: false,
            state: OpState::default(),
        })
    }
}

impl OpIterator for Insert {
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
                    self.buffer_pool.insert_tuple(&self.tx, self.table_id, &t)?;
                    count += 1;
                }
                debug!("{} inserted {} tuples into table {}", self.tx, count, self.table_id);
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
