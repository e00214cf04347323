use std::sync::Arc;

use super::{take_children, OpIterator, OpState};
use crate::{
    error::SmallError,
    heap::{BufferPool, HeapTableIterator},
    storage::{Tuple, TupleScheme},
    transaction::Transaction,
    types::SmallResult,
};

/// Scan all tuples of a table in page/slot order.
///
/// Field names of the produced scheme are prefixed with the table alias,
/// e.g. `t.id`.
pub struct SeqScan {
    buffer_pool: Arc<BufferPool>,
    tx: Transaction,

    table_id: u32,
    alias: String,
    scheme: TupleScheme,

    it: Option<HeapTableIterator>,
    state: OpState,
}

impl SeqScan {
    pub fn new(
        buffer_pool: &Arc<BufferPool>,
        tx: &Transaction,
        table_id: u32,
        alias: &str,
    ) -> Result<Self, SmallError> {
        let scheme = buffer_pool
            .get_catalog()
            .get_tuple_scheme(table_id)?
            .with_prefix(alias);

        Ok(Self {
            buffer_pool: Arc::clone(buffer_pool),
            tx: *tx,
            table_id,
            alias: alias.to_string(),
            scheme,
            it: None,
            state: OpState::default(),
        })
    }

    /// Scan with the table name as the alias.
    pub fn with_table_name(
        buffer_pool: &Arc<BufferPool>,
        tx: &Transaction,
        table_id: u32,
    ) -> Result<Self, SmallError> {
        let name = buffer_pool.get_catalog().get_table_name(table_id)?;
        Self::new(buffer_pool, tx, table_id, &name)
    }

    /// Point the scan to another table, the scan is closed.
    pub fn reset(&mut self, table_id: u32, alias: &str) -> SmallResult {
        self.close();
        self.scheme = self
            .buffer_pool
            .get_catalog()
            .get_tuple_scheme(table_id)?
            .with_prefix(alias);
        self.table_id = table_id;
        self.alias = alias.to_string();
        Ok(())
    }

    pub fn get_table_id(&self) -> u32 {
        self.table_id
    }

    pub fn get_alias(&self) -> &str {
        &self.alias
    }

    pub fn get_table_name(&self) -> Result<String, SmallError> {
        self.buffer_pool
            .get_catalog()
            .get_table_name(self.table_id)
    }
}

impl OpIterator for SeqScan {
    fn open(&mut self) -> SmallResult {
        let table = self.buffer_pool.get_catalog().get_table(self.table_id)?;
        self.it = Some(table.iter(&self.buffer_pool, &self.tx));
        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.it = None;
        self.state.close();
    }

    fn rewind(&mut self) -> SmallResult {
        if let Some(it) = self.it.as_mut() {
            it.rewind();
        }
        self.state.reset();
        Ok(())
    }

    fn get_tuple_scheme(&self) -> &TupleScheme {
        &self.scheme
    }

    fn get_children(&self) -> Vec<&dyn OpIterator> {
        Vec::new()
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> SmallResult {
        take_children(children, 0).map(|_| ())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        match self.it.as_mut() {
            Some(it) => it.next().transpose(),
            None => Ok(None),
        }
    }

    fn state(&mut self) -> &mut OpState {
        &mut self.state
    }
}
