use small_heap_db::{
    error::SmallError,
    operator::{OpIterator, OpState},
    types::SmallResult,
    Tuple, TupleScheme,
};

/// An operator over a fixed list of tuples, used as a leaf in plans that
/// don't need a table.
pub struct TupleSource {
    tuples: Vec<Tuple>,
    scheme: TupleScheme,
    pos: usize,
    state: OpState,
}

impl TupleSource {
    pub fn new(tuples: Vec<Tuple>, scheme: &TupleScheme) -> Self {
        Self {
            tuples,
            scheme: scheme.clone(),
            pos: 0,
            state: OpState::default(),
        }
    }

    pub fn from_rows(rows: &[Vec<i32>], scheme: &TupleScheme) -> Box<dyn OpIterator> {
        let tuples = rows.iter().map(|r| Tuple::from_ints(r)).collect();
        Box::new(Self::new(tuples, scheme))
    }
}

impl OpIterator for TupleSource {
    fn open(&mut self) -> SmallResult {
        self.pos = 0;
        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.state.close();
    }

    fn rewind(&mut self) -> SmallResult {
        self.pos = 0;
        self.state.reset();
        Ok(())
    }

    fn get_tuple_scheme(&self) -> &TupleScheme {
        &self.scheme
    }

    fn get_children(&self) -> Vec<&dyn OpIterator> {
        Vec::new()
    }

    fn set_children(&mut self, _: Vec<Box<dyn OpIterator>>) -> SmallResult {
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        let t = self.tuples.get(self.pos).cloned();
        self.pos += 1;
        Ok(t)
    }

    fn state(&mut self) -> &mut OpState {
        &mut self.state
    }
}
