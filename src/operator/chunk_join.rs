use super::{take_children, JoinPredicate, OpIterator, OpState};
use crate::{
    error::SmallError,
    storage::{Tuple, TupleScheme},
    types::SmallResult,
};

/// A buffer of up to `size` tuples pulled from an operator.
pub struct Chunk {
    size: usize,
    tuples: Vec<Tuple>,
}

impl Chunk {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            tuples: Vec::with_capacity(size),
        }
    }

    /// Replace the content with the next (at most) `size` tuples of `it`.
    pub fn load(&mut self, it: &mut dyn OpIterator) -> SmallResult {
        self.tuples.clear();
        while self.tuples.len() < self.size && it.has_next()? {
            self.tuples.push(it.next()?);
        }
        Ok(())
    }

    pub fn get_tuples(&self) -> &[Tuple] {
        &self.tuples
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn clear(&mut self) {
        self.tuples.clear();
    }
}

/// Block nested-loop join.
///
/// The left child is consumed a chunk at a time, the right child is
/// rewound and scanned once per chunk instead of once per left tuple.
/// Matches are produced as left fields followed by right fields.
pub struct ChunkJoin {
    predicate: JoinPredicate,
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,
    scheme: TupleScheme,

    chunk: Chunk,
    chunk_loaded: bool,

    // the right tuple being matched against the chunk, and the position
    // of the next left tuple to test
    right_tuple: Option<Tuple>,
    chunk_pos: usize,

    state: OpState,
}

impl ChunkJoin {
    pub fn new(
        predicate: JoinPredicate,
        left: Box<dyn OpIterator>,
        right: Box<dyn OpIterator>,
        chunk_size: usize,
    ) -> Result<Self, SmallError> {
        if chunk_size == 0 {
            return Err(SmallError::new("chunk size must be positive"));
        }

        let scheme = TupleScheme::merge(left.get_tuple_scheme(), right.get_tuple_scheme());
        Ok(Self {
            predicate,
            left,
            right,
            scheme,
            chunk: Chunk::new(chunk_size),
            chunk_loaded: false,
            right_tuple: None,
            chunk_pos: 0,
            state: OpState::default(),
        })
    }

    pub fn get_predicate(&self) -> &JoinPredicate {
        &self.predicate
    }

    fn reset_cursor(&mut self) {
        self.chunk.clear();
        self.chunk_loaded = false;
        self.right_tuple = None;
        self.chunk_pos = 0;
    }
}

impl OpIterator for ChunkJoin {
    fn open(&mut self) -> SmallResult {
        self.left.open()?;
        self.right.open()?;
        self.reset_cursor();
        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.state.close();
        self.reset_cursor();
        self.left.close();
        self.right.close();
    }

    fn rewind(&mut self) -> SmallResult {
        self.left.rewind()?;
        self.right.rewind()?;
        self.reset_cursor();
        self.state.reset();
        Ok(())
    }

    fn get_tuple_scheme(&self) -> &TupleScheme {
        &self.scheme
    }

    fn get_children(&self) -> Vec<&dyn OpIterator> {
        vec![&*self.left, &*self.right]
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> SmallResult {
        let mut children = take_children(children, 2)?;
        self.right = children.remove(1);
        self.left = children.remove(0);
        self.scheme = TupleScheme::merge(
            self.left.get_tuple_scheme(),
            self.right.get_tuple_scheme(),
        );
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        loop {
            if !self.chunk_loaded {
                self.chunk.load(&mut *self.left)?;
                if self.chunk.is_empty() {
                    return Ok(None);
                }
                self.chunk_loaded = true;
                self.right.rewind()?;
                self.right_tuple = None;
            }

            if self.right_tuple.is_none() {
                if !self.right.has_next()? {
                    // the right side is exhausted for this chunk
                    self.chunk_loaded = false;
                    continue;
                }
                self.right_tuple = Some(self.right.next()?);
                self.chunk_pos = 0;
            }

            if let Some(right) = &self.right_tuple {
                while self.chunk_pos < self.chunk.len() {
                    let left = &self.chunk.get_tuples()[self.chunk_pos];
                    self.chunk_pos += 1;
                    if self.predicate.filter(left, right)? {
                        return Ok(Some(Tuple::merge(left, right)));
                    }
                }
            }

            self.right_tuple = None;
        }
    }

    fn state(&mut self) -> &mut OpState {
        &mut self.state
    }
}
