use super::{take_children, OpIterator, OpState, Predicate};
use crate::{
    error::SmallError,
    storage::{Tuple, TupleScheme},
    types::SmallResult,
};

/// Pass through the child tuples that satisfy the predicate.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    state: OpState,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Self {
        Self {
            predicate,
            child,
            state: OpState::default(),
        }
    }

    pub fn get_predicate(&self) -> &Predicate {
        &self.predicate
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> SmallResult {
        self.child.open()?;
        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.state.close();
        self.child.close();
    }

    fn rewind(&mut self) -> SmallResult {
        self.child.rewind()?;
        self.state.reset();
        Ok(())
    }

    fn get_tuple_scheme(&self) -> &TupleScheme {
        self.child.get_tuple_scheme()
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
        while self.child.has_next()? {
            let t = self.child.next()?;
            if self.predicate.filter(&t)? {
                return Ok(Some(t));
            }
        }
        Ok(None)
    }

    fn state(&mut self) -> &mut OpState {
        &mut self.state
    }
}
