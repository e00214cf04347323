use std::{cmp::Ordering, vec};

use super::{take_children, OpIterator, OpState};
use crate::{
    error::SmallError,
    storage::{Tuple, TupleScheme},
    types::SmallResult,
};

/// Sort the child tuples by one field. The sort is stable, tuples with
/// equal keys keep the child's order.
pub struct OrderBy {
    field: usize,
    ascending: bool,
    child: Box<dyn OpIterator>,

    sorted: Vec<Tuple>,
    it: vec::IntoIter<Tuple>,

    state: OpState,
}

impl OrderBy {
    pub fn new(field: usize, ascending: bool, child: Box<dyn OpIterator>) -> Self {
        Self {
            field,
            ascending,
            child,
            sorted: Vec::new(),
            it: Vec::new().into_iter(),
            state: OpState::default(),
        }
    }

    pub fn get_order_field(&self) -> usize {
        self.field
    }

    pub fn is_ascending(&self) -> bool {
        self.ascending
    }
}

impl OpIterator for OrderBy {
    fn open(&mut self) -> SmallResult {
        self.child.open()?;

        let mut tuples = Vec::new();
        while self.child.has_next()? {
            let t = self.child.next()?;
            // validate the index once per tuple, so the sort itself can't
            // fail
            t.get_cell(self.field)?;
            tuples.push(t);
        }

        let (field, ascending) = (self.field, self.ascending);
        tuples.sort_by(|a, b| {
            let ord = compare(a, b, field);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });

        self.sorted = tuples;
        self.it = self.sorted.clone().into_iter();
        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.state.close();
        self.sorted.clear();
        self.it = Vec::new().into_iter();
        self.child.close();
    }

    fn rewind(&mut self) -> SmallResult {
        self.it = self.sorted.clone().into_iter();
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
        Ok(self.it.next())
    }

    fn state(&mut self) -> &mut OpState {
        &mut self.state
    }
}

fn compare(a: &Tuple, b: &Tuple, field: usize) -> Ordering {
    a.get_cells().get(field).cmp(&b.get_cells().get(field))
}
