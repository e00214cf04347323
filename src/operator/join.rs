use super::{take_children, JoinPredicate, OpIterator, OpState};
use crate::{
    error::SmallError,
    storage::{Tuple, TupleScheme},
    types::SmallResult,
};

/// Nested-loop join.
///
/// For every left tuple the right child is rewound and scanned in full,
/// each matching pair produces the left fields followed by the right
/// fields.
pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,
    scheme: TupleScheme,

    // the left tuple being matched against the right child
    current_left: Option<Tuple>,

    state: OpState,
}

impl Join {
    pub fn new(
        predicate: JoinPredicate,
        left: Box<dyn OpIterator>,
        right: Box<dyn OpIterator>,
    ) -> Self {
        let scheme = TupleScheme::merge(left.get_tuple_scheme(), right.get_tuple_scheme());
        Self {
            predicate,
            left,
            right,
            scheme,
            current_left: None,
            state: OpState::default(),
        }
    }

    pub fn get_predicate(&self) -> &JoinPredicate {
        &self.predicate
    }

    pub fn get_left_field_name(&self) -> Option<&str> {
        self.left
            .get_tuple_scheme()
            .get_field_name(self.predicate.field1)
    }

    pub fn get_right_field_name(&self) -> Option<&str> {
        self.right
            .get_tuple_scheme()
            .get_field_name(self.predicate.field2)
    }
}

impl OpIterator for Join {
    fn open(&mut self) -> SmallResult {
        self.left.open()?;
        self.right.open()?;
        self.current_left = None;
        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.state.close();
        self.current_left = None;
        self.left.close();
        self.right.close();
    }

    fn rewind(&mut self) -> SmallResult {
        self.left.rewind()?;
        self.right.rewind()?;
        self.current_left = None;
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
            if self.current_left.is_none() {
                if !self.left.has_next()? {
                    return Ok(None);
                }
                self.current_left = Some(self.left.next()?);
                self.right.rewind()?;
            }

            if let Some(left) = &self.current_left {
                while self.right.has_next()? {
                    let right = self.right.next()?;
                    if self.predicate.filter(left, &right)? {
                        return Ok(Some(Tuple::merge(left, &right)));
                    }
                }
            }

            self.current_left = None;
        }
    }

    fn state(&mut self) -> &mut OpState {
        &mut self.state
    }
}
