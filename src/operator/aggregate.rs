use std::vec;

use super::{
    take_children, AggregateOp, Aggregator, IntegerAggregator, OpIterator, OpState,
    StringAggregator,
};
use crate::{
    error::SmallError,
    storage::{FieldItem, Tuple, TupleScheme, Type},
    types::SmallResult,
};

/// Computes `op` over field `afield` of the child, grouped by `gfield`
/// when given.
///
/// The child is drained on `open`, `rewind` replays the computed groups.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    afield: usize,
    gfield: Option<usize>,
    op: AggregateOp,

    aggregator: Box<dyn Aggregator>,
    scheme: TupleScheme,

    results: Vec<Tuple>,
    results_it: vec::IntoIter<Tuple>,

    state: OpState,
}

impl Aggregate {
    pub fn new(
        child: Box<dyn OpIterator>,
        afield: usize,
        gfield: Option<usize>,
        op: AggregateOp,
    ) -> Result<Self, SmallError> {
        let child_scheme = child.get_tuple_scheme();
        let aggregator: Box<dyn Aggregator> = match child_scheme.get_field_type(afield)? {
            Type::Int => Box::new(IntegerAggregator::new(gfield, afield, op)),
            Type::String => Box::new(StringAggregator::new(gfield, afield, op)?),
        };
        let scheme = Self::make_scheme(child_scheme, afield, gfield, op)?;

        Ok(Self {
            child,
            afield,
            gfield,
            op,
            aggregator,
            scheme,
            results: Vec::new(),
            results_it: Vec::new().into_iter(),
            state: OpState::default(),
        })
    }

    // (group, op(field)) or (op(field))
    fn make_scheme(
        child_scheme: &TupleScheme,
        afield: usize,
        gfield: Option<usize>,
        op: AggregateOp,
    ) -> Result<TupleScheme, SmallError> {
        let mut fields = Vec::new();
        if let Some(g) = gfield {
            fields.push(FieldItem::new(
                child_scheme.get_field_type(g)?,
                child_scheme.get_field_name(g),
            ));
        }

        let name = format!(
            "{}({})",
            op,
            child_scheme.get_field_name(afield).unwrap_or("null")
        );
        fields.push(FieldItem::new(Type::Int, Some(&name)));
        Ok(TupleScheme::new(fields))
    }

    pub fn get_aggregate_field(&self) -> usize {
        self.afield
    }

    pub fn get_group_field(&self) -> Option<usize> {
        self.gfield
    }

    pub fn get_op(&self) -> AggregateOp {
        self.op
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> SmallResult {
        self.child.open()?;

        self.aggregator.clear();
        while self.child.has_next()? {
            let t = self.child.next()?;
            self.aggregator.merge_tuple_into_group(&t)?;
        }

        self.results = self.aggregator.results()?;
        self.results_it = self.results.clone().into_iter();
        self.state.open();
        Ok(())
    }

    fn close(&mut self) {
        self.state.close();
        self.results.clear();
        self.results_it = Vec::new().into_iter();
        self.child.close();
    }

    fn rewind(&mut self) -> SmallResult {
        self.results_it = self.results.clone().into_iter();
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
        let child = children.remove(0);
        *self = Aggregate::new(child, self.afield, self.gfield, self.op)?;
        Ok(())
    }

    fn fetch_next(&mut self) -> Result<Option<Tuple>, SmallError> {
        Ok(self.results_it.next())
    }

    fn state(&mut self) -> &mut OpState {
        &mut self.state
    }
}
