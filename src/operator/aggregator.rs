use std::{collections::HashMap, convert::TryFrom, fmt};

use crate::{
    error::SmallError,
    storage::{Field, Tuple},
    types::SmallResult,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            AggregateOp::Min => "min",
            AggregateOp::Max => "max",
            AggregateOp::Sum => "sum",
            AggregateOp::Avg => "avg",
            AggregateOp::Count => "count",
        };
        write!(f, "{}", s)
    }
}

/// Computes an aggregate over a stream of tuples, optionally grouped by
/// one field.
///
/// Result tuples are `(group, value)` when grouped, `(value)` otherwise.
pub trait Aggregator: Send {
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> SmallResult;

    /// One tuple per group, groups in the order they were first seen.
    ///
    /// Fails when a value doesn't fit in an int field.
    fn results(&self) -> Result<Vec<Tuple>, SmallError>;

    fn clear(&mut self);
}

/// The groups seen so far, kept in first-seen order.
///
/// `None` is the key of the implicit group of an ungrouped aggregate.
struct Groups<S> {
    keys: Vec<Option<Field>>,
    states: HashMap<Option<Field>, S>,
}

impl<S: Default> Groups<S> {
    fn new() -> Self {
        Self {
            keys: Vec::new(),
            states: HashMap::new(),
        }
    }

    fn get_mut(&mut self, key: Option<Field>) -> &mut S {
        if !self.states.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.states.entry(key).or_insert_with(S::default)
    }

    fn iter(&self) -> impl Iterator<Item = (&Option<Field>, &S)> {
        self.keys
            .iter()
            .filter_map(move |k| self.states.get(k).map(|s| (k, s)))
    }

    fn clear(&mut self) {
        self.keys.clear();
        self.states.clear();
    }
}

fn group_key(tuple: &Tuple, gfield: Option<usize>) -> Result<Option<Field>, SmallError> {
    match gfield {
        Some(i) => Ok(Some(tuple.get_cell(i)?.clone())),
        None => Ok(None),
    }
}

fn result_tuple(key: &Option<Field>, op: AggregateOp, value: i64) -> Result<Tuple, SmallError> {
    let value = i32::try_from(value).or(Err(SmallError::new(&format!(
        "{} result {} overflows an int field",
        op, value
    ))))?;

    Ok(match key {
        Some(group) => Tuple::new(vec![group.clone(), Field::Int(value)]),
        None => Tuple::new(vec![Field::Int(value)]),
    })
}

#[derive(Default)]
struct IntState {
    count: i64,
    sum: i64,
    min: i32,
    max: i32,
}

/// Aggregates an int field, supports all operators.
pub struct IntegerAggregator {
    gfield: Option<usize>,
    afield: usize,
    op: AggregateOp,
    groups: Groups<IntState>,
}

impl IntegerAggregator {
    pub fn new(gfield: Option<usize>, afield: usize, op: AggregateOp) -> Self {
        Self {
            gfield,
            afield,
            op,
            groups: Groups::new(),
        }
    }
}

impl Aggregator for IntegerAggregator {
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> SmallResult {
        let value = tuple.get_cell(self.afield)?.get_int()?;
        let key = group_key(tuple, self.gfield)?;

        let state = self.groups.get_mut(key);
        if state.count == 0 {
            state.min = value;
            state.max = value;
        } else {
            state.min = state.min.min(value);
            state.max = state.max.max(value);
        }
        state.count += 1;
        state.sum += value as i64;
        Ok(())
    }

    fn results(&self) -> Result<Vec<Tuple>, SmallError> {
        self.groups
            .iter()
            .map(|(key, state)| {
                let value = match self.op {
                    AggregateOp::Min => state.min as i64,
                    AggregateOp::Max => state.max as i64,
                    AggregateOp::Sum => state.sum,
                    // integer division, rounds toward zero
                    AggregateOp::Avg => state.sum / state.count,
                    AggregateOp::Count => state.count,
                };
                result_tuple(key, self.op, value)
            })
            .collect()
    }

    fn clear(&mut self) {
        self.groups.clear();
    }
}

/// Aggregates a string field, only `Count` is supported.
pub struct StringAggregator {
    gfield: Option<usize>,
    afield: usize,
    groups: Groups<i64>,
}

impl StringAggregator {
    pub fn new(gfield: Option<usize>, afield: usize, op: AggregateOp) -> Result<Self, SmallError> {
        if op != AggregateOp::Count {
            return Err(SmallError::illegal_operator(&format!(
                "{} is not supported on string fields",
                op
            )));
        }

        Ok(Self {
            gfield,
            afield,
            groups: Groups::new(),
        })
    }
}

impl Aggregator for StringAggregator {
    fn merge_tuple_into_group(&mut self, tuple: &Tuple) -> SmallResult {
        // the value itself doesn't matter, but it must be a string
        tuple.get_cell(self.afield)?.get_string()?;
        let key = group_key(tuple, self.gfield)?;
        *self.groups.get_mut(key) += 1;
        Ok(())
    }

    fn results(&self) -> Result<Vec<Tuple>, SmallError> {
        self.groups
            .iter()
            .map(|(key, count)| result_tuple(key, AggregateOp::Count, *count))
            .collect()
    }

    fn clear(&mut self) {
        self.groups.clear();
    }
}
