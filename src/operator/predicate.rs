use std::fmt;

use crate::{
    error::SmallError,
    storage::{Field, Tuple},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Equals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
    Like,
    NotEquals,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Op::Equals => "=",
            Op::GreaterThan => ">",
            Op::GreaterThanOrEq => ">=",
            Op::LessThan => "<",
            Op::LessThanOrEq => "<=",
            Op::Like => "LIKE",
            Op::NotEquals => "<>",
        };
        write!(f, "{}", s)
    }
}

/// Compares one field of a tuple with a constant.
#[derive(Clone, Debug)]
pub struct Predicate {
    pub field_index: usize,
    pub op: Op,
    pub operand: Field,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, operand: &Field) -> Self {
        Self {
            field_index,
            op,
            operand: operand.clone(),
        }
    }

    /// `tuple[field_index] op operand`
    pub fn filter(&self, tuple: &Tuple) -> Result<bool, SmallError> {
        Ok(tuple
            .get_cell(self.field_index)?
            .satisfy(&self.op, &self.operand))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "f{} {} {}", self.field_index, self.op, self.operand)
    }
}

/// Compares a field of the left tuple with a field of the right tuple.
#[derive(Clone, Debug)]
pub struct JoinPredicate {
    pub field1: usize,
    pub op: Op,
    pub field2: usize,
}

impl JoinPredicate {
    pub fn new(field1: usize, op: Op, field2: usize) -> Self {
        Self { field1, op, field2 }
    }

    /// `left[field1] op right[field2]`
    pub fn filter(&self, left: &Tuple, right: &Tuple) -> Result<bool, SmallError> {
        let l = left.get_cell(self.field1)?;
        let r = right.get_cell(self.field2)?;
        Ok(l.satisfy(&self.op, r))
    }
}

impl fmt::Display for JoinPredicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "left.f{} {} right.f{}", self.field1, self.op, self.field2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate() {
        let t = Tuple::new(vec![Field::Int(3), Field::new_string("hello world")]);

        assert!(Predicate::new(0, Op::LessThanOrEq, &Field::Int(3)).filter(&t).unwrap());
        assert!(!Predicate::new(0, Op::NotEquals, &Field::Int(3)).filter(&t).unwrap());
        assert!(Predicate::new(1, Op::Like, &Field::new_string("o w")).filter(&t).unwrap());
        assert!(Predicate::new(5, Op::Equals, &Field::Int(3)).filter(&t).is_err());
    }

    #[test]
    fn test_join_predicate() {
        let left = Tuple::from_ints(&[1, 2]);
        let right = Tuple::from_ints(&[2, 1]);

        assert!(JoinPredicate::new(0, Op::Equals, 1).filter(&left, &right).unwrap());
        assert!(JoinPredicate::new(1, Op::GreaterThan, 1).filter(&left, &right).unwrap());
        assert!(!JoinPredicate::new(0, Op::Equals, 0).filter(&left, &right).unwrap());
    }
}
