use std::{fmt, io::Read};

use itertools::Itertools;

use super::{field::Field, schema::TupleScheme};
use crate::{
    error::SmallError,
    heap::HeapPageID,
    io::{Serializeable, SmallWriter},
};

/// The location of a tuple on disk: a page and a slot in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub pid: HeapPageID,
    pub slot: usize,
}

impl RecordId {
    pub fn new(pid: HeapPageID, slot: usize) -> Self {
        Self { pid, slot }
    }
}

#[derive(Debug, Clone)]
pub struct Tuple {
    cells: Vec<Field>,

    // Only set for tuples read from or written to a page.
    rid: Option<RecordId>,
}

/// Tuples are compared by their content, the record id is ignored.
impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl Eq for Tuple {}

impl Tuple {
    pub fn new(cells: Vec<Field>) -> Self {
        Self { cells, rid: None }
    }

    /// A tuple of `width` int cells, all of them hold `value`.
    pub fn new_int_tuple(value: i32, width: usize) -> Self {
        Self::new(vec![Field::Int(value); width])
    }

    pub fn from_ints(values: &[i32]) -> Self {
        Self::new(values.iter().map(|v| Field::Int(*v)).collect())
    }

    /// The cells of `left` followed by the cells of `right`, without a
    /// record id.
    pub fn merge(left: &Tuple, right: &Tuple) -> Tuple {
        let mut cells = left.cells.clone();
        cells.extend(right.cells.iter().cloned());
        Tuple::new(cells)
    }

    pub fn get_cell(&self, i: usize) -> Result<&Field, SmallError> {
        self.cells
            .get(i)
            .ok_or_else(|| SmallError::new(&format!("cell index out of range: {}", i)))
    }

    pub fn set_cell(&mut self, i: usize, cell: Field) -> Result<(), SmallError> {
        match self.cells.get_mut(i) {
            Some(c) => {
                *c = cell;
                Ok(())
            }
            None => Err(SmallError::new(&format!("cell index out of range: {}", i))),
        }
    }

    pub fn get_cells(&self) -> &[Field] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn get_rid(&self) -> Option<RecordId> {
        self.rid
    }

    pub fn set_rid(&mut self, rid: Option<RecordId>) {
        self.rid = rid;
    }

    /// Whether the cells conform to `scheme` (same arity, same types).
    pub fn matches(&self, scheme: &TupleScheme) -> bool {
        self.cells.len() == scheme.fields_count()
            && self
                .cells
                .iter()
                .zip(scheme.get_fields())
                .all(|(c, f)| c.get_type() == f.field_type)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{}}}", self.cells.iter().join(", "))
    }
}

/// Fields are written back to back in scheme order, the record id is not
/// part of the disk format.
impl Serializeable for Tuple {
    type Reference = TupleScheme;

    fn encode(&self, writer: &mut SmallWriter, _: &Self::Reference) {
        for cell in &self.cells {
            cell.encode(writer, &cell.get_type());
        }
    }

    fn decode<R: Read>(reader: &mut R, scheme: &Self::Reference) -> Result<Self, SmallError> {
        let mut cells = Vec::with_capacity(scheme.fields_count());
        for item in scheme.get_fields() {
            cells.push(Field::decode(reader, &item.field_type)?);
        }
        Ok(Tuple::new(cells))
    }
}
