pub mod field;
pub mod schema;
pub mod tuple;

pub use field::{Field, Type, STRING_SIZE};
pub use schema::{small_int_schema, FieldItem, TupleScheme};
pub use tuple::{RecordId, Tuple};
