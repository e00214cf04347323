use std::{fmt, io::Read};

use crate::{
    error::SmallError,
    io::{read_exact, read_into, Serializeable, SmallWriter},
    operator::Op,
};

/// The maximum length (in bytes) of a string field. Every string field
/// occupies the same amount of space on disk regardless of its content.
pub const STRING_SIZE: usize = 128;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Type {
    Int,
    String,
}

impl Type {
    /// Get the size of the type in bytes (disk format).
    pub fn len(&self) -> usize {
        match self {
            Type::Int => 4,
            // 4 bytes for the length, followed by the payload
            Type::String => 4 + STRING_SIZE,
        }
    }

    /// Parse the type name used in the schema description file.
    pub fn parse(name: &str) -> Option<Type> {
        match name.trim().to_lowercase().as_str() {
            "int" => Some(Type::Int),
            "string" => Some(Type::String),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::String => write!(f, "string"),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub enum Field {
    Int(i32),
    String(String),
}

impl Field {
    /// Create a string field, the content is cut to `STRING_SIZE` bytes
    /// (on a char boundary).
    pub fn new_string(s: &str) -> Self {
        Field::String(truncate(s).to_string())
    }

    pub fn get_type(&self) -> Type {
        match self {
            Field::Int(_) => Type::Int,
            Field::String(_) => Type::String,
        }
    }

    pub fn get_int(&self) -> Result<i32, SmallError> {
        match self {
            Field::Int(v) => Ok(*v),
            _ => Err(SmallError::new(&format!("not an int field: {:?}", self))),
        }
    }

    pub fn get_string(&self) -> Result<&str, SmallError> {
        match self {
            Field::String(v) => Ok(v),
            _ => Err(SmallError::new(&format!("not a string field: {:?}", self))),
        }
    }

    /// Compare this field with `operand` using `op`, the field is on the
    /// left hand side.
    ///
    /// Fields of different types never satisfy a predicate.
    pub fn satisfy(&self, op: &Op, operand: &Field) -> bool {
        match (self, operand) {
            (Field::Int(a), Field::Int(b)) => match op {
                // LIKE on integers degrades to equality
                Op::Equals | Op::Like => a == b,
                Op::NotEquals => a != b,
                Op::GreaterThan => a > b,
                Op::GreaterThanOrEq => a >= b,
                Op::LessThan => a < b,
                Op::LessThanOrEq => a <= b,
            },
            (Field::String(a), Field::String(b)) => match op {
                Op::Equals => a == b,
                Op::NotEquals => a != b,
                Op::GreaterThan => a > b,
                Op::GreaterThanOrEq => a >= b,
                Op::LessThan => a < b,
                Op::LessThanOrEq => a <= b,
                Op::Like => a.contains(b.as_str()),
            },
            _ => false,
        }
    }
}

fn truncate(s: &str) -> &str {
    if s.len() <= STRING_SIZE {
        return s;
    }

    let mut end = STRING_SIZE;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::String(v) => write!(f, "{}", v),
        }
    }
}

/// # Format
///
/// - Int: 4 bytes, big-endian
/// - String: 4 bytes payload size (big-endian), followed by `STRING_SIZE`
///   bytes of payload padded with zeros
impl Serializeable for Field {
    type Reference = Type;

    fn encode(&self, writer: &mut SmallWriter, _: &Self::Reference) {
        match self {
            Field::Int(v) => v.encode(writer, &()),
            Field::String(v) => {
                let payload = truncate(v).as_bytes();
                (payload.len() as u32).encode(writer, &());
                writer.write_bytes(payload);
                writer.write_bytes(&vec![0; STRING_SIZE - payload.len()]);
            }
        }
    }

    fn decode<R: Read>(reader: &mut R, t: &Self::Reference) -> Result<Self, SmallError> {
        match t {
            Type::Int => Ok(Field::Int(read_into(reader)?)),
            Type::String => {
                let size: u32 = read_into(reader)?;
                let size = size as usize;
                if size > STRING_SIZE {
                    return Err(SmallError::io(&format!("invalid string size: {}", size)));
                }

                let payload = read_exact(reader, STRING_SIZE)?;
                let s = String::from_utf8(payload[..size].to_vec())
                    .or(Err(SmallError::io("invalid utf-8 in string field")))?;
                Ok(Field::String(s))
            }
        }
    }
}
