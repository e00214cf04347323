use std::{convert::TryInto, io::Read, mem::size_of};

use crate::error::SmallError;

/// Read exactly `bytes_count` bytes from the reader.
pub fn read_exact<R: Read>(reader: &mut R, bytes_count: usize) -> Result<Vec<u8>, SmallError> {
    let mut buffer = vec![0u8; bytes_count];
    reader.read_exact(&mut buffer).or(Err(SmallError::io(&format!(
        "io error, expect {} bytes",
        bytes_count
    ))))?;
    Ok(buffer)
}

/// A wrapper for `Serializeable::decode` on objects that don't need a
/// reference.
///
/// The advantage of this wrapper is doesn't require explicit type
/// annotation when type inference is possible.
pub fn read_into<T: Serializeable<Reference = ()>, R: Read>(
    reader: &mut R,
) -> Result<T, SmallError> {
    T::decode(reader, &())
}

pub struct SmallWriter {
    buf: Vec<u8>,
}

impl SmallWriter {
    /// Create a new `SmallWriter` with an empty buffer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Create a new `SmallWriter` with a buffer of the given capacity.
    pub fn new_reserved(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn write<T: Serializeable>(&mut self, obj: &T, reference: &T::Reference) {
        obj.encode(self, reference);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Pad the buffer with zeros to the given size. Fails if the content
    /// is already larger than `size`.
    pub fn into_padded_bytes(mut self, size: usize) -> Result<Vec<u8>, SmallError> {
        if self.buf.len() > size {
            return Err(SmallError::new(&format!(
                "buffer size is larger than the given size: {} > {}",
                self.buf.len(),
                size
            )));
        }

        self.buf.resize(size, 0);
        Ok(self.buf)
    }
}

/// Objects that have a fixed binary layout on disk.
///
/// `Reference` carries whatever the layout depends on, e.g. a field is
/// decoded according to its `Type`, a tuple according to its scheme.
pub trait Serializeable: Sized {
    type Reference;

    fn encode(&self, writer: &mut SmallWriter, reference: &Self::Reference);

    fn decode<R: Read>(reader: &mut R, reference: &Self::Reference) -> Result<Self, SmallError>;

    fn to_bytes(&self, reference: &Self::Reference) -> Vec<u8> {
        let mut writer = SmallWriter::new();
        self.encode(&mut writer, reference);
        writer.into_bytes()
    }
}

// Integers are stored big-endian, the same byte order as the on-disk
// page format.
macro_rules! impl_serialization {
    (for $($t:ty),+) => {
        $(
            impl Serializeable for $t {
                type Reference = ();

                fn encode(&self, writer: &mut SmallWriter, _: &Self::Reference) {
                    writer.write_bytes(&self.to_be_bytes());
                }

                fn decode<R: Read>(reader: &mut R, _: &Self::Reference) -> Result<Self, SmallError> {
                    let bytes = read_exact(reader, size_of::<Self>())?;
                    let array = bytes
                        .as_slice()
                        .try_into()
                        .or(Err(SmallError::io("short read")))?;
                    Ok(Self::from_be_bytes(array))
                }
            }
        )*
    }
}

impl_serialization!(for u8, u16, u32, u64, i32, i64);

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_big_endian() {
        let bytes = 258i32.to_bytes(&());
        assert_eq!(bytes, vec![0, 0, 1, 2]);

        let v: i32 = read_into(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(v, 258);
    }

    #[test]
    fn test_padding() {
        let mut writer = SmallWriter::new();
        writer.write_bytes(&[1, 2, 3]);
        assert_eq!(writer.into_padded_bytes(5).unwrap(), vec![1, 2, 3, 0, 0]);

        let mut writer = SmallWriter::new_reserved(2);
        writer.write_bytes(&[1, 2, 3]);
        assert!(writer.into_padded_bytes(2).is_err());
    }
}
