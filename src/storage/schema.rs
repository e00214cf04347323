use std::fmt;

use itertools::Itertools;

use super::field::Type;
use crate::error::SmallError;

#[derive(Debug, Clone)]
pub struct FieldItem {
    pub field_type: Type,
    pub field_name: Option<String>,
}

impl FieldItem {
    pub fn new(field_type: Type, field_name: Option<&str>) -> Self {
        Self {
            field_type,
            field_name: field_name.map(|s| s.to_string()),
        }
    }
}

/// The layout of a tuple: an ordered list of typed, optionally named
/// fields.
#[derive(Debug, Clone, Default)]
pub struct TupleScheme {
    fields: Vec<FieldItem>,
}

/// Two schemes are equal when their field types match one by one, the
/// names are ignored.
impl PartialEq for TupleScheme {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.field_type == b.field_type)
    }
}

impl Eq for TupleScheme {}

impl TupleScheme {
    pub fn new(fields: Vec<FieldItem>) -> Self {
        Self { fields }
    }

    /// Build an anonymous scheme from the field types.
    pub fn from_types(types: &[Type]) -> Self {
        Self {
            fields: types.iter().map(|t| FieldItem::new(*t, None)).collect(),
        }
    }

    /// Build a scheme from (type, name) pairs.
    pub fn from_named(items: &[(Type, &str)]) -> Self {
        Self {
            fields: items
                .iter()
                .map(|(t, name)| FieldItem::new(*t, Some(name)))
                .collect(),
        }
    }

    /// The fields of `a` followed by the fields of `b`.
    pub fn merge(a: &TupleScheme, b: &TupleScheme) -> TupleScheme {
        let mut fields = a.fields.clone();
        fields.extend(b.fields.iter().cloned());
        TupleScheme { fields }
    }

    pub fn fields_count(&self) -> usize {
        self.fields.len()
    }

    pub fn get_fields(&self) -> &[FieldItem] {
        &self.fields
    }

    pub fn get_field_type(&self, i: usize) -> Result<Type, SmallError> {
        self.fields
            .get(i)
            .map(|f| f.field_type)
            .ok_or_else(|| SmallError::new(&format!("field index out of range: {}", i)))
    }

    pub fn get_field_name(&self, i: usize) -> Option<&str> {
        self.fields.get(i).and_then(|f| f.field_name.as_deref())
    }

    /// Find the first field with the given name.
    pub fn field_name_to_index(&self, name: &str) -> Result<usize, SmallError> {
        self.fields
            .iter()
            .position(|f| f.field_name.as_deref() == Some(name))
            .ok_or_else(|| SmallError::no_such_element(&format!("no field named {}", name)))
    }

    /// Get tuple size in bytes (disk format).
    pub fn get_size(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.len()).sum()
    }

    /// A copy of this scheme where each named field is prefixed with
    /// `prefix.`, unnamed fields become `prefix.null`.
    pub fn with_prefix(&self, prefix: &str) -> TupleScheme {
        let fields = self
            .fields
            .iter()
            .map(|f| FieldItem {
                field_type: f.field_type,
                field_name: Some(format!(
                    "{}.{}",
                    prefix,
                    f.field_name.as_deref().unwrap_or("null")
                )),
            })
            .collect();
        TupleScheme { fields }
    }
}

impl fmt::Display for TupleScheme {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let content = self
            .fields
            .iter()
            .map(|item| {
                format!(
                    "{}({})",
                    item.field_name.as_deref().unwrap_or("null"),
                    item.field_type
                )
            })
            .join(", ");
        write!(f, "[{}]", content)
    }
}

/// A scheme of `width` int fields, named `{prefix}-{i}`.
pub fn small_int_schema(width: usize, name_prefix: &str) -> TupleScheme {
    let fields = (0..width)
        .map(|i| FieldItem {
            field_type: Type::Int,
            field_name: Some(format!("{}-{}", name_prefix, i)),
        })
        .collect();
    TupleScheme { fields }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_names() {
        let a = TupleScheme::from_named(&[(Type::Int, "a"), (Type::String, "b")]);
        let b = TupleScheme::from_types(&[Type::Int, Type::String]);
        assert_eq!(a, b);

        let c = TupleScheme::from_types(&[Type::Int, Type::Int]);
        assert_ne!(a, c);
        assert_ne!(a, TupleScheme::from_types(&[Type::Int]));
    }

    #[test]
    fn test_merge_and_size() {
        let a = small_int_schema(2, "a");
        let b = TupleScheme::from_named(&[(Type::String, "name")]);
        let merged = TupleScheme::merge(&a, &b);
        assert_eq!(merged.fields_count(), 3);
        assert_eq!(merged.get_size(), 4 + 4 + 132);
        assert_eq!(merged.field_name_to_index("name").unwrap(), 2);
        assert_eq!(merged.to_string(), "[a-0(int), a-1(int), name(string)]");
    }

    #[test]
    fn test_prefix() {
        let scheme = TupleScheme::from_named(&[(Type::Int, "id")]).with_prefix("t");
        assert_eq!(scheme.get_field_name(0), Some("t.id"));
    }
}
