use std::{
    collections::HashMap,
    fs,
    path::Path,
    sync::{Arc, RwLock},
};

use log::info;

use crate::{
    error::SmallError,
    heap::HeapTable,
    storage::{FieldItem, TupleScheme, Type},
    types::SmallResult,
    utils::HandyRwLock,
};

type TableID = u32;
type TableRC = Arc<HeapTable>;

struct TableEntry {
    table: TableRC,
    name: String,
    primary_key: String,
}

/// Keeps track of all tables in the database, resolves a table id to its
/// heap file and scheme.
pub struct Catalog {
    tables: RwLock<HashMap<TableID, TableEntry>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Add a table to the catalog.
    ///
    /// An existing table with the same name or the same id is replaced.
    pub fn add_table(&self, table: TableRC, name: &str, primary_key: &str) {
        let mut tables = self.tables.wl();
        tables.retain(|_, entry| entry.name != name);
        tables.insert(
            table.get_id(),
            TableEntry {
                table,
                name: name.to_string(),
                primary_key: primary_key.to_string(),
            },
        );
    }

    pub fn get_table(&self, table_id: TableID) -> Result<TableRC, SmallError> {
        self.tables
            .rl()
            .get(&table_id)
            .map(|entry| Arc::clone(&entry.table))
            .ok_or_else(|| SmallError::new(&format!("table {} not found", table_id)))
    }

    pub fn get_tuple_scheme(&self, table_id: TableID) -> Result<TupleScheme, SmallError> {
        Ok(self.get_table(table_id)?.get_scheme().clone())
    }

    pub fn get_table_id(&self, name: &str) -> Result<TableID, SmallError> {
        self.tables
            .rl()
            .iter()
            .find(|(_, entry)| entry.name == name)
            .map(|(id, _)| *id)
            .ok_or_else(|| SmallError::new(&format!("table {} not found", name)))
    }

    pub fn get_table_name(&self, table_id: TableID) -> Result<String, SmallError> {
        self.tables
            .rl()
            .get(&table_id)
            .map(|entry| entry.name.clone())
            .ok_or_else(|| SmallError::new(&format!("table {} not found", table_id)))
    }

    /// The name of the primary key field, an empty string if the table has
    /// none.
    pub fn get_primary_key(&self, table_id: TableID) -> Result<String, SmallError> {
        self.tables
            .rl()
            .get(&table_id)
            .map(|entry| entry.primary_key.clone())
            .ok_or_else(|| SmallError::new(&format!("table {} not found", table_id)))
    }

    pub fn table_ids(&self) -> Vec<TableID> {
        self.tables.rl().keys().cloned().collect()
    }

    /// Remove all tables from the catalog, the files are left untouched.
    pub fn clear(&self) {
        self.tables.wl().clear();
    }

    /// Load tables from a schema file.
    ///
    /// Each line describes a table:
    ///
    /// ```text
    /// name (field type [pk], field type, ...)
    /// ```
    ///
    /// `type` is `int` or `string`, at most one field is annotated with
    /// `pk`. The data of table `name` lives in `name.dat`, next to the
    /// schema file.
    pub fn load_schema<P: AsRef<Path>>(&self, path: P) -> SmallResult {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let base_dir = path
            .canonicalize()?
            .parent()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| SmallError::io(&format!("invalid schema path: {:?}", path)))?;

        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }

            let (name, scheme, primary_key) = parse_schema_line(line)?;
            let table = HeapTable::new(base_dir.join(format!("{}.dat", name)), &scheme)?;
            self.add_table(Arc::new(table), &name, &primary_key);
            info!("added table: {} with scheme {}", name, scheme);
        }

        Ok(())
    }
}

fn parse_schema_line(line: &str) -> Result<(String, TupleScheme, String), SmallError> {
    let invalid = || SmallError::new(&format!("invalid catalog entry: {}", line));

    let open = line.find('(').ok_or_else(invalid)?;
    let close = line.rfind(')').ok_or_else(invalid)?;
    if close < open {
        return Err(invalid());
    }

    let name = line[..open].trim();
    if name.is_empty() {
        return Err(invalid());
    }

    let mut fields = Vec::new();
    let mut primary_key = String::new();
    for element in line[open + 1..close].split(',') {
        let parts: Vec<&str> = element.split_whitespace().collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid());
        }

        let field_type = Type::parse(parts[1])
            .ok_or_else(|| SmallError::new(&format!("unknown type {} in: {}", parts[1], line)))?;

        if let Some(annotation) = parts.get(2) {
            if *annotation != "pk" {
                return Err(SmallError::new(&format!(
                    "unknown annotation {} in: {}",
                    annotation, line
                )));
            }
            primary_key = parts[0].to_string();
        }

        fields.push(FieldItem::new(field_type, Some(parts[0])));
    }

    Ok((name.to_string(), TupleScheme::new(fields), primary_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schema_line() {
        let (name, scheme, pk) =
            parse_schema_line("students (id int pk, name string, age int)").unwrap();
        assert_eq!(name, "students");
        assert_eq!(pk, "id");
        assert_eq!(
            scheme,
            TupleScheme::from_types(&[Type::Int, Type::String, Type::Int])
        );
        assert_eq!(scheme.get_field_name(1), Some("name"));

        let (_, _, pk) = parse_schema_line("t (a int)").unwrap();
        assert_eq!(pk, "");
    }

    #[test]
    fn test_parse_invalid_line() {
        assert!(parse_schema_line("no fields").is_err());
        assert!(parse_schema_line("t (a float)").is_err());
        assert!(parse_schema_line("t (a int key)").is_err());
        assert!(parse_schema_line("t (a)").is_err());
        assert!(parse_schema_line(" (a int)").is_err());
    }
}
