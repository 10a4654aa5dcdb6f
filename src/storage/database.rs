//! Database store
//!
//! A database is a named collection of tables mirrored to one directory on
//! disk, with one `.tab` file per table.

use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sql::reserved::validate_identifier;
use crate::storage::table::{Table, ID_COLUMN, TABLE_FILE_EXTENSION};

/// A named collection of tables
///
/// Tables are keyed by lowercase name; lookups are case-insensitive.
#[derive(Debug)]
pub struct Database {
    name: String,
    path: PathBuf,
    tables: IndexMap<String, Table>,
}

impl Database {
    /// Create an empty in-memory database rooted at the given directory
    pub fn new(name: &str, path: PathBuf) -> Self {
        Self {
            name: name.to_lowercase(),
            path,
            tables: IndexMap::new(),
        }
    }

    /// Load a database by reading every `.tab` file in its directory
    pub fn load(name: &str, path: PathBuf) -> Result<Self> {
        let mut database = Self::new(name, path);
        for entry in fs::read_dir(&database.path)? {
            let file_path = entry?.path();
            if file_path.extension().and_then(|ext| ext.to_str()) != Some(TABLE_FILE_EXTENSION) {
                continue;
            }
            let table = Table::load(&file_path)?;
            tracing::debug!(table = table.name(), "loaded table from disk");
            database.tables.insert(table.name().to_string(), table);
        }
        Ok(database)
    }

    /// The database's canonical (lowercase) name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The directory holding this database's table files
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all resident tables
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Look up a table case-insensitively
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(&name.to_lowercase())
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Look up a table case-insensitively for mutation
    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Create a table and write its (header-only) backing file
    pub fn create_table(&mut self, name: &str, columns: &[String]) -> Result<()> {
        validate_identifier(name)?;
        for (i, column) in columns.iter().enumerate() {
            validate_identifier(column)?;
            // A declared column may not duplicate another or the synthetic id.
            if column.eq_ignore_ascii_case(ID_COLUMN)
                || columns[..i].iter().any(|c| c.eq_ignore_ascii_case(column))
            {
                return Err(Error::DuplicateColumn(column.clone()));
            }
        }

        let key = name.to_lowercase();
        let file_path = self.table_path(&key);
        if self.tables.contains_key(&key) || file_path.exists() {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }

        let table = Table::new(name, columns.to_vec(), Some(file_path));
        table.persist()?;
        tracing::info!(table = %key, "created table");
        self.tables.insert(key, table);
        Ok(())
    }

    /// Drop a table and delete its backing file
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let key = name.to_lowercase();
        let Some(table) = self.tables.get(&key) else {
            return Err(Error::TableNotFound(name.to_string()));
        };
        table.remove_file()?;
        self.tables.shift_remove(&key);
        tracing::info!(table = %key, "dropped table");
        Ok(())
    }

    fn table_path(&self, key: &str) -> PathBuf {
        self.path.join(format!("{}.{}", key, TABLE_FILE_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_database() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let database = Database::new("markbook", dir.path().to_path_buf());
        (dir, database)
    }

    #[test]
    fn test_create_and_lookup_is_case_insensitive() {
        let (_dir, mut database) = test_database();
        database
            .create_table("Marks", &["name".to_string()])
            .unwrap();
        assert!(database.table("MARKS").is_ok());
        assert!(database.table_mut("marks").is_ok());
        assert!(matches!(
            database.table("grades"),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_create_rejects_duplicate_table() {
        let (_dir, mut database) = test_database();
        database.create_table("marks", &[]).unwrap();
        assert!(matches!(
            database.create_table("MARKS", &[]),
            Err(Error::TableAlreadyExists(_))
        ));
    }

    #[test]
    fn test_create_rejects_bad_columns() {
        let (_dir, mut database) = test_database();
        assert!(matches!(
            database.create_table("marks", &["where".to_string()]),
            Err(Error::ReservedWord(_))
        ));
        assert!(matches!(
            database.create_table("marks", &["name".to_string(), "NAME".to_string()]),
            Err(Error::DuplicateColumn(_))
        ));
        assert!(matches!(
            database.create_table("marks", &["id".to_string()]),
            Err(Error::DuplicateColumn(_))
        ));
        // Nothing was created along the way.
        assert!(database.table_names().is_empty());
    }

    #[test]
    fn test_create_writes_backing_file() {
        let (dir, mut database) = test_database();
        database
            .create_table("marks", &["name".to_string()])
            .unwrap();
        assert!(dir.path().join("marks.tab").exists());
    }

    #[test]
    fn test_drop_table_removes_file() {
        let (dir, mut database) = test_database();
        database.create_table("marks", &[]).unwrap();
        database.drop_table("Marks").unwrap();
        assert!(!dir.path().join("marks.tab").exists());
        assert!(matches!(
            database.drop_table("marks"),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_load_restores_tables() {
        let (dir, mut database) = test_database();
        database
            .create_table("marks", &["name".to_string()])
            .unwrap();
        database
            .table_mut("marks")
            .unwrap()
            .insert_row(vec![Some("Sam".to_string())])
            .unwrap();
        database.table("marks").unwrap().persist().unwrap();

        let reloaded = Database::load("markbook", dir.path().to_path_buf()).unwrap();
        let table = reloaded.table("marks").unwrap();
        assert_eq!(table.columns(), &["id", "name"]);
        assert_eq!(table.rows().len(), 1);
    }
}
