//! Catalog module
//!
//! The catalog owns the storage root directory, the set of databases under
//! it, and the session's current database selection.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sql::reserved::validate_identifier;
use crate::storage::Database;

/// Directory under which every database lives, one subdirectory each
pub const DEFAULT_STORAGE_ROOT: &str = "databases";

/// Top-level database registry and session state
///
/// Databases are materialized lazily: a database directory on disk is the
/// source of truth for existence, and its tables are read into memory the
/// first time the database is selected.
#[derive(Debug)]
pub struct Catalog {
    storage_root: PathBuf,
    databases: HashMap<String, Database>,
    current: Option<String>,
}

impl Catalog {
    /// Create a catalog rooted at the given directory, creating it if needed
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        let storage_root = storage_root.into();
        if let Err(error) = fs::create_dir_all(&storage_root) {
            tracing::error!(%error, path = %storage_root.display(), "cannot create storage root");
        }
        Self {
            storage_root,
            databases: HashMap::new(),
            current: None,
        }
    }

    /// The directory under which all databases live
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Name of the currently selected database, if any
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Create a new database directory
    pub fn create_database(&mut self, name: &str) -> Result<()> {
        validate_identifier(name)?;
        let key = name.to_lowercase();
        let path = self.database_path(&key);
        if path.exists() {
            return Err(Error::DatabaseAlreadyExists(name.to_string()));
        }
        fs::create_dir_all(&path)?;
        tracing::info!(database = %key, "created database");
        Ok(())
    }

    /// Select a database, loading its tables from disk if not yet resident
    pub fn use_database(&mut self, name: &str) -> Result<()> {
        validate_identifier(name)?;
        let key = name.to_lowercase();
        let path = self.database_path(&key);
        if !path.is_dir() {
            return Err(Error::DatabaseNotFound(name.to_string()));
        }
        if !self.databases.contains_key(&key) {
            let database = Database::load(&key, path)?;
            self.databases.insert(key.clone(), database);
        }
        tracing::info!(database = %key, "selected database");
        self.current = Some(key);
        Ok(())
    }

    /// Drop a database: its directory, all its table files, and (when it is
    /// the current one) the session's selection
    ///
    /// The name is validated before it touches a path: only alphanumeric
    /// names can ever resolve inside the storage root.
    pub fn drop_database(&mut self, name: &str) -> Result<()> {
        validate_identifier(name)?;
        let key = name.to_lowercase();
        let path = self.database_path(&key);
        if !path.is_dir() {
            return Err(Error::DatabaseNotFound(name.to_string()));
        }
        fs::remove_dir_all(&path)?;
        self.databases.remove(&key);
        if self.current.as_deref() == Some(&key) {
            self.current = None;
        }
        tracing::info!(database = %key, "dropped database");
        Ok(())
    }

    /// The currently selected database
    pub fn current_database(&self) -> Result<&Database> {
        let key = self.current.as_ref().ok_or(Error::NoDatabaseSelected)?;
        self.databases
            .get(key)
            .ok_or_else(|| Error::DatabaseNotFound(key.clone()))
    }

    /// The currently selected database, for mutation
    pub fn current_database_mut(&mut self) -> Result<&mut Database> {
        let key = self.current.as_ref().ok_or(Error::NoDatabaseSelected)?;
        self.databases
            .get_mut(key)
            .ok_or_else(|| Error::DatabaseNotFound(key.clone()))
    }

    fn database_path(&self, key: &str) -> PathBuf {
        self.storage_root.join(key)
    }
}
