//! Table store
//!
//! A table owns its schema (ordered column names, always starting with the
//! synthetic `id`), its rows, and the logic to mutate both and to mirror the
//! whole table to a flat `.tab` file.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sql::command::Assignment;
use crate::sql::condition::LogicalExpression;
use crate::sql::reserved::validate_identifier;

/// Name of the synthetic, immutable first column of every table
pub const ID_COLUMN: &str = "id";

/// File extension of table backing files
pub const TABLE_FILE_EXTENSION: &str = "tab";

/// Minimum field width in files and result grids, for visual alignment
const MIN_FIELD_WIDTH: usize = 18;

/// Serialized form of an absent value
pub(crate) const NULL_FIELD: &str = "NULL";

/// Pad a field to the minimum width, always keeping one trailing space
pub(crate) fn padded(field: &str) -> String {
    format!("{:<width$} ", field, width = MIN_FIELD_WIDTH - 1)
}

/// Fields in the backing file are delimited by whitespace, so a stored
/// value may not contain any.
fn validate_value(value: &str) -> Result<()> {
    if value.chars().any(char::is_whitespace) {
        return Err(Error::InvalidValue(value.to_string()));
    }
    Ok(())
}

/// One record of a table
///
/// Values are keyed by stored-case column name but looked up
/// case-insensitively. An absent value is `None`, not an empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: u64,
    values: IndexMap<String, Option<String>>,
}

impl Row {
    /// Build a row from the non-id column names and the supplied values;
    /// missing trailing values become absent.
    pub(crate) fn new(id: u64, columns: &[String], values: Vec<Option<String>>) -> Self {
        let mut map = IndexMap::with_capacity(columns.len());
        let mut values = values.into_iter();
        for column in columns {
            map.insert(column.clone(), values.next().flatten());
        }
        Self { id, values: map }
    }

    /// The assigned integer id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Look up an attribute case-insensitively
    ///
    /// Returns `None` when the row has no such column; `Some(None)` when the
    /// column exists but holds no value. A lookup of `id` synthesises the
    /// row id as text.
    pub fn get(&self, attribute: &str) -> Option<Option<String>> {
        if attribute.eq_ignore_ascii_case(ID_COLUMN) {
            return Some(Some(self.id.to_string()));
        }
        self.values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, value)| value.clone())
    }

    fn set(&mut self, column: &str, value: Option<String>) {
        if let Some((_, slot)) = self
            .values
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
        {
            *slot = value;
        }
    }
}

/// A named, schema'd, ordered row store backed by one file
///
/// Tables produced by JOIN are transient: they have no backing file and
/// [`Table::persist`] is a no-op for them.
#[derive(Debug)]
pub struct Table {
    name: String,
    /// Ordered column names; the first is always `id`
    columns: Vec<String>,
    rows: Vec<Row>,
    /// Monotonically increasing; never rewinds, even after deletions
    next_id: u64,
    path: Option<PathBuf>,
}

impl Table {
    /// Create an empty table with the given non-id columns
    pub fn new(name: &str, columns: Vec<String>, path: Option<PathBuf>) -> Self {
        let mut all_columns = Vec::with_capacity(columns.len() + 1);
        all_columns.push(ID_COLUMN.to_string());
        all_columns.extend(columns);
        Self {
            name: name.to_lowercase(),
            columns: all_columns,
            rows: Vec::new(),
            next_id: 1,
            path,
        }
    }

    /// The table's canonical (lowercase) name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All column names, `id` included, in schema order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column names without the leading `id`
    pub fn non_id_columns(&self) -> &[String] {
        &self.columns[1..]
    }

    /// All rows in insertion order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Resolve a column name case-insensitively to its stored-case form
    pub fn resolve_column(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|column| column.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    /// Append a column; existing rows hold no value for it
    pub fn add_column(&mut self, name: &str) -> Result<()> {
        validate_identifier(name)?;
        if self.resolve_column(name).is_some() {
            return Err(Error::ColumnAlreadyExists(name.to_string()));
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.values.insert(name.to_string(), None);
        }
        Ok(())
    }

    /// Remove a column and its value from every row
    pub fn drop_column(&mut self, name: &str) -> Result<()> {
        if name.eq_ignore_ascii_case(ID_COLUMN) {
            return Err(Error::ImmutableId);
        }
        let stored = self
            .resolve_column(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?
            .to_string();
        self.columns.retain(|column| column != &stored);
        for row in &mut self.rows {
            row.values.shift_remove(&stored);
        }
        Ok(())
    }

    /// Insert a row, assigning the next id
    ///
    /// The value count must equal the number of declared non-id columns,
    /// and no value may contain whitespace.
    pub fn insert_row(&mut self, values: Vec<Option<String>>) -> Result<u64> {
        let expected = self.columns.len() - 1;
        if values.len() != expected {
            return Err(Error::ValueCount {
                expected,
                found: values.len(),
            });
        }
        for value in values.iter().flatten() {
            validate_value(value)?;
        }
        Ok(self.append_row(values))
    }

    fn append_row(&mut self, values: Vec<Option<String>>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.push(Row::new(id, &self.columns[1..], values));
        id
    }

    /// Linear scan in insertion order; no predicate means "match all"
    pub fn select_rows(&self, predicate: Option<&LogicalExpression>) -> Result<Vec<&Row>> {
        let mut matched = Vec::new();
        for row in &self.rows {
            let keep = match predicate {
                Some(predicate) => predicate.evaluate(row)?,
                None => true,
            };
            if keep {
                matched.push(row);
            }
        }
        Ok(matched)
    }

    /// Apply every assignment to every row matched by the predicate
    ///
    /// Target columns are validated and the match set is computed in full
    /// before any row is touched, so an error never leaves a partial update.
    pub fn update_rows(
        &mut self,
        assignments: &[Assignment],
        predicate: &LogicalExpression,
    ) -> Result<usize> {
        let mut resolved = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            if assignment.column.eq_ignore_ascii_case(ID_COLUMN) {
                return Err(Error::ImmutableId);
            }
            validate_value(&assignment.value)?;
            let stored = self
                .resolve_column(&assignment.column)
                .ok_or_else(|| Error::ColumnNotFound(assignment.column.clone()))?
                .to_string();
            resolved.push((stored, assignment.value.clone()));
        }

        let matched = self.matching_indexes(predicate)?;
        for &index in &matched {
            for (column, value) in &resolved {
                self.rows[index].set(column, Some(value.clone()));
            }
        }
        Ok(matched.len())
    }

    /// Remove every row matched by the predicate
    pub fn delete_rows(&mut self, predicate: &LogicalExpression) -> Result<usize> {
        let matched = self.matching_indexes(predicate)?;
        let ids: HashSet<u64> = matched.iter().map(|&index| self.rows[index].id()).collect();
        self.rows.retain(|row| !ids.contains(&row.id()));
        Ok(ids.len())
    }

    fn matching_indexes(&self, predicate: &LogicalExpression) -> Result<Vec<usize>> {
        let mut matched = Vec::new();
        for (index, row) in self.rows.iter().enumerate() {
            if predicate.evaluate(row)? {
                matched.push(index);
            }
        }
        Ok(matched)
    }

    /// Rewrite the whole backing file: a header line of column names, then
    /// one line per row, all fields padded for alignment
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut header = String::new();
        for column in &self.columns {
            header.push_str(&padded(column));
        }
        writeln!(writer, "{}", header.trim_end())?;

        for row in &self.rows {
            let mut line = padded(&row.id().to_string());
            for column in &self.columns[1..] {
                let field = match row.values.get(column) {
                    Some(Some(value)) => value.clone(),
                    _ => NULL_FIELD.to_string(),
                };
                line.push_str(&padded(&field));
            }
            writeln!(writer, "{}", line.trim_end())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Rebuild a table from its backing file
    ///
    /// The header gives the column names (minus `id`); each following line's
    /// first field is the stored id, which is discarded because rows are
    /// re-inserted through normal insert logic.
    pub fn load(path: &Path) -> Result<Self> {
        let corrupt = || Error::CorruptTableFile(path.display().to_string());
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(corrupt)?
            .to_string();

        let contents = fs::read_to_string(path)?;
        let mut lines = contents.lines();
        let header = lines.next().ok_or_else(corrupt)?;
        let mut columns: Vec<String> = header.split_whitespace().map(str::to_string).collect();
        if columns.first().map(String::as_str) != Some(ID_COLUMN) {
            return Err(corrupt());
        }
        columns.remove(0);

        let mut table = Table::new(&name, columns, Some(path.to_path_buf()));
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            fields.next(); // stored id
            let values: Vec<Option<String>> = fields
                .map(|field| {
                    if field == NULL_FIELD {
                        None
                    } else {
                        Some(field.to_string())
                    }
                })
                .collect();
            if values.len() > table.columns.len() - 1 {
                return Err(corrupt());
            }
            table.append_row(values);
        }
        Ok(table)
    }

    /// Delete the backing file, if any
    pub fn remove_file(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
