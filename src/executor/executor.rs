//! Command executor
//!
//! One executor wraps a catalog and drives the full pipeline for each
//! incoming line: parse, dispatch, mutate or query, persist, and format the
//! response.

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::executor::join::join_tables;
use crate::sql::command::{Alteration, Command, Parser, Projection};
use crate::sql::condition::LogicalExpression;
use crate::storage::table::{padded, NULL_FIELD};
use crate::storage::{Row, Table};

/// A tabular query result, ready to render
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl QueryResult {
    /// Column headers, in output order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Result rows as display strings
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Render as an aligned grid: one header line, then one line per row
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        let mut header = String::new();
        for column in &self.columns {
            header.push_str(&padded(column));
        }
        lines.push(header.trim_end().to_string());
        for row in &self.rows {
            let mut line = String::new();
            for field in row {
                line.push_str(&padded(field));
            }
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }
}

/// Executes command lines against a catalog
pub struct Executor<'a> {
    catalog: &'a mut Catalog,
}

impl<'a> Executor<'a> {
    pub fn new(catalog: &'a mut Catalog) -> Self {
        Self { catalog }
    }

    /// Run one command line and format the protocol response
    ///
    /// Every outcome maps to a single response string: `[OK]` with an
    /// optional result grid, or `[ERROR]: ` followed by the failure reason.
    pub fn handle_command(&mut self, input: &str) -> String {
        match self.execute(input) {
            Ok(Some(result)) => format!("[OK]\n{}", result.render()),
            Ok(None) => "[OK]".to_string(),
            Err(error) => {
                tracing::debug!(%error, "command failed");
                format!("[ERROR]: {}", error)
            }
        }
    }

    /// Parse and execute one command line
    ///
    /// Mutating commands rewrite the affected table's backing file before
    /// returning, so the disk state always reflects every acknowledged
    /// change.
    pub fn execute(&mut self, input: &str) -> Result<Option<QueryResult>> {
        let command = Parser::new(input)?.parse()?;
        match command {
            Command::Use { database } => {
                self.catalog.use_database(&database)?;
                Ok(None)
            }
            Command::CreateDatabase { name } => {
                self.catalog.create_database(&name)?;
                Ok(None)
            }
            Command::DropDatabase { name } => {
                self.catalog.drop_database(&name)?;
                Ok(None)
            }
            Command::CreateTable { name, columns } => {
                self.catalog
                    .current_database_mut()?
                    .create_table(&name, &columns)?;
                Ok(None)
            }
            Command::DropTable { name } => {
                self.catalog.current_database_mut()?.drop_table(&name)?;
                Ok(None)
            }
            Command::Insert { table, values } => {
                let table = self.catalog.current_database_mut()?.table_mut(&table)?;
                table.insert_row(values.into_iter().map(Some).collect())?;
                table.persist()?;
                Ok(None)
            }
            Command::Select {
                table,
                projection,
                predicate,
            } => {
                let table = self.catalog.current_database()?.table(&table)?;
                Ok(Some(select(table, &projection, predicate.as_ref())?))
            }
            Command::Update {
                table,
                assignments,
                predicate,
            } => {
                let table = self.catalog.current_database_mut()?.table_mut(&table)?;
                table.update_rows(&assignments, &predicate)?;
                table.persist()?;
                Ok(None)
            }
            Command::Delete { table, predicate } => {
                let table = self.catalog.current_database_mut()?.table_mut(&table)?;
                table.delete_rows(&predicate)?;
                table.persist()?;
                Ok(None)
            }
            Command::Join {
                left_table,
                right_table,
                left_attribute,
                right_attribute,
            } => {
                let database = self.catalog.current_database()?;
                let joined = join_tables(
                    database,
                    &left_table,
                    &right_table,
                    &left_attribute,
                    &right_attribute,
                )?;
                Ok(Some(select(&joined, &Projection::Wildcard, None)?))
            }
            Command::AlterTable { table, alteration } => {
                let table = self.catalog.current_database_mut()?.table_mut(&table)?;
                match alteration {
                    Alteration::AddColumn(column) => table.add_column(&column)?,
                    Alteration::DropColumn(column) => table.drop_column(&column)?,
                }
                table.persist()?;
                Ok(None)
            }
        }
    }
}

/// Project and filter a table into a result grid
///
/// Every projected column must exist; the output uses the stored-case
/// column names regardless of how the query spelled them.
fn select(
    table: &Table,
    projection: &Projection,
    predicate: Option<&LogicalExpression>,
) -> Result<QueryResult> {
    let columns: Vec<String> = match projection {
        Projection::Wildcard => table.columns().to_vec(),
        Projection::Columns(named) => {
            let mut resolved = Vec::with_capacity(named.len());
            for name in named {
                let stored = table
                    .resolve_column(name)
                    .ok_or_else(|| Error::ColumnNotFound(name.clone()))?;
                resolved.push(stored.to_string());
            }
            resolved
        }
    };

    let matched = table.select_rows(predicate)?;
    let mut rows = Vec::with_capacity(matched.len());
    for row in matched {
        rows.push(
            columns
                .iter()
                .map(|column| display_value(row, column))
                .collect(),
        );
    }
    Ok(QueryResult { columns, rows })
}

fn display_value(row: &Row, column: &str) -> String {
    match row.get(column) {
        Some(Some(value)) => value,
        _ => NULL_FIELD.to_string(),
    }
}
