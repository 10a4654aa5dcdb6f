//! Nested-loop equi-join
//!
//! Joins two tables of the current database on one attribute from each
//! side, producing a transient result table that is never persisted.

use crate::error::{Error, Result};
use crate::storage::{Database, Row, Table};

/// Join two tables on exact string equality of one attribute from each
///
/// The result schema is a fresh `id` followed by each side's remaining
/// columns qualified as `table.column`; the join attributes and the source
/// ids are not carried over. Rows pair up in nested-loop order, one output
/// row per matching pair, and an absent join value matches nothing.
pub fn join_tables(
    database: &Database,
    left_name: &str,
    right_name: &str,
    left_attribute: &str,
    right_attribute: &str,
) -> Result<Table> {
    let left = database.table(left_name)?;
    let right = database.table(right_name)?;
    let left_attribute = left
        .resolve_column(left_attribute)
        .ok_or_else(|| Error::ColumnNotFound(left_attribute.to_string()))?
        .to_string();
    let right_attribute = right
        .resolve_column(right_attribute)
        .ok_or_else(|| Error::ColumnNotFound(right_attribute.to_string()))?
        .to_string();

    let mut columns = qualified_columns(left, &left_attribute);
    columns.extend(qualified_columns(right, &right_attribute));
    let mut joined = Table::new("joined", columns, None);

    for left_row in left.rows() {
        let Some(Some(left_value)) = left_row.get(&left_attribute) else {
            continue;
        };
        for right_row in right.rows() {
            let Some(Some(right_value)) = right_row.get(&right_attribute) else {
                continue;
            };
            if left_value == right_value {
                let mut values = carried_values(left, &left_attribute, left_row);
                values.extend(carried_values(right, &right_attribute, right_row));
                joined.insert_row(values)?;
            }
        }
    }
    Ok(joined)
}

/// The columns one side contributes, qualified with its table name
fn qualified_columns(table: &Table, join_attribute: &str) -> Vec<String> {
    table
        .non_id_columns()
        .iter()
        .filter(|column| !column.eq_ignore_ascii_case(join_attribute))
        .map(|column| format!("{}.{}", table.name(), column))
        .collect()
}

/// The values one row contributes, in the same order as [`qualified_columns`]
fn carried_values(table: &Table, join_attribute: &str, row: &Row) -> Vec<Option<String>> {
    table
        .non_id_columns()
        .iter()
        .filter(|column| !column.eq_ignore_ascii_case(join_attribute))
        .map(|column| row.get(column).flatten())
        .collect()
}
