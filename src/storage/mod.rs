//! Storage module
//!
//! This module contains the table store and the per-database table
//! collection, both backed by human-readable flat files.

pub mod database;
pub mod table;

pub use database::Database;
pub use table::{Row, Table, ID_COLUMN};
