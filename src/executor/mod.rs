//! Execution module
//!
//! This module turns parsed commands into catalog and storage operations,
//! and formats query results for the wire protocol.

pub mod executor;
pub mod join;

pub use executor::{Executor, QueryResult};
pub use join::join_tables;
