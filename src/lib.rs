//! TabDB - A minimal relational command engine written in Rust
//!
//! This library provides the core components for a small flat-file database:
//! - Command tokenizing and parsing
//! - Boolean condition trees for WHERE clauses
//! - Table storage backed by human-readable `.tab` files
//! - A catalog of named databases
//! - TCP server

pub mod catalog;
pub mod error;
pub mod executor;
pub mod server;
pub mod sql;
pub mod storage;

pub use error::{Error, Result};
