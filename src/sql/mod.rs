//! Command language module
//!
//! This module contains the tokenizer, the reserved-word set, the condition
//! expression engine, and the command parser.

pub mod command;
pub mod condition;
pub mod reserved;
pub mod tokenizer;

pub use command::{Alteration, Assignment, Command, Parser, Projection};
pub use condition::{Comparator, Condition, Expression, LogicalExpression, LogicalOp};
pub use reserved::{is_reserved, validate_identifier};
pub use tokenizer::{strip_quotes, Tokenizer};
