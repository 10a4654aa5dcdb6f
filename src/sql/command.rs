//! Command parser
//!
//! Parses a token sequence into one of the nine structured operations and
//! extracts their sub-clauses (parenthesized lists, projection list, SET
//! triples, WHERE token run).

use crate::error::{Error, Result};
use crate::sql::condition::LogicalExpression;
use crate::sql::reserved::is_reserved;
use crate::sql::tokenizer::{strip_quotes, Tokenizer};

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// USE name;
    Use { database: String },
    /// CREATE DATABASE name;
    CreateDatabase { name: String },
    /// CREATE TABLE name [ ( col, ... ) ];
    CreateTable { name: String, columns: Vec<String> },
    /// DROP DATABASE name;
    DropDatabase { name: String },
    /// DROP TABLE name;
    DropTable { name: String },
    /// INSERT INTO name VALUES ( v, ... );
    Insert { table: String, values: Vec<String> },
    /// SELECT ... FROM name [ WHERE cond ];
    Select {
        table: String,
        projection: Projection,
        predicate: Option<LogicalExpression>,
    },
    /// UPDATE name SET col=v, ... WHERE cond;
    Update {
        table: String,
        assignments: Vec<Assignment>,
        predicate: LogicalExpression,
    },
    /// DELETE FROM name WHERE cond;
    Delete {
        table: String,
        predicate: LogicalExpression,
    },
    /// JOIN name1 AND name2 ON attr1 AND attr2;
    Join {
        left_table: String,
        right_table: String,
        left_attribute: String,
        right_attribute: String,
    },
    /// ALTER TABLE name (ADD|DROP) col;
    AlterTable {
        table: String,
        alteration: Alteration,
    },
}

/// SELECT column list
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*`
    Wildcard,
    /// Explicit column names, in query order
    Columns(Vec<String>),
}

/// One `col = value` pair of a SET clause
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: String,
}

/// ALTER TABLE variant
#[derive(Debug, Clone, PartialEq)]
pub enum Alteration {
    AddColumn(String),
    DropColumn(String),
}

/// Command parser over a token sequence
pub struct Parser {
    tokens: Vec<String>,
    position: usize,
}

impl Parser {
    /// Tokenize a command line and create a parser for it
    pub fn new(command: &str) -> Result<Self> {
        let tokens = Tokenizer::new(command).tokenize()?;
        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse the single command held by this parser
    pub fn parse(&mut self) -> Result<Command> {
        if self.tokens.is_empty() {
            return Err(Error::Malformed("empty command".to_string()));
        }
        if self.tokens.last().map(String::as_str) != Some(";") {
            return Err(Error::MissingSemicolon);
        }

        match self.tokens[0].to_ascii_uppercase().as_str() {
            "USE" => self.parse_use(),
            "CREATE" => self.parse_create(),
            "DROP" => self.parse_drop(),
            "INSERT" => self.parse_insert(),
            "SELECT" => self.parse_select(),
            "UPDATE" => self.parse_update(),
            "DELETE" => self.parse_delete(),
            "JOIN" => self.parse_join(),
            "ALTER" => self.parse_alter(),
            _ => Err(Error::UnknownCommand(self.tokens[0].clone())),
        }
    }

    // ========== Commands ==========

    fn parse_use(&mut self) -> Result<Command> {
        self.expect_keyword("USE")?;
        let database = self.next_identifier()?;
        self.expect_terminator()?;
        Ok(Command::Use { database })
    }

    fn parse_create(&mut self) -> Result<Command> {
        self.expect_keyword("CREATE")?;
        let kind = self.next_token()?;
        if kind.eq_ignore_ascii_case("DATABASE") {
            let name = self.next_identifier()?;
            self.expect_terminator()?;
            Ok(Command::CreateDatabase { name })
        } else if kind.eq_ignore_ascii_case("TABLE") {
            let name = self.next_identifier()?;
            let columns = if self.peek().map(String::as_str) == Some("(") {
                self.parse_paren_list()?
            } else {
                Vec::new()
            };
            self.expect_terminator()?;
            Ok(Command::CreateTable { name, columns })
        } else {
            Err(Error::Malformed(format!(
                "expected 'DATABASE' or 'TABLE' but found '{}'",
                kind
            )))
        }
    }

    fn parse_drop(&mut self) -> Result<Command> {
        self.expect_keyword("DROP")?;
        let kind = self.next_token()?;
        let name = self.next_identifier()?;
        self.expect_terminator()?;
        if kind.eq_ignore_ascii_case("DATABASE") {
            Ok(Command::DropDatabase { name })
        } else if kind.eq_ignore_ascii_case("TABLE") {
            Ok(Command::DropTable { name })
        } else {
            Err(Error::Malformed(format!(
                "expected 'DATABASE' or 'TABLE' but found '{}'",
                kind
            )))
        }
    }

    fn parse_insert(&mut self) -> Result<Command> {
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let table = self.next_identifier()?;
        self.expect_keyword("VALUES")?;
        let items = self.parse_paren_list()?;
        self.expect_terminator()?;

        // Bare values may not collide with the reserved-word set; quoted
        // literals are stored with their delimiters stripped.
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            if item.starts_with('\'') {
                values.push(strip_quotes(&item).to_string());
            } else if is_reserved(&item) {
                return Err(Error::ReservedWord(item));
            } else {
                values.push(item);
            }
        }
        Ok(Command::Insert { table, values })
    }

    fn parse_select(&mut self) -> Result<Command> {
        self.expect_keyword("SELECT")?;

        let projection = if self.peek().map(String::as_str) == Some("*") {
            self.next_token()?;
            Projection::Wildcard
        } else {
            let mut columns = vec![self.next_projection_column()?];
            while self.peek().map(String::as_str) == Some(",") {
                self.next_token()?;
                columns.push(self.next_projection_column()?);
            }
            Projection::Columns(columns)
        };

        self.expect_keyword("FROM")?;
        let table = self.next_identifier()?;

        let predicate = if self
            .peek()
            .is_some_and(|t| t.eq_ignore_ascii_case("WHERE"))
        {
            self.next_token()?;
            Some(self.parse_where_run()?)
        } else {
            self.expect_terminator()?;
            None
        };

        Ok(Command::Select {
            table,
            projection,
            predicate,
        })
    }

    fn parse_update(&mut self) -> Result<Command> {
        self.expect_keyword("UPDATE")?;
        let table = self.next_identifier()?;
        self.expect_keyword("SET")?;

        let mut run = Vec::new();
        loop {
            match self.peek() {
                None => return Err(Error::Malformed("missing WHERE clause".to_string())),
                Some(token) if token.eq_ignore_ascii_case("WHERE") => break,
                Some(token) if token == ";" => {
                    return Err(Error::Malformed("missing WHERE clause".to_string()));
                }
                Some(_) => run.push(self.next_token()?),
            }
        }
        let assignments = parse_assignments(&run)?;

        self.expect_keyword("WHERE")?;
        let predicate = self.parse_where_run()?;

        Ok(Command::Update {
            table,
            assignments,
            predicate,
        })
    }

    fn parse_delete(&mut self) -> Result<Command> {
        self.expect_keyword("DELETE")?;
        self.expect_keyword("FROM")?;
        let table = self.next_identifier()?;
        self.expect_keyword("WHERE")?;
        let predicate = self.parse_where_run()?;
        Ok(Command::Delete { table, predicate })
    }

    fn parse_join(&mut self) -> Result<Command> {
        self.expect_keyword("JOIN")?;
        let left_table = self.next_identifier()?;
        self.expect_keyword("AND")?;
        let right_table = self.next_identifier()?;
        self.expect_keyword("ON")?;
        let left_attribute = self.next_identifier()?;
        self.expect_keyword("AND")?;
        let right_attribute = self.next_identifier()?;
        self.expect_terminator()?;
        Ok(Command::Join {
            left_table,
            right_table,
            left_attribute,
            right_attribute,
        })
    }

    fn parse_alter(&mut self) -> Result<Command> {
        self.expect_keyword("ALTER")?;
        self.expect_keyword("TABLE")?;
        let table = self.next_identifier()?;
        let kind = self.next_token()?;
        let column = self.next_identifier()?;
        self.expect_terminator()?;
        let alteration = if kind.eq_ignore_ascii_case("ADD") {
            Alteration::AddColumn(column)
        } else if kind.eq_ignore_ascii_case("DROP") {
            Alteration::DropColumn(column)
        } else {
            return Err(Error::Malformed(format!(
                "expected 'ADD' or 'DROP' but found '{}'",
                kind
            )));
        };
        Ok(Command::AlterTable { table, alteration })
    }

    // ========== Clause helpers ==========

    /// Parse `( item [, item ...] )`, also accepting an empty list
    fn parse_paren_list(&mut self) -> Result<Vec<String>> {
        self.expect_symbol("(")?;
        let mut items = Vec::new();
        if self.peek().map(String::as_str) == Some(")") {
            self.next_token()?;
            return Ok(items);
        }
        loop {
            items.push(self.next_identifier()?);
            let separator = self.next_token()?;
            if separator == ")" {
                break;
            }
            if separator != "," {
                return Err(Error::Malformed(format!(
                    "expected ',' or ')' but found '{}'",
                    separator
                )));
            }
        }
        Ok(items)
    }

    /// Consume the WHERE token run (everything up to the final `;`),
    /// coalesce split comparators, and build the condition tree
    fn parse_where_run(&mut self) -> Result<LogicalExpression> {
        let end = self.tokens.len() - 1;
        let run = &self.tokens[self.position..end];
        if run.is_empty() {
            return Err(Error::Malformed("missing WHERE condition".to_string()));
        }
        if run.iter().any(|t| t == ";") {
            return Err(Error::Malformed(
                "unexpected ';' inside WHERE clause".to_string(),
            ));
        }
        let run = coalesce_comparators(run);
        self.position = self.tokens.len();
        LogicalExpression::parse(&run)
    }

    // ========== Token helpers ==========

    fn peek(&self) -> Option<&String> {
        self.tokens.get(self.position)
    }

    fn next_token(&mut self) -> Result<String> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| Error::Malformed("unexpected end of command".to_string()))?;
        self.position += 1;
        Ok(token)
    }

    /// Consume a name-like token (not punctuation)
    fn next_identifier(&mut self) -> Result<String> {
        let token = self.next_token()?;
        if matches!(token.as_str(), ";" | "(" | ")" | "," | "<" | ">" | "=") {
            return Err(Error::Malformed(format!(
                "expected a name but found '{}'",
                token
            )));
        }
        Ok(token)
    }

    /// Consume a projected column name, catching a missing attribute list
    fn next_projection_column(&mut self) -> Result<String> {
        let token = self.next_identifier()?;
        if token.eq_ignore_ascii_case("FROM") {
            return Err(Error::Malformed("missing attribute list".to_string()));
        }
        Ok(token)
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        let token = self.next_token()?;
        if token.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            Err(Error::Malformed(format!(
                "expected '{}' but found '{}'",
                keyword, token
            )))
        }
    }

    fn expect_symbol(&mut self, symbol: &str) -> Result<()> {
        let token = self.next_token()?;
        if token == symbol {
            Ok(())
        } else {
            Err(Error::Malformed(format!(
                "expected '{}' but found '{}'",
                symbol, token
            )))
        }
    }

    /// Consume the terminating `;`, which must be the final token
    fn expect_terminator(&mut self) -> Result<()> {
        let token = self.next_token()?;
        if token != ";" {
            return Err(Error::Malformed(format!("unexpected token '{}'", token)));
        }
        if self.position != self.tokens.len() {
            return Err(Error::Malformed("trailing tokens after ';'".to_string()));
        }
        Ok(())
    }
}

/// Coalesce a `<` or `>` token with a following `=` into `<=` / `>=`
///
/// The tokenizer pads `<` and `>` but not `=`, so `mark >= 70` arrives as
/// `>`, `=` while `mark>=70` arrives as `>`, `=70` with the `=` still glued
/// to the next character. Rejoin the comparator either way and re-emit
/// whatever followed the `=`.
fn coalesce_comparators(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let next = tokens.get(i + 1);
        if (tokens[i] == "<" || tokens[i] == ">") && next.is_some_and(|t| t.starts_with('=')) {
            out.push(format!("{}=", tokens[i]));
            let rest = &next.unwrap()[1..];
            if !rest.is_empty() {
                out.push(rest.to_string());
            }
            i += 2;
        } else {
            out.push(tokens[i].clone());
            i += 1;
        }
    }
    out
}

/// Parse the SET clause token run into `col = value` assignments
///
/// Tokens containing `=` are split first so that `col=v`, `col= v` and
/// `col = v` all parse the same way.
fn parse_assignments(run: &[String]) -> Result<Vec<Assignment>> {
    let tokens = split_equals(run);
    let mut assignments = Vec::new();
    let mut i = 0;
    loop {
        if i + 3 > tokens.len() {
            return Err(Error::Malformed("malformed SET clause".to_string()));
        }
        if tokens[i + 1] != "=" {
            return Err(Error::Malformed(format!(
                "expected '=' but found '{}'",
                tokens[i + 1]
            )));
        }
        assignments.push(Assignment {
            column: tokens[i].clone(),
            value: strip_quotes(&tokens[i + 2]).to_string(),
        });
        i += 3;
        if i == tokens.len() {
            break;
        }
        if tokens[i] != "," {
            return Err(Error::Malformed(format!(
                "expected ',' in SET clause but found '{}'",
                tokens[i]
            )));
        }
        i += 1;
    }
    Ok(assignments)
}

/// Split unquoted tokens on `=`, keeping `=` as its own token
fn split_equals(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.starts_with('\'') || !token.contains('=') {
            out.push(token.clone());
            continue;
        }
        let mut rest = token.as_str();
        while let Some(pos) = rest.find('=') {
            if pos > 0 {
                out.push(rest[..pos].to_string());
            }
            out.push("=".to_string());
            rest = &rest[pos + 1..];
        }
        if !rest.is_empty() {
            out.push(rest.to_string());
        }
    }
    out
}
