//! Command tokenizer
//!
//! Splits a raw command line into punctuation/keyword tokens while keeping
//! quoted string literals intact as single tokens.

use crate::error::{Error, Result};

/// Punctuation that is always emitted as its own token.
const PUNCTUATION: [char; 6] = ['(', ')', ',', ';', '<', '>'];

/// Command tokenizer
///
/// A `Tokenizer` is built fresh for every command and consumed by
/// [`Tokenizer::tokenize`], so tokens can never leak between commands.
pub struct Tokenizer {
    input: String,
}

impl Tokenizer {
    /// Create a new tokenizer for the given command line
    pub fn new(input: &str) -> Self {
        Self {
            input: input.trim().to_string(),
        }
    }

    /// Tokenize the entire input
    ///
    /// The input is split on single quotes: fragments at odd positions are
    /// string literals and are re-wrapped in quotes unchanged (embedded
    /// spaces and punctuation preserved); fragments at even positions are
    /// structural text and are split on punctuation and whitespace. No case
    /// normalization happens here.
    pub fn tokenize(self) -> Result<Vec<String>> {
        // An odd quote count misaligns literal/structural parity, so the
        // literal boundaries cannot be trusted.
        if self.input.matches('\'').count() % 2 != 0 {
            return Err(Error::UnbalancedQuotes);
        }

        let mut tokens = Vec::new();
        for (i, fragment) in self.input.split('\'').enumerate() {
            if i % 2 == 1 {
                tokens.push(format!("'{}'", fragment));
            } else {
                split_structural(fragment, &mut tokens);
            }
        }
        Ok(tokens)
    }
}

/// Strip the surrounding quote delimiters from a string-literal token
///
/// Tokens that are not quoted literals are returned unchanged.
pub fn strip_quotes(token: &str) -> &str {
    if token.len() >= 2 && token.starts_with('\'') && token.ends_with('\'') {
        &token[1..token.len() - 1]
    } else {
        token
    }
}

/// Split a structural (non-literal) fragment into tokens
///
/// Pads every punctuation symbol with spaces so that a plain whitespace
/// split separates it from its neighbors.
fn split_structural(fragment: &str, tokens: &mut Vec<String>) {
    let mut padded = String::with_capacity(fragment.len() + 8);
    for ch in fragment.chars() {
        if PUNCTUATION.contains(&ch) {
            padded.push(' ');
            padded.push(ch);
            padded.push(' ');
        } else {
            padded.push(ch);
        }
    }
    tokens.extend(padded.split_whitespace().map(str::to_string));
}
