//! Condition expression engine
//!
//! Turns the token run following `WHERE` into a tree of leaf comparisons
//! combined by `AND`/`OR`, and evaluates that tree against a row.

use crate::error::{Error, Result};
use crate::sql::tokenizer::strip_quotes;
use crate::storage::Row;

/// Comparator of a leaf condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// ==
    Eq,
    /// !=
    Neq,
    /// <
    Lt,
    /// <=
    Lte,
    /// >
    Gt,
    /// >=
    Gte,
    /// LIKE (substring containment)
    Like,
}

impl Comparator {
    /// Try to parse a comparator token
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "==" => Ok(Comparator::Eq),
            "!=" => Ok(Comparator::Neq),
            "<" => Ok(Comparator::Lt),
            "<=" => Ok(Comparator::Lte),
            ">" => Ok(Comparator::Gt),
            ">=" => Ok(Comparator::Gte),
            _ if token.eq_ignore_ascii_case("LIKE") => Ok(Comparator::Like),
            _ => Err(Error::UnknownComparator(token.to_string())),
        }
    }
}

/// Boolean combinator of a logical expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("AND") {
            Some(LogicalOp::And)
        } else if token.eq_ignore_ascii_case("OR") {
            Some(LogicalOp::Or)
        } else {
            None
        }
    }

    /// Identity element for folding child results
    fn identity(self) -> bool {
        matches!(self, LogicalOp::And)
    }
}

/// A single attribute/comparator/literal comparison
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    attribute: String,
    comparator: Comparator,
    literal: String,
}

impl Condition {
    /// Build a condition from the three tokens of a leaf comparison
    pub fn new(attribute: &str, comparator: &str, literal: &str) -> Result<Self> {
        Ok(Self {
            attribute: attribute.to_string(),
            comparator: Comparator::from_token(comparator)?,
            literal: literal.to_string(),
        })
    }

    /// Evaluate this condition against a row
    ///
    /// String comparators strip quote delimiters from the literal first;
    /// relational comparators parse both sides as floating-point numbers.
    /// An absent value satisfies no condition; an unknown attribute is an
    /// error.
    pub fn evaluate(&self, row: &Row) -> Result<bool> {
        let value = row
            .get(&self.attribute)
            .ok_or_else(|| Error::ColumnNotFound(self.attribute.clone()))?;
        let Some(value) = value else {
            return Ok(false);
        };
        let literal = strip_quotes(&self.literal);

        match self.comparator {
            Comparator::Eq => Ok(value == literal),
            Comparator::Neq => Ok(value != literal),
            Comparator::Like => Ok(value.contains(literal)),
            Comparator::Lt | Comparator::Lte | Comparator::Gt | Comparator::Gte => {
                let lhs = parse_numeric(&value)?;
                let rhs = parse_numeric(literal)?;
                Ok(match self.comparator {
                    Comparator::Lt => lhs < rhs,
                    Comparator::Lte => lhs <= rhs,
                    Comparator::Gt => lhs > rhs,
                    _ => lhs >= rhs,
                })
            }
        }
    }
}

fn parse_numeric(text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| Error::NonNumericOperand(text.to_string()))
}

/// A node of the condition tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Comparison(Condition),
    Logical(LogicalExpression),
}

impl Expression {
    /// Evaluate this node against a row
    pub fn evaluate(&self, row: &Row) -> Result<bool> {
        match self {
            Expression::Comparison(condition) => condition.evaluate(row),
            Expression::Logical(logical) => logical.evaluate(row),
        }
    }
}

/// `AND`/`OR` combinator over an ordered list of child expressions
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    op: LogicalOp,
    children: Vec<Expression>,
}

/// What opened a scope during parsing; decides attachment and validation
/// rules when the scope closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opener {
    Root,
    Paren,
    Operator,
}

/// An open scope on the parse stack
struct Scope {
    opener: Opener,
    op: LogicalOp,
    children: Vec<Expression>,
}

impl Scope {
    fn new(opener: Opener) -> Self {
        Self {
            opener,
            op: LogicalOp::And,
            children: Vec::new(),
        }
    }

    fn close(self) -> Result<Expression> {
        match self.opener {
            Opener::Operator if self.children.len() < 2 => {
                Err(malformed("operator is missing a right operand"))
            }
            Opener::Paren if self.children.is_empty() => Err(malformed("empty condition group")),
            _ => Ok(Expression::Logical(LogicalExpression {
                op: self.op,
                children: self.children,
            })),
        }
    }
}

fn malformed(reason: impl Into<String>) -> Error {
    Error::Malformed(reason.into())
}

impl LogicalExpression {
    /// Build the condition tree from a WHERE token run
    ///
    /// One pass with an explicit stack of open scopes, seeded with a
    /// default-`AND` root. `(` opens a scope; `AND`/`OR` opens an operator
    /// scope that absorbs the previously attached child as its first
    /// operand; `)` closes scopes down to the nearest `(`; any other token
    /// accumulates into a 3-slot leaf buffer. Mixed `AND`/`OR` at one
    /// nesting level without parentheses is rejected: the grammar defines
    /// no precedence for it.
    pub fn parse(tokens: &[String]) -> Result<Self> {
        let mut stack = vec![Scope::new(Opener::Root)];
        let mut leaf: Vec<&str> = Vec::with_capacity(3);

        for token in tokens {
            if token == "(" {
                if !leaf.is_empty() {
                    return Err(malformed("incomplete condition before '('"));
                }
                stack.push(Scope::new(Opener::Paren));
            } else if token == ")" {
                if !leaf.is_empty() {
                    return Err(malformed("incomplete condition before ')'"));
                }
                loop {
                    if stack.len() == 1 {
                        return Err(malformed("unbalanced parentheses"));
                    }
                    let scope = stack.pop().unwrap();
                    let opener = scope.opener;
                    let expr = scope.close()?;
                    stack.last_mut().unwrap().children.push(expr);
                    if opener == Opener::Paren {
                        break;
                    }
                }
            } else if let Some(op) = LogicalOp::from_token(token) {
                if !leaf.is_empty() {
                    return Err(malformed("incomplete condition before operator"));
                }
                let top = stack.last_mut().unwrap();
                if top.opener == Opener::Operator {
                    if top.op != op {
                        return Err(malformed(
                            "mixed AND/OR at one nesting level requires parentheses",
                        ));
                    }
                    // same operator keeps extending the current scope
                } else {
                    let Some(operand) = top.children.pop() else {
                        return Err(malformed("operator is missing a left operand"));
                    };
                    let mut scope = Scope::new(Opener::Operator);
                    scope.op = op;
                    scope.children.push(operand);
                    stack.push(scope);
                }
            } else {
                leaf.push(token);
                if leaf.len() == 3 {
                    let condition = Condition::new(leaf[0], leaf[1], leaf[2])?;
                    stack
                        .last_mut()
                        .unwrap()
                        .children
                        .push(Expression::Comparison(condition));
                    leaf.clear();
                }
            }
        }

        if !leaf.is_empty() {
            return Err(malformed("incomplete condition"));
        }

        // Fold the still-open operator scopes back into their parents; any
        // remaining paren scope was never closed.
        while stack.len() > 1 {
            let scope = stack.pop().unwrap();
            if scope.opener == Opener::Paren {
                return Err(malformed("unbalanced parentheses"));
            }
            let expr = scope.close()?;
            stack.last_mut().unwrap().children.push(expr);
        }

        let root = stack.pop().unwrap();
        if root.children.is_empty() {
            return Err(malformed("empty condition"));
        }
        Ok(LogicalExpression {
            op: root.op,
            children: root.children,
        })
    }

    /// Evaluate this expression against a row
    ///
    /// Every child is evaluated (no short-circuiting) and the results are
    /// folded with the operator, starting from its identity.
    pub fn evaluate(&self, row: &Row) -> Result<bool> {
        let mut result = self.op.identity();
        for child in &self.children {
            let value = child.evaluate(row)?;
            result = match self.op {
                LogicalOp::And => result && value,
                LogicalOp::Or => result || value,
            };
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        let columns = vec!["name".to_string(), "mark".to_string(), "pass".to_string()];
        Row::new(
            1,
            &columns,
            vec![
                Some("Sam".to_string()),
                Some("70".to_string()),
                Some("TRUE".to_string()),
            ],
        )
    }

    fn parse(where_clause: &[&str]) -> LogicalExpression {
        let tokens: Vec<String> = where_clause.iter().map(|t| t.to_string()).collect();
        LogicalExpression::parse(&tokens).unwrap()
    }

    #[test]
    fn test_string_equality() {
        assert!(parse(&["name", "==", "'Sam'"]).evaluate(&row()).unwrap());
        assert!(!parse(&["name", "==", "'Pam'"]).evaluate(&row()).unwrap());
        assert!(parse(&["name", "!=", "'Pam'"]).evaluate(&row()).unwrap());
    }

    #[test]
    fn test_relational_comparators() {
        let r = row();
        assert!(parse(&["mark", ">=", "70"]).evaluate(&r).unwrap());
        assert!(parse(&["mark", "<=", "70"]).evaluate(&r).unwrap());
        assert!(!parse(&["mark", ">", "70"]).evaluate(&r).unwrap());
        assert!(parse(&["mark", "<", "70.5"]).evaluate(&r).unwrap());
    }

    #[test]
    fn test_non_numeric_operand() {
        let result = parse(&["name", ">", "35"]).evaluate(&row());
        assert!(matches!(result, Err(Error::NonNumericOperand(_))));
    }

    #[test]
    fn test_like_is_substring() {
        assert!(parse(&["name", "LIKE", "'am'"]).evaluate(&row()).unwrap());
        assert!(!parse(&["name", "like", "'amb'"]).evaluate(&row()).unwrap());
    }

    #[test]
    fn test_id_lookup_is_synthesised() {
        assert!(parse(&["id", "==", "1"]).evaluate(&row()).unwrap());
        assert!(parse(&["ID", ">=", "1"]).evaluate(&row()).unwrap());
    }

    #[test]
    fn test_unknown_attribute() {
        let result = parse(&["height", "==", "3"]).evaluate(&row());
        assert!(matches!(result, Err(Error::ColumnNotFound(_))));
    }

    #[test]
    fn test_absent_value_matches_nothing() {
        let columns = vec!["name".to_string(), "mark".to_string()];
        let sparse = Row::new(2, &columns, vec![Some("Pam".to_string())]);
        assert!(!parse(&["mark", "==", "70"]).evaluate(&sparse).unwrap());
        assert!(!parse(&["mark", "!=", "70"]).evaluate(&sparse).unwrap());
    }

    #[test]
    fn test_ungrouped_and() {
        let expr = parse(&["name", "==", "'Sam'", "AND", "mark", ">=", "70"]);
        assert!(expr.evaluate(&row()).unwrap());

        let expr = parse(&["name", "==", "'Pam'", "AND", "mark", ">=", "70"]);
        assert!(!expr.evaluate(&row()).unwrap());
    }

    #[test]
    fn test_grouped_or() {
        let expr = parse(&[
            "(", "name", "==", "'Pam'", ")", "OR", "(", "name", "==", "'Sam'", ")",
        ]);
        assert!(expr.evaluate(&row()).unwrap());

        let expr = parse(&[
            "(", "name", "==", "'Pam'", ")", "OR", "(", "name", "==", "'Tam'", ")",
        ]);
        assert!(!expr.evaluate(&row()).unwrap());
    }

    #[test]
    fn test_nested_grouping() {
        // ((name=='Sam') AND (mark=='70')) OR (pass=='FALSE')
        let expr = parse(&[
            "(", "(", "name", "==", "'Sam'", ")", "AND", "(", "mark", "==", "'70'", ")", ")",
            "OR", "(", "pass", "==", "'FALSE'", ")",
        ]);
        assert!(expr.evaluate(&row()).unwrap());

        // ((name=='Pam') AND (mark=='70')) OR (pass=='TRUE')
        let expr = parse(&[
            "(", "(", "name", "==", "'Pam'", ")", "AND", "(", "mark", "==", "'70'", ")", ")",
            "OR", "(", "pass", "==", "'TRUE'", ")",
        ]);
        assert!(expr.evaluate(&row()).unwrap());

        // ((name=='Pam') AND (mark=='70')) OR (pass=='FALSE')
        let expr = parse(&[
            "(", "(", "name", "==", "'Pam'", ")", "AND", "(", "mark", "==", "'70'", ")", ")",
            "OR", "(", "pass", "==", "'FALSE'", ")",
        ]);
        assert!(!expr.evaluate(&row()).unwrap());
    }

    #[test]
    fn test_mixed_operators_rejected() {
        let tokens: Vec<String> = [
            "name", "==", "'Sam'", "AND", "mark", ">", "35", "OR", "pass", "==", "'TRUE'",
        ]
        .iter()
        .map(|t| t.to_string())
        .collect();
        assert!(matches!(
            LogicalExpression::parse(&tokens),
            Err(Error::Malformed(_))
        ));
    }

    #[test]
    fn test_malformed_runs_rejected() {
        for bad in [
            vec!["name", "=="],
            vec!["AND", "name", "==", "'Sam'"],
            vec!["name", "==", "'Sam'", "AND"],
            vec!["(", "name", "==", "'Sam'"],
            vec!["name", "==", "'Sam'", ")"],
            vec!["(", ")"],
        ] {
            let tokens: Vec<String> = bad.iter().map(|t| t.to_string()).collect();
            assert!(
                LogicalExpression::parse(&tokens).is_err(),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_unknown_comparator() {
        let tokens: Vec<String> = ["name", "=", "'Sam'"].iter().map(|t| t.to_string()).collect();
        assert!(matches!(
            LogicalExpression::parse(&tokens),
            Err(Error::UnknownComparator(_))
        ));
    }
}
