//! Restricted SELECT parsing and rewriting.
//!
//! Accepted grammar: `SELECT <columns> FROM <keyspace>.<table> [WHERE <predicates>]`
//! with case-insensitive keywords. Caller text is kept verbatim; the rewriter
//! only ever prepends predicates and appends projected expressions.

mod lexer;

use lexer::{Lexer, Token, TokenKind};
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

///
/// SyntaxError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SyntaxError {
    #[error("query should start with SELECT: {statement}")]
    MissingSelect { statement: String },

    #[error("invalid statement, should contain FROM: {statement}")]
    MissingFrom { statement: String },

    #[error("invalid statement, should select at least one column: {statement}")]
    MissingProjection { statement: String },

    #[error("invalid statement, should contain keyspace after FROM: {statement}")]
    MissingKeyspace { statement: String },

    #[error("invalid statement, should contain keyspace.table: {statement}")]
    MissingSeparator { statement: String },

    #[error("invalid statement, should contain table after keyspace: {statement}")]
    MissingTable { statement: String },

    #[error("invalid statement, should contain something after WHERE: {statement}")]
    EmptyWhere { statement: String },
}

///
/// ParsedQuery
///
/// `SELECT <projection> FROM <keyspace>.<table> [WHERE] <remainder>`
///
/// `remainder` is everything after WHERE, or everything after the target
/// table when there is no WHERE, in original order. `has_where` never goes
/// back to false once set.
///
/// `keyspace` and `table` are the names as the database sees them (quotes
/// and `""` escapes removed); `target` is the `<keyspace>.<table>` text as
/// written, which is what gets rendered.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParsedQuery {
    projection: String,
    keyspace: String,
    table: String,
    target: String,
    has_where: bool,
    remainder: String,
}

impl ParsedQuery {
    /// Parse a restricted SELECT statement.
    pub fn parse(statement: &str) -> Result<Self, SyntaxError> {
        let err_statement = || statement.to_string();
        let mut tokens = Lexer::new(statement);

        let select = tokens
            .next()
            .filter(|t| t.is_keyword("select"))
            .ok_or_else(|| SyntaxError::MissingSelect {
                statement: err_statement(),
            })?;
        let projection_start = select.start + select.text.len();

        let from = tokens
            .find(|t| t.is_keyword("from"))
            .ok_or_else(|| SyntaxError::MissingFrom {
                statement: err_statement(),
            })?;

        let projection = statement[projection_start..from.start].trim();
        if projection.is_empty() {
            return Err(SyntaxError::MissingProjection {
                statement: err_statement(),
            });
        }

        let keyspace = tokens
            .next()
            .filter(is_named_ident)
            .ok_or_else(|| SyntaxError::MissingKeyspace {
                statement: err_statement(),
            })?;

        tokens
            .next()
            .filter(|t| t.is_punct('.'))
            .ok_or_else(|| SyntaxError::MissingSeparator {
                statement: err_statement(),
            })?;

        let table = tokens
            .next()
            .filter(is_named_ident)
            .ok_or_else(|| SyntaxError::MissingTable {
                statement: err_statement(),
            })?;

        let mut query = Self {
            projection: projection.to_string(),
            keyspace: identifier_name(&keyspace),
            table: identifier_name(&table),
            target: statement[keyspace.start..table.start + table.text.len()].to_string(),
            has_where: false,
            remainder: String::new(),
        };

        let Some(mut next) = tokens.next() else {
            return Ok(query);
        };

        if next.is_keyword("where") {
            query.has_where = true;
            next = tokens.next().ok_or_else(|| SyntaxError::EmptyWhere {
                statement: err_statement(),
            })?;
        }

        query.remainder = statement[next.start..].trim_end().to_string();

        Ok(query)
    }

    #[must_use]
    pub fn projection(&self) -> &str {
        &self.projection
    }

    #[must_use]
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub const fn has_where(&self) -> bool {
        self.has_where
    }

    #[must_use]
    pub fn remainder(&self) -> &str {
        &self.remainder
    }

    /// Prepend a predicate to the WHERE list.
    ///
    /// The most recently added clause always comes first: when a WHERE list
    /// exists the clause is ANDed in front of it, otherwise it becomes the
    /// first predicate and any trailing text (LIMIT, ALLOW FILTERING, ...)
    /// follows it.
    pub fn add_where(&mut self, clause: &str) {
        self.remainder = if self.has_where {
            format!("{clause} AND {}", self.remainder)
        } else if self.remainder.is_empty() {
            clause.to_string()
        } else {
            format!("{clause} {}", self.remainder)
        };
        self.has_where = true;
    }

    /// Append one projected expression after the caller's columns.
    pub fn append_column(&mut self, expr: &str) {
        self.projection.push_str(", ");
        self.projection.push_str(expr);
    }
}

fn is_named_ident(token: &Token<'_>) -> bool {
    token.is_ident() && !identifier_name(token).is_empty()
}

// Quoted names lose their quotes and `""` escapes; bare names are kept as
// written.
fn identifier_name(token: &Token<'_>) -> String {
    if token.kind != TokenKind::QuotedIdent {
        return token.text.to_string();
    }

    let inner = token.text.strip_prefix('"').unwrap_or(token.text);
    let inner = inner.strip_suffix('"').unwrap_or(inner);

    inner.replace("\"\"", "\"")
}

impl FromStr for ParsedQuery {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ParsedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SELECT {} FROM {}",
            self.projection, self.target
        )?;

        if self.has_where {
            write!(f, " WHERE {}", self.remainder)
        } else if self.remainder.is_empty() {
            Ok(())
        } else {
            write!(f, " {}", self.remainder)
        }
    }
}
