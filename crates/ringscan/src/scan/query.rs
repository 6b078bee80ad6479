use crate::{
    ring::{RING_MAX, TokenRange},
    session::TableMetadata,
    statement::ParsedQuery,
    value::Value,
};

///
/// ScanQuery
///
/// Caller statement, bind values and the ring range it is confined to.
/// Immutable once an iterator is built from it; kept so the iterator can be
/// rebuilt on reset.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ScanQuery {
    statement: String,
    values: Vec<Value>,
    range: TokenRange,
}

impl ScanQuery {
    #[must_use]
    pub fn new(statement: impl Into<String>, values: Vec<Value>, range: TokenRange) -> Self {
        Self {
            statement: statement.into(),
            values,
            range,
        }
    }

    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub const fn range(&self) -> TokenRange {
        self.range
    }
}

///
/// ResumeMode
///
/// How a checkpointed scan re-enters the ring at its last token.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ResumeMode {
    /// `token >= last`: the last partition may hold unread clustering rows,
    /// so it is read again in full (at-least-once for that partition).
    Inclusive,

    /// `token > last`: one row per token, strict exclusion is exact.
    Exclusive,
}

impl ResumeMode {
    pub(crate) const fn for_table(metadata: &TableMetadata) -> Self {
        if metadata.has_clustering_columns() {
            Self::Inclusive
        } else {
            Self::Exclusive
        }
    }

    const fn operator(self) -> &'static str {
        match self {
            Self::Inclusive => ">=",
            Self::Exclusive => ">",
        }
    }
}

/// Confine `parsed` to `range`, resume it after `last_token`, and project the
/// hidden token column.
///
/// Predicates are added lower bound, upper bound, then resume; since each new
/// predicate is prepended, the resume predicate ends up first. Upper bounds
/// are exclusive except at the ring maximum, which gets no upper predicate.
pub(crate) fn apply_scan_predicates(
    parsed: &mut ParsedQuery,
    metadata: &TableMetadata,
    range: TokenRange,
    last_token: Option<i64>,
) {
    let token = metadata.token_expr();

    if let Some(from) = range.from() {
        parsed.add_where(&format!("{token} >= {from}"));
    }
    // A range ending at the ring maximum includes it; `< MAX` would drop
    // rows whose token is exactly `i64::MAX`.
    if let Some(to) = range.to().filter(|&to| to != RING_MAX) {
        parsed.add_where(&format!("{token} < {to}"));
    }
    if let Some(last) = last_token {
        let op = ResumeMode::for_table(metadata).operator();
        parsed.add_where(&format!("{token} {op} {last}"));
    }

    parsed.append_column(&token);
}
