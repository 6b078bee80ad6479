use crate::{error::InternalError, value::Value};
use derive_more::{Deref, DerefMut};

///
/// Row
///
/// One row as projected by the caller's statement; the hidden token column
/// has already been stripped.
///

#[derive(Clone, Debug, Deref, DerefMut, PartialEq)]
pub struct Row(Vec<Value>);

impl Row {
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    /// Split a raw row into caller columns and its ring token.
    pub(crate) fn from_raw(mut values: Vec<Value>) -> Result<(Self, i64), InternalError> {
        let token = match values.pop() {
            Some(Value::Int(token)) => token,
            Some(other) => {
                return Err(InternalError::scan_corruption(format!(
                    "hidden token column must be int, found {}",
                    other.kind()
                )));
            }
            None => {
                return Err(InternalError::scan_corruption(
                    "row is missing the hidden token column",
                ));
            }
        };

        Ok((Self(values), token))
    }
}

impl From<Row> for Vec<Value> {
    fn from(row: Row) -> Self {
        row.0
    }
}
