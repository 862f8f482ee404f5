//! Repository layer — entity-scoped database operations.
//!
//! Every prescription query that can expose or destroy a record takes the
//! owner and folds it into the `WHERE` clause.

mod prescription;
mod user;

pub use prescription::*;
pub use user::*;

use rusqlite::types::Type;
use uuid::Uuid;

/// Parse a TEXT uuid column inside a row-mapping closure.
pub(crate) fn uuid_column(value: String, index: usize) -> Result<Uuid, rusqlite::Error> {
    Uuid::parse_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e)))
}
