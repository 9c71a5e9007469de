//! Database-specific error types and conversions.

use toollink_core::error::ToolLinkError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Row decode failed: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique constraint violated on {field}")]
    Duplicate { field: String },
}

impl From<DbError> for ToolLinkError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ToolLinkError::NotFound { entity, id },
            DbError::Duplicate { field } => ToolLinkError::DuplicateIdentity { field },
            other => ToolLinkError::Database(other.to_string()),
        }
    }
}

/// Map a unique-index violation onto the colliding field name, using
/// the index names defined in the schema. Anything else passes
/// through unchanged.
pub(crate) fn map_unique_violation(err: surrealdb::Error, indexes: &[(&str, &str)]) -> DbError {
    let msg = err.to_string();
    for (index, field) in indexes {
        if msg.contains(index) {
            return DbError::Duplicate {
                field: (*field).to_string(),
            };
        }
    }
    DbError::Surreal(err)
}
