use thiserror::Error;

/// Errors surfaced by the store accessors.
///
/// Not-found lookups are deliberately NOT an error: `get_by_id` returns
/// `Ok(None)` and delete/update return `Ok(false)` when no document matched.
/// Callers inspect the payload, not the status.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The supplied identifier is not a valid document id
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// The submitted body could not be stored as a document
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The store did not answer within the configured deadline
    #[error("Store operation timed out after {0} seconds")]
    Timeout(u64),

    /// Any other failure from the underlying database
    #[error("Database error: {0}")]
    Database(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}
