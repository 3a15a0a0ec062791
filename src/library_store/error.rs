use thiserror::Error;

/// Errors surfaced by library store operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("No valid fields to update")]
    NoFields,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{entity} cannot be deleted as {pronoun} associated songs")]
    StillReferenced {
        entity: &'static str,
        // "it has" for folders, "they have" for artists.
        pronoun: &'static str,
    },

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),
}
