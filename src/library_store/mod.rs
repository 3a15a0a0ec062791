mod error;
mod models;
mod query;
mod schema;
mod store;
mod trait_def;

pub use error::LibraryError;
pub use models::*;
pub use schema::LIBRARY_VERSIONED_SCHEMAS;
pub use store::SqliteLibraryStore;
pub use trait_def::{LibraryResult, LibraryStore};
