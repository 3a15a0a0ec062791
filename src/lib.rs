//! Rhythm Library Server
//!
//! Catalog management for a rhythm-game music library: folders (release
//! packs), artists and songs, served over HTTP for the desktop client.
//! This library exposes the internal modules for the integration tests.

pub mod library_store;
pub mod server;
pub mod sqlite_persistence;

pub use library_store::{LibraryError, LibraryStore, SqliteLibraryStore};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
