//! SQLite schema for the library database.
//!
//! `song.artist` and `song.folder` are plain integer columns, not declared
//! foreign keys: parent deletion is guarded at the store layer inside a
//! transaction, while inserting a song with an unresolved reference stays
//! permitted.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const FOLDER_TABLE_V1: Table = Table {
    name: "folder",
    columns: &[
        sqlite_column!("number", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("theme", &SqlType::Text),
        sqlite_column!("slogan", &SqlType::Text),
    ],
    indices: &[],
};

const ARTIST_TABLE_V1: Table = Table {
    name: "artist",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("pseudonym", &SqlType::Text),
    ],
    indices: &[],
};

const SONG_TABLE_V1: Table = Table {
    name: "song",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("bpm", &SqlType::Integer),
        sqlite_column!("length", &SqlType::Integer),
        sqlite_column!("genre", &SqlType::Text),
        sqlite_column!("artist", &SqlType::Integer),
        sqlite_column!("folder", &SqlType::Integer),
        sqlite_column!("ln", &SqlType::Integer, non_null = true, default_value = Some("0")),
        sqlite_column!("diffN", &SqlType::Integer),
        sqlite_column!("diffH", &SqlType::Integer),
        sqlite_column!("diffA", &SqlType::Integer),
        sqlite_column!("diffL", &SqlType::Integer),
    ],
    // The deletion guards count songs by parent key on every delete.
    indices: &[
        ("idx_song_artist", "artist"),
        ("idx_song_folder", "folder"),
    ],
};

pub const LIBRARY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[FOLDER_TABLE_V1, ARTIST_TABLE_V1, SONG_TABLE_V1],
    migration: None,
}];
