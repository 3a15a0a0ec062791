//! SQLite-backed library store.
//!
//! Lists run against a small round-robin pool of read-only connections; all
//! mutations go through a single guarded write connection. The deletion
//! guards for folders and artists run their reference count and the delete
//! inside one transaction, so a song created concurrently cannot slip in
//! between the check and the delete.

use super::error::LibraryError;
use super::models::*;
use super::query::{build_set_clause, build_where_clause};
use super::schema::LIBRARY_VERSIONED_SCHEMAS;
use super::trait_def::{LibraryResult, LibraryStore};
use crate::sqlite_persistence::BASE_DB_VERSION;
use anyhow::{bail, Context, Result};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub struct SqliteLibraryStore {
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

fn init_schema(conn: &Connection) -> Result<()> {
    let latest_schema = LIBRARY_VERSIONED_SCHEMAS.last().unwrap();

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!(
            "Creating library db schema at version {}",
            latest_schema.version
        );
        latest_schema.create(conn)?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    let expected_version = (BASE_DB_VERSION + latest_schema.version) as i64;
    if db_version != expected_version {
        bail!(
            "Library database has user_version {}, expected {}",
            db_version,
            expected_version
        );
    }
    Ok(())
}

impl SqliteLibraryStore {
    /// Open (and if necessary create) the library database.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    /// * `read_pool_size` - Number of connections for concurrent list operations
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path_ref = db_path.as_ref();
        // The read index is a modulo over the pool, so it must not be empty.
        let read_pool_size = read_pool_size.max(1);

        let write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open library database")?;

        init_schema(&write_conn)?;

        write_conn.pragma_update(None, "journal_mode", "WAL")?;

        let folder_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM folder", [], |r| r.get(0))
            .unwrap_or(0);
        let artist_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM artist", [], |r| r.get(0))
            .unwrap_or(0);
        let song_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM song", [], |r| r.get(0))
            .unwrap_or(0);

        info!(
            "Opened library: {} folders, {} artists, {} songs",
            folder_count, artist_count, song_count
        );

        let mut read_pool = Vec::with_capacity(read_pool_size);
        for _ in 0..read_pool_size {
            let read_conn = Connection::open_with_flags(
                db_path_ref,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_conn.pragma_update(None, "journal_mode", "WAL")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteLibraryStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn parse_folder_row(row: &rusqlite::Row) -> rusqlite::Result<Folder> {
        Ok(Folder {
            number: row.get(0)?,
            title: row.get(1)?,
            theme: row.get(2)?,
            slogan: row.get(3)?,
        })
    }

    fn parse_artist_row(row: &rusqlite::Row) -> rusqlite::Result<Artist> {
        Ok(Artist {
            id: row.get(0)?,
            name: row.get(1)?,
            pseudonym: row.get(2)?,
        })
    }

    fn parse_song_row(row: &rusqlite::Row) -> rusqlite::Result<Song> {
        Ok(Song {
            id: row.get(0)?,
            title: row.get(1)?,
            bpm: row.get(2)?,
            length: row.get(3)?,
            genre: row.get(4)?,
            artist: row.get(5)?,
            folder: row.get(6)?,
            ln: row.get(7)?,
            diff_n: row.get(8)?,
            diff_h: row.get(9)?,
            diff_a: row.get(10)?,
            diff_l: row.get(11)?,
        })
    }

    fn list<T>(
        &self,
        base_select: &str,
        fields: &[(&'static str, Option<&str>)],
        parse_row: fn(&rusqlite::Row) -> rusqlite::Result<T>,
    ) -> LibraryResult<Vec<T>> {
        let read_conn = self.get_read_conn();
        let conn = read_conn.lock().unwrap();

        let (where_clause, values) = build_where_clause(fields);
        let mut sql = base_select.to_string();
        if !where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clause);
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), parse_row)?
            .collect::<Result<Vec<T>, _>>()?;
        Ok(rows)
    }

    fn update(
        &self,
        table: &str,
        key_column: &str,
        key: i64,
        assignments: &[(&'static str, Value)],
        entity: &'static str,
    ) -> LibraryResult<()> {
        let (set_clause, mut values) = build_set_clause(assignments)?;
        values.push(Value::Integer(key));

        let conn = self.write_conn.lock().unwrap();
        let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, key_column);
        let affected = conn.execute(&sql, params_from_iter(values))?;
        if affected == 0 {
            return Err(LibraryError::NotFound(entity));
        }
        Ok(())
    }

    /// Deletes a parent row unless songs still reference it. Count and delete
    /// share one transaction; dropping the transaction on the error path
    /// rolls it back.
    fn delete_guarded(
        &self,
        table: &str,
        key_column: &str,
        reference_column: &str,
        key: i64,
        entity: &'static str,
        pronoun: &'static str,
    ) -> LibraryResult<()> {
        let mut write_conn = self.write_conn.lock().unwrap();
        let tx = write_conn.transaction()?;

        let reference_count: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM song WHERE {} = ?1", reference_column),
            params![key],
            |r| r.get(0),
        )?;
        if reference_count > 0 {
            return Err(LibraryError::StillReferenced { entity, pronoun });
        }

        tx.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", table, key_column),
            params![key],
        )?;
        tx.commit()?;
        Ok(())
    }
}

impl LibraryStore for SqliteLibraryStore {
    fn list_folders(&self, filter: &FolderFilter) -> LibraryResult<Vec<Folder>> {
        self.list(
            "SELECT number, title, theme, slogan FROM folder",
            &filter.fields(),
            Self::parse_folder_row,
        )
    }

    fn create_folder(&self, new: &NewFolder) -> LibraryResult<i64> {
        let number = new
            .number
            .ok_or(LibraryError::MissingRequiredField("number"))?;
        let title = new
            .title
            .as_deref()
            .ok_or(LibraryError::MissingRequiredField("title"))?;

        let conn = self.write_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "INSERT INTO folder (number, title, theme, slogan) VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![number, title, new.theme, new.slogan])?;
        Ok(number)
    }

    fn update_folder(&self, number: i64, patch: &FolderPatch) -> LibraryResult<()> {
        self.update("folder", "number", number, &patch.assignments(), "Folder")
    }

    fn delete_folder(&self, number: i64) -> LibraryResult<()> {
        self.delete_guarded("folder", "number", "folder", number, "Folder", "it has")
    }

    fn list_artists(&self, filter: &ArtistFilter) -> LibraryResult<Vec<Artist>> {
        self.list(
            "SELECT id, name, pseudonym FROM artist",
            &filter.fields(),
            Self::parse_artist_row,
        )
    }

    fn create_artist(&self, new: &NewArtist) -> LibraryResult<i64> {
        let name = new
            .name
            .as_deref()
            .ok_or(LibraryError::MissingRequiredField("name"))?;

        let conn = self.write_conn.lock().unwrap();
        let mut stmt =
            conn.prepare_cached("INSERT INTO artist (name, pseudonym) VALUES (?1, ?2)")?;
        stmt.execute(params![name, new.pseudonym])?;
        Ok(conn.last_insert_rowid())
    }

    fn update_artist(&self, id: i64, patch: &ArtistPatch) -> LibraryResult<()> {
        self.update("artist", "id", id, &patch.assignments(), "Artist")
    }

    fn delete_artist(&self, id: i64) -> LibraryResult<()> {
        self.delete_guarded("artist", "id", "artist", id, "Artist", "they have")
    }

    fn list_songs(&self, filter: &SongFilter) -> LibraryResult<Vec<Song>> {
        self.list(
            "SELECT id, title, bpm, length, genre, artist, folder, ln, diffN, diffH, diffA, diffL FROM song",
            &filter.fields(),
            Self::parse_song_row,
        )
    }

    fn create_song(&self, new: &NewSong) -> LibraryResult<i64> {
        let title = new
            .title
            .as_deref()
            .ok_or(LibraryError::MissingRequiredField("title"))?;

        let conn = self.write_conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "INSERT INTO song (title, bpm, length, genre, artist, folder, ln, diffN, diffH, diffA, diffL)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )?;
        stmt.execute(params![
            title,
            new.bpm,
            new.length,
            new.genre,
            new.artist,
            new.folder,
            new.ln.unwrap_or(0),
            new.diff_n,
            new.diff_h,
            new.diff_a,
            new.diff_l,
        ])?;
        Ok(conn.last_insert_rowid())
    }

    fn update_song(&self, id: i64, patch: &SongPatch) -> LibraryResult<()> {
        self.update("song", "id", id, &patch.assignments(), "Song")
    }

    fn delete_song(&self, id: i64) -> LibraryResult<()> {
        let conn = self.write_conn.lock().unwrap();
        let affected = conn.execute("DELETE FROM song WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(LibraryError::NotFound("Song"));
        }
        Ok(())
    }
}
