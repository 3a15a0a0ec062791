use super::error::LibraryError;
use super::models::*;

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Storage interface for the three library entities.
///
/// One list/create/update/delete family per entity; handlers depend on this
/// trait so tests can substitute the SQLite implementation.
pub trait LibraryStore: Send + Sync {
    fn list_folders(&self, filter: &FolderFilter) -> LibraryResult<Vec<Folder>>;
    /// Returns the folder's natural key (`number`).
    fn create_folder(&self, new: &NewFolder) -> LibraryResult<i64>;
    fn update_folder(&self, number: i64, patch: &FolderPatch) -> LibraryResult<()>;
    /// Fails with [`LibraryError::StillReferenced`] while songs point at the folder.
    fn delete_folder(&self, number: i64) -> LibraryResult<()>;

    fn list_artists(&self, filter: &ArtistFilter) -> LibraryResult<Vec<Artist>>;
    /// Returns the generated artist id.
    fn create_artist(&self, new: &NewArtist) -> LibraryResult<i64>;
    fn update_artist(&self, id: i64, patch: &ArtistPatch) -> LibraryResult<()>;
    /// Fails with [`LibraryError::StillReferenced`] while songs point at the artist.
    fn delete_artist(&self, id: i64) -> LibraryResult<()>;

    fn list_songs(&self, filter: &SongFilter) -> LibraryResult<Vec<Song>>;
    /// Returns the generated song id.
    fn create_song(&self, new: &NewSong) -> LibraryResult<i64>;
    fn update_song(&self, id: i64, patch: &SongPatch) -> LibraryResult<()>;
    fn delete_song(&self, id: i64) -> LibraryResult<()>;
}
