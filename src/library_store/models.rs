//! Row, filter, create and patch types for the three library entities.
//!
//! Filters hold every recognized query parameter as an optional string and
//! expose a static ordered field list for the WHERE-clause builder. Patch
//! types distinguish "key absent" (leave the column alone) from "key present
//! with null" (clear the column) via a double `Option` on nullable columns.

use rusqlite::types::Value;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserializes a present-but-possibly-null JSON value into `Some(inner)`,
/// so that an absent key (field default) stays distinguishable as `None`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn text_value(v: &Option<String>) -> Value {
    match v {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

fn int_value(v: &Option<i64>) -> Value {
    match v {
        Some(i) => Value::Integer(*i),
        None => Value::Null,
    }
}

// =============================================================================
// Folder
// =============================================================================

/// A release pack, keyed by its natural `number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub number: i64,
    pub title: String,
    pub theme: Option<String>,
    pub slogan: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FolderFilter {
    pub number: Option<String>,
    pub title: Option<String>,
    pub theme: Option<String>,
    pub slogan: Option<String>,
}

impl FolderFilter {
    /// Recognized filter columns, in WHERE-clause order.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("number", self.number.as_deref()),
            ("title", self.title.as_deref()),
            ("theme", self.theme.as_deref()),
            ("slogan", self.slogan.as_deref()),
        ]
    }
}

/// Create payload. Required fields are still optional here so that their
/// absence surfaces as [`MissingRequiredField`](super::LibraryError) instead
/// of a deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct NewFolder {
    pub number: Option<i64>,
    pub title: Option<String>,
    pub theme: Option<String>,
    pub slogan: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FolderPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub theme: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub slogan: Option<Option<String>>,
}

impl FolderPatch {
    /// Assignments for the fields present in the patch, in SET-clause order.
    pub fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        if let Some(title) = &self.title {
            out.push(("title", Value::Text(title.clone())));
        }
        if let Some(theme) = &self.theme {
            out.push(("theme", text_value(theme)));
        }
        if let Some(slogan) = &self.slogan {
            out.push(("slogan", text_value(slogan)));
        }
        out
    }
}

// =============================================================================
// Artist
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub pseudonym: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArtistFilter {
    pub id: Option<String>,
    pub name: Option<String>,
    pub pseudonym: Option<String>,
}

impl ArtistFilter {
    pub fn fields(&self) -> [(&'static str, Option<&str>); 3] {
        [
            ("id", self.id.as_deref()),
            ("name", self.name.as_deref()),
            ("pseudonym", self.pseudonym.as_deref()),
        ]
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NewArtist {
    pub name: Option<String>,
    pub pseudonym: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArtistPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub pseudonym: Option<Option<String>>,
}

impl ArtistPatch {
    pub fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        if let Some(name) = &self.name {
            out.push(("name", Value::Text(name.clone())));
        }
        if let Some(pseudonym) = &self.pseudonym {
            out.push(("pseudonym", text_value(pseudonym)));
        }
        out
    }
}

// =============================================================================
// Song
// =============================================================================

/// A chart entry. `artist` and `folder` reference `Artist.id` and
/// `Folder.number`; the references are enforced on parent deletion, not on
/// insert. `diffN`/`diffH`/`diffA`/`diffL` are the per-tier difficulty
/// ratings (Normal/Hyper/Another/Leggendaria).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub bpm: Option<i64>,
    pub length: Option<i64>,
    pub genre: Option<String>,
    pub artist: Option<i64>,
    pub folder: Option<i64>,
    pub ln: i64,
    #[serde(rename = "diffN")]
    pub diff_n: Option<i64>,
    #[serde(rename = "diffH")]
    pub diff_h: Option<i64>,
    #[serde(rename = "diffA")]
    pub diff_a: Option<i64>,
    #[serde(rename = "diffL")]
    pub diff_l: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SongFilter {
    pub id: Option<String>,
    pub title: Option<String>,
    pub bpm: Option<String>,
    pub length: Option<String>,
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub folder: Option<String>,
    pub ln: Option<String>,
    #[serde(rename = "diffN")]
    pub diff_n: Option<String>,
    #[serde(rename = "diffH")]
    pub diff_h: Option<String>,
    #[serde(rename = "diffA")]
    pub diff_a: Option<String>,
    #[serde(rename = "diffL")]
    pub diff_l: Option<String>,
}

impl SongFilter {
    pub fn fields(&self) -> [(&'static str, Option<&str>); 12] {
        [
            ("id", self.id.as_deref()),
            ("title", self.title.as_deref()),
            ("bpm", self.bpm.as_deref()),
            ("length", self.length.as_deref()),
            ("genre", self.genre.as_deref()),
            ("artist", self.artist.as_deref()),
            ("folder", self.folder.as_deref()),
            ("ln", self.ln.as_deref()),
            ("diffN", self.diff_n.as_deref()),
            ("diffH", self.diff_h.as_deref()),
            ("diffA", self.diff_a.as_deref()),
            ("diffL", self.diff_l.as_deref()),
        ]
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NewSong {
    pub title: Option<String>,
    pub bpm: Option<i64>,
    pub length: Option<i64>,
    pub genre: Option<String>,
    pub artist: Option<i64>,
    pub folder: Option<i64>,
    pub ln: Option<i64>,
    #[serde(rename = "diffN")]
    pub diff_n: Option<i64>,
    #[serde(rename = "diffH")]
    pub diff_h: Option<i64>,
    #[serde(rename = "diffA")]
    pub diff_a: Option<i64>,
    #[serde(rename = "diffL")]
    pub diff_l: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SongPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub bpm: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub length: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub genre: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub artist: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub folder: Option<Option<i64>>,
    // ln is NOT NULL in the schema, so an explicit null is not accepted here.
    pub ln: Option<i64>,
    #[serde(rename = "diffN", default, deserialize_with = "double_option")]
    pub diff_n: Option<Option<i64>>,
    #[serde(rename = "diffH", default, deserialize_with = "double_option")]
    pub diff_h: Option<Option<i64>>,
    #[serde(rename = "diffA", default, deserialize_with = "double_option")]
    pub diff_a: Option<Option<i64>>,
    #[serde(rename = "diffL", default, deserialize_with = "double_option")]
    pub diff_l: Option<Option<i64>>,
}

impl SongPatch {
    pub fn assignments(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        if let Some(title) = &self.title {
            out.push(("title", Value::Text(title.clone())));
        }
        if let Some(bpm) = &self.bpm {
            out.push(("bpm", int_value(bpm)));
        }
        if let Some(length) = &self.length {
            out.push(("length", int_value(length)));
        }
        if let Some(genre) = &self.genre {
            out.push(("genre", text_value(genre)));
        }
        if let Some(artist) = &self.artist {
            out.push(("artist", int_value(artist)));
        }
        if let Some(folder) = &self.folder {
            out.push(("folder", int_value(folder)));
        }
        if let Some(ln) = self.ln {
            out.push(("ln", Value::Integer(ln)));
        }
        if let Some(diff_n) = &self.diff_n {
            out.push(("diffN", int_value(diff_n)));
        }
        if let Some(diff_h) = &self.diff_h {
            out.push(("diffH", int_value(diff_h)));
        }
        if let Some(diff_a) = &self.diff_a {
            out.push(("diffA", int_value(diff_a)));
        }
        if let Some(diff_l) = &self.diff_l {
            out.push(("diffL", int_value(diff_l)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_distinguishes_absent_from_explicit_null() {
        let patch: FolderPatch = serde_json::from_str(r#"{"theme": null}"#).unwrap();
        assert_eq!(patch.theme, Some(None));
        assert_eq!(patch.slogan, None);

        let assignments = patch.assignments();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].0, "theme");
        assert_eq!(assignments[0].1, Value::Null);
    }

    #[test]
    fn patch_assignments_preserve_declaration_order() {
        let patch: SongPatch =
            serde_json::from_str(r#"{"diffA": 12, "title": "Chart", "bpm": 180}"#).unwrap();
        let columns: Vec<&str> = patch.assignments().iter().map(|(c, _)| *c).collect();
        assert_eq!(columns, vec!["title", "bpm", "diffA"]);
    }

    #[test]
    fn filter_fields_expose_every_recognized_column() {
        let filter = SongFilter::default();
        assert_eq!(filter.fields().len(), 12);
        assert!(filter.fields().iter().all(|(_, v)| v.is_none()));
    }
}
