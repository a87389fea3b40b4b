//! Core types for the reading library.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Mood colour used when the reader has not picked one.
pub const DEFAULT_MOOD_COLOR: &str = "#FFB6C1";

/// Emotion tags offered when annotating a book.
pub const EMOTION_OPTIONS: [&str; 8] = [
    "Happy",
    "Sad",
    "Inspired",
    "Thoughtful",
    "Excited",
    "Nostalgic",
    "Relaxed",
    "Motivated",
];

/// Normalized profile of the signed-in user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Opaque, stable per account.
    pub id: String,
    pub display_name: String,
    pub email: String,
}

/// Identifier of a library record.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or_default();
        Timestamp(micros)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Catalog metadata for a book, as returned by a search provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
}

/// The reader's subjective annotation of a book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodAnnotation {
    pub mood_color: String,
    pub emotions: BTreeSet<String>,
    pub notes: String,
}

impl Default for MoodAnnotation {
    fn default() -> Self {
        Self {
            mood_color: DEFAULT_MOOD_COLOR.to_string(),
            emotions: BTreeSet::new(),
            notes: String::new(),
        }
    }
}

impl MoodAnnotation {
    /// Add the emotion if absent, remove it if present.
    pub fn toggle_emotion(&mut self, emotion: &str) {
        if !self.emotions.remove(emotion) {
            self.emotions.insert(emotion.to_string());
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.mood_color = color.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Payload written to the remote store (before an id is assigned).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub owner_id: String,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub mood_color: String,
    #[serde(default)]
    pub emotions: BTreeSet<String>,
    #[serde(default)]
    pub notes: String,
    pub date_added: Timestamp,
}

impl NewRecord {
    /// Combine book metadata and a mood annotation for `owner_id`.
    pub fn new(
        owner_id: impl Into<String>,
        book: &BookSummary,
        mood: MoodAnnotation,
        date_added: Timestamp,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            title: book.title.clone(),
            author: book.author.clone(),
            cover_url: book.cover_url.clone(),
            mood_color: mood.mood_color,
            emotions: mood.emotions,
            notes: mood.notes,
            date_added,
        }
    }

    /// Attach the id the store assigned.
    pub fn into_record(self, id: RecordId) -> LibraryRecord {
        LibraryRecord {
            id,
            owner_id: self.owner_id,
            title: self.title,
            author: self.author,
            cover_url: self.cover_url,
            mood_color: self.mood_color,
            emotions: self.emotions,
            notes: self.notes,
            date_added: self.date_added,
        }
    }
}

/// A book in a user's library.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryRecord {
    pub id: RecordId,
    pub owner_id: String,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    pub mood_color: String,
    #[serde(default)]
    pub emotions: BTreeSet<String>,
    #[serde(default)]
    pub notes: String,
    pub date_added: Timestamp,
}

/// Sort records newest first. The sort is stable, so equal timestamps keep
/// their incoming order.
pub fn sort_newest_first(records: &mut [LibraryRecord]) {
    records.sort_by(|a, b| b.date_added.cmp(&a.date_added));
}
