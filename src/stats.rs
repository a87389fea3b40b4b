//! Mood statistics over a library.

use crate::types::LibraryRecord;
use std::collections::BTreeMap;

/// Aggregates shown by the stats view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LibraryStats {
    pub total_books: usize,
    /// Books per mood colour. Records without a colour are not counted.
    pub mood_counts: BTreeMap<String, usize>,
    /// Books per emotion tag.
    pub emotion_counts: BTreeMap<String, usize>,
}

impl LibraryStats {
    pub fn from_records(records: &[LibraryRecord]) -> Self {
        let mut stats = LibraryStats {
            total_books: records.len(),
            ..Default::default()
        };

        for record in records {
            let color = record.mood_color.trim();
            if !color.is_empty() {
                *stats.mood_counts.entry(color.to_string()).or_default() += 1;
            }
            for emotion in &record.emotions {
                *stats.emotion_counts.entry(emotion.clone()).or_default() += 1;
            }
        }

        stats
    }

    pub fn distinct_moods(&self) -> usize {
        self.mood_counts.len()
    }

    /// Mood colours, most frequent first (ties by colour).
    pub fn moods_by_frequency(&self) -> Vec<(&str, usize)> {
        let mut moods: Vec<_> = self
            .mood_counts
            .iter()
            .map(|(color, count)| (color.as_str(), *count))
            .collect();
        moods.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        moods
    }

    pub fn top_emotion(&self) -> Option<&str> {
        self.emotion_counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(emotion, _)| emotion.as_str())
    }
}
