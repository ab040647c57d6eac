///! Core data types for the snapshot cycle

use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the two independent external data providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Posts,
    Likes,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Posts, Source::Likes];

    pub fn name(&self) -> &'static str {
        match self {
            Source::Posts => "posts",
            Source::Likes => "likes",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-cycle completion flags, owned exclusively by the orchestrator.
///
/// The completion path runs exactly once per transition into
/// both-received while the retry timer is armed; a successful persistence
/// resets the whole state to default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleState {
    pub posts_received: bool,
    pub likes_received: bool,
    pub retry_timer_active: bool,
}

impl CycleState {
    pub fn received(&self, source: Source) -> bool {
        match source {
            Source::Posts => self.posts_received,
            Source::Likes => self.likes_received,
        }
    }

    pub fn mark_received(&mut self, source: Source) {
        match source {
            Source::Posts => self.posts_received = true,
            Source::Likes => self.likes_received = true,
        }
    }

    pub fn all_received(&self) -> bool {
        self.posts_received && self.likes_received
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Displayable summary of one completed cycle. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub date: String,
    pub time: String,
    pub id: Uuid,
}

impl Record {
    /// Build a record from the current wall clock and a fresh random id.
    pub fn build() -> Self {
        let now = Utc::now();
        Self {
            date: now.format("%a %b %d %Y").to_string(),
            time: now.format("%H:%M:%S UTC").to_string(),
            id: Uuid::new_v4(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names_render_lowercase() {
        assert_eq!(Source::Posts.to_string(), "posts");
        assert_eq!(Source::Likes.to_string(), "likes");
    }

    #[test]
    fn cycle_state_tracks_per_source_flags() {
        let mut state = CycleState::default();
        assert!(!state.all_received());

        state.mark_received(Source::Likes);
        assert!(state.received(Source::Likes));
        assert!(!state.received(Source::Posts));
        assert!(!state.all_received());

        state.mark_received(Source::Posts);
        assert!(state.all_received());

        state.reset();
        assert_eq!(state, CycleState::default());
    }

    #[test]
    fn built_records_have_distinct_ids() {
        let a = Record::build();
        let b = Record::build();
        assert_ne!(a.id, b.id);
        assert!(!a.date.is_empty());
        assert!(!a.time.is_empty());
    }

    #[test]
    fn record_serde_round_trip() {
        let record = Record::build();
        let json = serde_json::to_string(&record).unwrap();
        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
