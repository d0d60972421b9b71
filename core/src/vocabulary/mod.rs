//! Vocabulary Progress
//!
//! Where the learner stands: a level and the words still being learned. The
//! prompt composer uses both to pitch replies at the right difficulty.
//!
//! Sources never fail outward. When progress cannot be fetched they return
//! [`VocabularySnapshot::unavailable`] and the vocabulary clause is left out
//! of the prompt.

mod wanikani;

pub use wanikani::{WaniKaniSource, WANIKANI_API_BASE};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::prompt::UNKNOWN_LEVEL;

/// Learner progress at a point in time
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularySnapshot {
    /// Level, or `-1` when unknown
    pub level: i32,
    /// Words still being learned
    pub in_progress: Vec<String>,
}

impl Default for VocabularySnapshot {
    fn default() -> Self {
        Self::unavailable()
    }
}

impl VocabularySnapshot {
    /// Snapshot with known progress
    #[must_use]
    pub fn new(level: i32, in_progress: Vec<String>) -> Self {
        Self { level, in_progress }
    }

    /// No progress information
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            level: UNKNOWN_LEVEL,
            in_progress: Vec::new(),
        }
    }

    /// Whether the level is known
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.level != UNKNOWN_LEVEL
    }
}

/// Provider of learner progress
#[async_trait]
pub trait VocabularySource: Send + Sync {
    /// Source name for logs
    fn name(&self) -> &str;

    /// Fetch the current snapshot
    async fn fetch(&self) -> VocabularySnapshot;
}

/// Fixed progress, for tests and offline use
#[derive(Clone, Debug, Default)]
pub struct StaticVocabulary {
    snapshot: VocabularySnapshot,
}

impl StaticVocabulary {
    /// Always return `snapshot`
    #[must_use]
    pub fn new(snapshot: VocabularySnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl VocabularySource for StaticVocabulary {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self) -> VocabularySnapshot {
        self.snapshot.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable() {
        let snapshot = VocabularySnapshot::default();
        assert_eq!(snapshot.level, -1);
        assert!(!snapshot.is_available());
        assert!(VocabularySnapshot::new(0, Vec::new()).is_available());
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticVocabulary::new(VocabularySnapshot::new(7, vec!["猫".to_string()]));
        let snapshot = source.fetch().await;
        assert_eq!(snapshot.level, 7);
        assert_eq!(snapshot.in_progress, vec!["猫".to_string()]);
    }
}
