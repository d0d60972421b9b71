//! Background vocabulary fetches
//!
//! WaniKani progress takes several paginated requests. The REPL starts a
//! fetch and keeps ticking the reveal; the snapshot arrives through the
//! `select!` loop when it is ready.

use tokio::sync::mpsc;
use tracing::warn;

use kaiwa_core::{VocabularySnapshot, VocabularySource, WaniKaniSource};

/// A vocabulary fetch that may still be in flight
pub struct VocabularyFetch {
    pub rx: mpsc::Receiver<VocabularySnapshot>,
    pub pending: bool,
}

impl VocabularyFetch {
    /// No fetch running
    pub fn idle() -> Self {
        Self {
            rx: mpsc::channel(1).1,
            pending: false,
        }
    }

    /// Fetch from `source` on a background task
    pub fn start(source: impl VocabularySource + 'static) -> Self {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            let _ = tx.send(source.fetch().await).await;
        });
        Self { rx, pending: true }
    }

    /// Fetch WaniKani progress for `api_key`
    ///
    /// A client that cannot be built yields an unavailable snapshot instead
    /// of an error.
    pub fn wanikani(api_key: String) -> Self {
        match WaniKaniSource::new(api_key) {
            Ok(source) => Self::start(source),
            Err(e) => {
                warn!(error = %e, "Could not create WaniKani client");
                let (tx, rx) = mpsc::channel(1);
                let _ = tx.try_send(VocabularySnapshot::unavailable());
                Self { rx, pending: true }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaiwa_core::StaticVocabulary;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_idle_fetch_is_not_pending() {
        let fetch = VocabularyFetch::idle();
        assert!(!fetch.pending);
    }

    #[tokio::test]
    async fn test_started_fetch_delivers_snapshot() {
        let snapshot = VocabularySnapshot::new(12, vec!["勉強".to_string()]);
        let mut fetch = VocabularyFetch::start(StaticVocabulary::new(snapshot.clone()));

        assert!(fetch.pending);
        assert_eq!(fetch.rx.recv().await, Some(snapshot));
    }
}
