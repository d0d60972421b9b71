//! Morphological Tokenizer Boundary
//!
//! The annotator never depends on a concrete tokenizer. It sees the
//! [`Tokenizer`] trait through a [`TokenizerHandle`], a shared slot that is
//! empty until asynchronous initialization finishes.
//!
//! # Lifecycle
//!
//! ```text
//! Pending ──install──▶ Ready
//!    │
//!    └────fail───────▶ Failed   (permanent for the session, no retry)
//! ```
//!
//! While the handle is `Pending` or `Failed`, [`crate::furigana`] renders
//! lines as plain text.
//!
//! Two implementations ship with the crate: [`IpadicTokenizer`], the default,
//! backed by lindera's embedded IPADIC dictionary, and [`LexiconTokenizer`],
//! which replaces it when the user supplies their own reading dictionary.

mod ipadic;
mod lexicon;

pub use ipadic::IpadicTokenizer;
pub use lexicon::LexiconTokenizer;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;

/// One morphological unit of a line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The exact substring of the input this token covers
    pub surface_form: String,
    /// Phonetic reading in katakana, if the tokenizer knows one
    pub reading: Option<String>,
}

impl Token {
    /// Token with a known reading
    pub fn with_reading(surface_form: impl Into<String>, reading: impl Into<String>) -> Self {
        Self {
            surface_form: surface_form.into(),
            reading: Some(reading.into()),
        }
    }

    /// Token without a reading
    pub fn plain(surface_form: impl Into<String>) -> Self {
        Self {
            surface_form: surface_form.into(),
            reading: None,
        }
    }
}

/// A morphological tokenizer
///
/// Implementations must cover the input contiguously and in order:
/// concatenating every `surface_form` has to reproduce the input.
pub trait Tokenizer: Send + Sync {
    /// Split `text` into tokens
    fn tokenize(&self, text: &str) -> Vec<Token>;
}

/// Errors raised while building a tokenizer
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// The dictionary file could not be read
    #[error("Failed to read dictionary at {path}: {source}")]
    Read {
        /// Path that was attempted
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// A dictionary line was not `surface<TAB>reading`
    #[error("Malformed dictionary entry on line {line}: {content:?}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// The offending line
        content: String,
    },

    /// The dictionary had no usable entries
    #[error("Dictionary is empty")]
    Empty,

    /// The embedded morphological dictionary failed to load
    #[error("Failed to load embedded dictionary: {0}")]
    Dictionary(String),

    /// The loader task panicked or was cancelled
    #[error("Tokenizer initialization aborted: {0}")]
    Aborted(String),
}

/// Initialization status of a [`TokenizerHandle`]
#[derive(Clone, Default)]
pub enum TokenizerStatus {
    /// Initialization has not completed yet
    #[default]
    Pending,
    /// Tokenizer is available
    Ready(Arc<dyn Tokenizer>),
    /// Initialization failed; annotation stays in fallback mode
    Failed(String),
}

impl std::fmt::Debug for TokenizerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Ready(_) => write!(f, "Ready"),
            Self::Failed(reason) => write!(f, "Failed({reason})"),
        }
    }
}

/// Shared, late-initialized tokenizer slot
#[derive(Clone, Debug, Default)]
pub struct TokenizerHandle {
    inner: Arc<RwLock<TokenizerStatus>>,
}

impl TokenizerHandle {
    /// Create an empty (pending) handle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle that is ready immediately
    pub fn ready(tokenizer: impl Tokenizer + 'static) -> Self {
        let handle = Self::new();
        handle.install(Arc::new(tokenizer));
        handle
    }

    /// Install a tokenizer
    ///
    /// Ignored if initialization already failed: a failed session stays in
    /// fallback mode.
    pub fn install(&self, tokenizer: Arc<dyn Tokenizer>) {
        let mut status = self.inner.write();
        if let TokenizerStatus::Failed(reason) = &*status {
            tracing::warn!(reason = %reason, "Ignoring tokenizer install after failed initialization");
            return;
        }
        *status = TokenizerStatus::Ready(tokenizer);
    }

    /// Record a failed initialization
    pub fn fail(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(reason = %reason, "Tokenizer initialization failed, furigana disabled");
        *self.inner.write() = TokenizerStatus::Failed(reason);
    }

    /// The tokenizer, if initialization has completed
    #[must_use]
    pub fn get(&self) -> Option<Arc<dyn Tokenizer>> {
        match &*self.inner.read() {
            TokenizerStatus::Ready(tokenizer) => Some(Arc::clone(tokenizer)),
            _ => None,
        }
    }

    /// Snapshot of the current status
    #[must_use]
    pub fn status(&self) -> TokenizerStatus {
        self.inner.read().clone()
    }

    /// Whether a tokenizer is installed
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(&*self.inner.read(), TokenizerStatus::Ready(_))
    }

    /// Run `loader` on the tokio runtime and install its result
    ///
    /// Returns immediately; rendering falls back to plain text until the
    /// loader resolves.
    pub fn load_in_background<F>(&self, loader: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<Arc<dyn Tokenizer>, TokenizerError>> + Send + 'static,
    {
        let handle = self.clone();
        tokio::spawn(async move {
            match loader.await {
                Ok(tokenizer) => {
                    handle.install(tokenizer);
                    tracing::info!("Tokenizer initialized");
                }
                Err(e) => handle.fail(e.to_string()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CharTokenizer;

    impl Tokenizer for CharTokenizer {
        fn tokenize(&self, text: &str) -> Vec<Token> {
            text.chars().map(|c| Token::plain(c.to_string())).collect()
        }
    }

    #[test]
    fn test_handle_starts_pending() {
        let handle = TokenizerHandle::new();
        assert!(!handle.is_ready());
        assert!(handle.get().is_none());
        assert!(matches!(handle.status(), TokenizerStatus::Pending));
    }

    #[test]
    fn test_ready_handle() {
        let handle = TokenizerHandle::ready(CharTokenizer);
        assert!(handle.is_ready());
        let tokens = handle.get().unwrap().tokenize("ab");
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn test_clones_share_the_slot() {
        let handle = TokenizerHandle::new();
        let clone = handle.clone();
        handle.install(Arc::new(CharTokenizer));
        assert!(clone.is_ready());
    }

    #[test]
    fn test_failure_is_permanent() {
        let handle = TokenizerHandle::new();
        handle.fail("dictionary missing");
        handle.install(Arc::new(CharTokenizer));
        assert!(!handle.is_ready());
        assert!(matches!(handle.status(), TokenizerStatus::Failed(_)));
    }

    #[tokio::test]
    async fn test_load_in_background_success() {
        let handle = TokenizerHandle::new();
        let task = handle.load_in_background(async {
            Ok(Arc::new(CharTokenizer) as Arc<dyn Tokenizer>)
        });
        task.await.unwrap();
        assert!(handle.is_ready());
    }

    #[tokio::test]
    async fn test_load_in_background_failure() {
        let handle = TokenizerHandle::new();
        let task = handle.load_in_background(async { Err(TokenizerError::Empty) });
        task.await.unwrap();
        assert!(!handle.is_ready());
        assert!(matches!(handle.status(), TokenizerStatus::Failed(_)));
    }
}
