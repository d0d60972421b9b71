//! Kaiwa Core - Headless Japanese Conversation Tutor
//!
//! This crate holds everything behind a kaiwa session, independent of any
//! surface: it can drive the terminal client, another front end, or run
//! headless in tests.
//!
//! # Pipeline
//!
//! ```text
//!  learner input ──▶ validation ──▶ Conversation ──▶ prompt::compose ──▶ ChatBackend
//!                                        ▲                                    │
//!                                        │              RevealController ◀────┘
//!                                        │                    │ (tick)
//!                                   KeyValueStore             ▼
//!                                                  render: directive ─▶ furigana
//! ```
//!
//! # Key Types
//!
//! - [`Tutor`]: orchestrates one session
//! - [`TutorMessage`]: events sent from the tutor to a surface
//! - [`Conversation`]: ordered chat history
//! - [`RevealController`]: character-by-character reveal of replies
//! - [`ExpressionCatalogue`]: expression names and their image links
//! - [`TokenizerHandle`]: the tokenizer slot furigana rendering reads
//!
//! # Module Overview
//!
//! - [`script`]: ideograph detection
//! - [`reading`]: katakana to hiragana folding
//! - [`tokenizer`]: tokenizer boundary, the IPADIC tokenizer and the custom lexicon tokenizer
//! - [`furigana`]: reading annotation of text lines
//! - [`directive`]: expression directives embedded in replies
//! - [`expression`]: the expression catalogue
//! - [`prompt`]: system instruction composition
//! - [`conversation`]: chat history
//! - [`reveal`]: reply reveal state machine
//! - [`render`]: display blocks for a message
//! - [`store`]: key-value persistence
//! - [`backend`]: chat completion providers
//! - [`vocabulary`]: learner progress sources
//! - [`validation`]: input validation
//! - [`config`]: configuration loading
//! - [`messages`]: tutor to surface messages
//! - [`tutor`]: the orchestrator
//!
//! # No UI Dependencies
//!
//! Nothing here draws to a terminal. Surfaces render [`RenderedMessage`]s
//! however they like.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod conversation;
pub mod directive;
pub mod expression;
pub mod furigana;
pub mod messages;
pub mod prompt;
pub mod reading;
pub mod render;
pub mod reveal;
pub mod script;
pub mod store;
pub mod tokenizer;
pub mod tutor;
pub mod validation;
pub mod vocabulary;

// Re-exports for convenience
pub use backend::{build_backend, BackendConfig, ChatBackend, ChatRequest, ChatResponse};
pub use conversation::{Conversation, Message, Role};
pub use directive::{marker, segment, ContentSegment};
pub use expression::ExpressionCatalogue;
pub use furigana::{annotate, DisplaySegment};
pub use messages::{NotifyLevel, TutorMessage, TutorState};
pub use prompt::{compose, PromptFragments};
pub use reading::to_display_script;
pub use render::{render_content, render_message, RenderBlock, RenderedMessage};
pub use reveal::{RevealController, RevealSession, RevealState};
pub use script::{contains_ideograph, is_ideographic};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use tokenizer::{
    IpadicTokenizer, LexiconTokenizer, Token, Tokenizer, TokenizerError, TokenizerHandle,
};
pub use tutor::{SubmitError, Tutor, TutorConfig};
pub use validation::{InputLimits, InputValidator, ValidationResult};
pub use vocabulary::{StaticVocabulary, VocabularySnapshot, VocabularySource, WaniKaniSource};

// Config exports
pub use config::{
    default_config_path, default_store_path, load_config, load_config_from_path,
    ConfigError, ConfigOverrides, ConfigSource, KaiwaConfig, ProviderKind,
};
