//! Tutor - The Orchestration Core
//!
//! The tutor ties the pipeline together:
//! - validates and records what the learner types
//! - composes the system instruction and calls the chat backend
//! - reveals the reply a character at a time
//! - persists the conversation after every change
//! - renders messages with furigana and expressions
//!
//! It is UI-agnostic. Surfaces receive [`TutorMessage`]s over a channel and
//! drive the tutor by calling its methods: [`Tutor::submit`] for input,
//! [`Tutor::poll_completion`] and [`Tutor::tick`] on a timer.
//!
//! At most one completion is outstanding at a time. Submitting while one is
//! in flight is refused with [`SubmitError::Busy`].

use std::sync::{Arc, LazyLock};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::backend::{ChatBackend, ChatRequest, ChatResponse};
use crate::conversation::{Conversation, Role};
use crate::expression::ExpressionCatalogue;
use crate::messages::{NotifyLevel, TutorMessage, TutorState};
use crate::prompt::{compose, PromptFragments, DEFAULT_BASE_PROMPT};
use crate::render::{render_message, RenderedMessage};
use crate::reveal::{RevealController, RevealState};
use crate::store::{self, KeyValueStore};
use crate::tokenizer::TokenizerHandle;
use crate::validation::{InputLimits, InputValidator, ValidationResult};
use crate::vocabulary::{VocabularySnapshot, VocabularySource};

static EMPTY_CATALOGUE: LazyLock<ExpressionCatalogue> = LazyLock::new(ExpressionCatalogue::new);

/// Tutor configuration
#[derive(Clone, Debug)]
pub struct TutorConfig {
    /// Base instruction
    pub base_prompt: String,
    /// Maximum history messages sent with a request (0 = all)
    pub max_context_messages: usize,
    /// Characters revealed per tick
    pub chars_per_tick: usize,
    /// Input limits
    pub limits: InputLimits,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            base_prompt: DEFAULT_BASE_PROMPT.to_string(),
            max_context_messages: 0,
            chars_per_tick: 1,
            limits: InputLimits::default(),
        }
    }
}

/// Why a submission was refused
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// Input failed validation; nothing was appended or sent
    #[error("Message rejected: {0}")]
    Rejected(String),

    /// A completion is already outstanding
    #[error("Still waiting for the previous reply")]
    Busy,
}

struct PendingCompletion {
    rx: oneshot::Receiver<anyhow::Result<ChatResponse>>,
    task: JoinHandle<()>,
}

/// The tutor - headless orchestration core
pub struct Tutor {
    config: TutorConfig,
    backend: Arc<dyn ChatBackend>,
    store: Box<dyn KeyValueStore>,
    tokenizer: TokenizerHandle,
    conversation: Conversation,
    reveal: RevealController,
    fragments: PromptFragments,
    state: TutorState,
    tx: mpsc::Sender<TutorMessage>,
    validator: InputValidator,
    pending: Option<PendingCompletion>,
}

impl Tutor {
    /// Create a tutor, restoring conversation and settings from `store`
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        store: Box<dyn KeyValueStore>,
        tokenizer: TokenizerHandle,
        config: TutorConfig,
        tx: mpsc::Sender<TutorMessage>,
    ) -> Self {
        let conversation = store::load_conversation(store.as_ref());
        let mut fragments = PromptFragments::new(config.base_prompt.clone())
            .with_catalogue(store::load_catalogue(store.as_ref()));
        fragments.biography = store::load_biography(store.as_ref());

        tracing::debug!(
            messages = conversation.len(),
            has_biography = fragments.biography.is_some(),
            "Restored tutor state"
        );

        Self {
            validator: InputValidator::new(config.limits.clone()),
            config,
            backend,
            store,
            tokenizer,
            conversation,
            reveal: RevealController::new(),
            fragments,
            state: TutorState::Initializing,
            tx,
            pending: None,
        }
    }

    /// Current state
    pub fn state(&self) -> TutorState {
        self.state
    }

    /// The conversation as currently shown
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Whether a completion is outstanding
    pub fn is_composing(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether a reply is being revealed
    pub fn is_revealing(&self) -> bool {
        self.reveal.is_revealing()
    }

    /// Prompt fragments in use
    pub fn fragments(&self) -> &PromptFragments {
        &self.fragments
    }

    /// Expression catalogue in use
    pub fn catalogue(&self) -> &ExpressionCatalogue {
        self.fragments
            .expression_catalogue
            .as_ref()
            .unwrap_or(&*EMPTY_CATALOGUE)
    }

    /// Backing store
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    /// Tokenizer slot used for rendering
    pub fn tokenizer(&self) -> &TokenizerHandle {
        &self.tokenizer
    }

    /// The system instruction the next request would carry
    pub fn system_prompt(&self) -> String {
        compose(&self.fragments)
    }

    /// Announce the session and become ready
    pub async fn start(&mut self) {
        if !self.backend.health_check().await {
            self.notify(
                NotifyLevel::Warning,
                &format!("{} is not reachable - replies may fail", self.backend.name()),
            )
            .await;
        }

        self.send(TutorMessage::SessionInfo {
            backend: self.backend.name().to_string(),
            model: self.backend.default_model().to_string(),
            restored_messages: self.conversation.len(),
        })
        .await;

        self.set_state(TutorState::Ready).await;
    }

    /// Submit learner input
    ///
    /// On success the message is appended and persisted, and a completion is
    /// started. Returns the index of the new message.
    ///
    /// # Errors
    ///
    /// [`SubmitError::Rejected`] for invalid input and [`SubmitError::Busy`]
    /// while a completion is outstanding. Neither changes the conversation.
    pub async fn submit(&mut self, content: &str) -> Result<usize, SubmitError> {
        match self.validator.validate_message(content) {
            ValidationResult::Valid => {}
            rejected => {
                let reason = rejected
                    .error_message()
                    .unwrap_or("invalid input")
                    .to_string();
                tracing::warn!(reason = %reason, "Rejected user message");
                return Err(SubmitError::Rejected(reason));
            }
        }

        if self.pending.is_some() {
            tracing::debug!("Submission refused while a completion is outstanding");
            return Err(SubmitError::Busy);
        }

        // A reply still being revealed stays as far as it got
        if self.reveal.is_revealing() {
            self.reveal.cancel();
        }

        let index = self.conversation.push_user(content);
        self.persist().await;
        self.send(TutorMessage::MessageAppended {
            index,
            role: Role::User,
            content: content.to_string(),
        })
        .await;

        let request = self.build_request();
        let backend = Arc::clone(&self.backend);
        let (result_tx, result_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            let result = backend.complete(&request).await;
            let _ = result_tx.send(result);
        });
        self.pending = Some(PendingCompletion {
            rx: result_rx,
            task,
        });

        self.send(TutorMessage::Composing { active: true }).await;
        self.set_state(TutorState::Composing).await;

        Ok(index)
    }

    /// Check for a finished completion
    ///
    /// Call this regularly. Returns true if a completion was handled.
    pub async fn poll_completion(&mut self) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };

        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return false,
            Err(oneshot::error::TryRecvError::Closed) => {
                Err(anyhow::anyhow!("completion task ended without a reply"))
            }
        };

        self.pending = None;
        self.handle_completion(result).await;
        true
    }

    /// Wait for the outstanding completion, if any
    ///
    /// Returns true if a completion was handled.
    pub async fn await_completion(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };

        let result = pending
            .rx
            .await
            .unwrap_or_else(|_| Err(anyhow::anyhow!("completion task ended without a reply")));
        self.handle_completion(result).await;
        true
    }

    async fn handle_completion(&mut self, result: anyhow::Result<ChatResponse>) {
        self.send(TutorMessage::Composing { active: false }).await;

        match result {
            Ok(response) => {
                tracing::info!(
                    model = %response.model,
                    chars = response.content.chars().count(),
                    tokens = ?response.tokens_used,
                    duration_ms = ?response.duration_ms,
                    "Reply received"
                );

                let index = self.reveal.start(&mut self.conversation, response.content);
                self.persist().await;
                self.send(TutorMessage::MessageAppended {
                    index,
                    role: Role::Assistant,
                    content: String::new(),
                })
                .await;

                if self.reveal.is_revealing() {
                    self.set_state(TutorState::Revealing).await;
                } else {
                    self.send(TutorMessage::RevealFinished { index }).await;
                    self.set_state(TutorState::Ready).await;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, backend = self.backend.name(), "Completion failed");
                self.notify(
                    NotifyLevel::Error,
                    &format!("Problem with {}. Please try again later.", self.backend.name()),
                )
                .await;
                self.set_state(TutorState::Error).await;
            }
        }
    }

    /// Advance the reveal by one step
    ///
    /// Returns true if more text became visible.
    pub async fn tick(&mut self) -> bool {
        let step = self.config.chars_per_tick.max(1);
        self.advance_reveal(step).await
    }

    /// Show the rest of the current reply at once
    pub async fn finish_reveal(&mut self) -> bool {
        self.advance_reveal(usize::MAX).await
    }

    async fn advance_reveal(&mut self, count: usize) -> bool {
        let RevealState::Revealing(session) = self.reveal.state() else {
            return false;
        };

        let index = session.message_index;
        let before = self.conversation.get(index).map_or(0, |m| m.content.len());
        let shown = self.reveal.tick_many(&mut self.conversation, count);

        if shown > 0 {
            if let Some(message) = self.conversation.get(index) {
                let text = message.content[before..].to_string();
                self.send(TutorMessage::Revealed { index, text }).await;
            }
        }

        // Stored history already holds the full reply while revealing, so it
        // only changes when the reveal ends or is abandoned
        if !self.reveal.is_revealing() {
            self.persist().await;
            if shown > 0 {
                self.send(TutorMessage::RevealFinished { index }).await;
            }
            if self.state == TutorState::Revealing {
                self.set_state(TutorState::Ready).await;
            }
        }

        shown > 0
    }

    /// Empty the conversation
    ///
    /// Any reply being revealed or awaited is dropped.
    pub async fn clear_history(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
            self.send(TutorMessage::Composing { active: false }).await;
        }
        self.reveal.cancel();
        self.conversation.clear();

        if let Err(e) = store::clear_conversation(self.store.as_mut()) {
            tracing::error!(error = %e, "Failed to clear stored conversation");
            self.notify(NotifyLevel::Warning, "Could not clear saved history")
                .await;
        }

        tracing::info!("Conversation cleared");
        self.send(TutorMessage::HistoryCleared).await;
        self.set_state(TutorState::Ready).await;
    }

    /// Replace the biography; blank text removes it
    pub async fn set_biography(&mut self, biography: &str) {
        let trimmed = biography.trim();
        self.fragments.biography = (!trimmed.is_empty()).then(|| trimmed.to_string());
        if let Err(e) = store::save_biography(self.store.as_mut(), trimmed) {
            tracing::error!(error = %e, "Failed to save biography");
            self.notify(NotifyLevel::Warning, "Could not save biography")
                .await;
        }
    }

    /// Set the image link for an expression
    pub async fn set_expression(&mut self, name: &str, link: &str) {
        let catalogue = self
            .fragments
            .expression_catalogue
            .get_or_insert_with(ExpressionCatalogue::new);
        catalogue.insert(name, link);
        self.save_catalogue().await;
    }

    /// Remove an expression from the catalogue
    pub async fn remove_expression(&mut self, name: &str) -> bool {
        let removed = self
            .fragments
            .expression_catalogue
            .as_mut()
            .and_then(|c| c.remove(name))
            .is_some();
        if removed {
            self.save_catalogue().await;
        }
        removed
    }

    async fn save_catalogue(&mut self) {
        let catalogue = self.catalogue().clone();
        if let Err(e) = store::save_catalogue(self.store.as_mut(), &catalogue) {
            tracing::error!(error = %e, "Failed to save expression links");
            self.notify(NotifyLevel::Warning, "Could not save expression links")
                .await;
        }
    }

    /// Use `snapshot` for the vocabulary clause
    pub async fn set_vocabulary(&mut self, snapshot: VocabularySnapshot) {
        let words = snapshot.in_progress.len();
        let level = snapshot.level;
        self.fragments.vocabulary_level = snapshot.level;
        self.fragments.vocabulary_in_progress = snapshot.in_progress;
        self.send(TutorMessage::VocabularyUpdated { level, words })
            .await;
    }

    /// Fetch progress from `source` and use it
    pub async fn refresh_vocabulary(&mut self, source: &dyn VocabularySource) {
        let snapshot = source.fetch().await;
        tracing::debug!(source = source.name(), level = snapshot.level, "Vocabulary refreshed");
        self.set_vocabulary(snapshot).await;
    }

    /// Store a secret such as an API key; blank removes it
    pub async fn set_secret(&mut self, key: &str, value: &str) {
        if let Err(e) = store::save_secret(self.store.as_mut(), key, value) {
            tracing::error!(error = %e, key = key, "Failed to save secret");
            self.notify(NotifyLevel::Warning, "Could not save key").await;
        }
    }

    /// Switch to another chat backend
    ///
    /// An outstanding completion still finishes against the old backend.
    pub async fn set_backend(&mut self, backend: Arc<dyn ChatBackend>) {
        tracing::info!(backend = backend.name(), model = backend.default_model(), "Switched backend");
        self.backend = backend;
        self.send(TutorMessage::SessionInfo {
            backend: self.backend.name().to_string(),
            model: self.backend.default_model().to_string(),
            restored_messages: self.conversation.len(),
        })
        .await;
    }

    /// Render one message
    pub fn render(&self, index: usize) -> Option<RenderedMessage> {
        let tokenizer = self.tokenizer.get();
        self.conversation
            .get(index)
            .map(|message| render_message(message, tokenizer.as_deref(), self.catalogue()))
    }

    /// Render every message
    pub fn render_all(&self) -> Vec<RenderedMessage> {
        let tokenizer = self.tokenizer.get();
        self.conversation
            .messages()
            .iter()
            .map(|message| render_message(message, tokenizer.as_deref(), self.catalogue()))
            .collect()
    }

    /// Shut down the tutor
    ///
    /// Finishes any reveal so the stored history is complete.
    pub async fn shutdown(&mut self) {
        self.set_state(TutorState::ShuttingDown).await;
        if let Some(pending) = self.pending.take() {
            pending.task.abort();
        }
        self.reveal.finish(&mut self.conversation);
        self.persist().await;
    }

    fn build_request(&self) -> ChatRequest {
        let history = if self.config.max_context_messages == 0 {
            self.conversation.messages()
        } else {
            self.conversation.recent(self.config.max_context_messages)
        };
        ChatRequest::new(self.backend.default_model(), self.system_prompt(), history)
    }

    /// Save the conversation as it should survive a reload
    async fn persist(&mut self) {
        let settled = self.reveal.settled(&self.conversation);
        if let Err(e) = store::save_conversation(self.store.as_mut(), &settled) {
            tracing::error!(error = %e, "Failed to save conversation");
            self.notify(NotifyLevel::Warning, "Could not save conversation")
                .await;
        }
    }

    async fn set_state(&mut self, state: TutorState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "Tutor state");
        }
        self.state = state;
        self.send(TutorMessage::State { state }).await;
    }

    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(TutorMessage::Notify {
            level,
            title: None,
            message: message.to_string(),
        })
        .await;
    }

    async fn send(&self, msg: TutorMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
