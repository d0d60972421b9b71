//! Incremental Reveal
//!
//! Shows a finished assistant reply one character at a time. The controller
//! is a plain state machine; the caller decides how often to [`tick`].
//!
//! ```text
//! Idle ──start──▶ Revealing ──tick (last char)──▶ Idle
//!                     │
//!                     └──cancel / start──▶ Idle (partial text stays)
//! ```
//!
//! A reveal that is interrupted is abandoned in place: whatever was already
//! shown remains in the conversation and is never completed or rolled back.
//!
//! [`tick`]: RevealController::tick

use crate::conversation::{Conversation, Message};

/// Progress of an active reveal
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevealSession {
    /// Full reply being revealed
    pub target_text: String,
    /// Characters of `target_text` already shown
    pub revealed_length: usize,
    /// Index of the message being grown
    pub message_index: usize,
    target_chars: Vec<char>,
}

impl RevealSession {
    fn new(target_text: String, message_index: usize) -> Self {
        let target_chars = target_text.chars().collect();
        Self {
            target_text,
            revealed_length: 0,
            message_index,
            target_chars,
        }
    }

    /// Length of the target in characters
    #[must_use]
    pub fn target_length(&self) -> usize {
        self.target_chars.len()
    }

    /// Characters not yet shown
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.target_length() - self.revealed_length
    }

    fn is_complete(&self) -> bool {
        self.revealed_length >= self.target_length()
    }
}

/// Reveal state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RevealState {
    /// Nothing being revealed
    #[default]
    Idle,
    /// A reply is being revealed
    Revealing(RevealSession),
}

/// Drives one reveal at a time for a conversation
#[derive(Debug, Default)]
pub struct RevealController {
    state: RevealState,
}

impl RevealController {
    /// Create an idle controller
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin revealing `full_text` as a new assistant message
    ///
    /// Any active reveal is cancelled first and keeps its partial content.
    /// Returns the index of the new message.
    pub fn start(&mut self, conversation: &mut Conversation, full_text: impl Into<String>) -> usize {
        self.cancel();

        let index = conversation.push(Message::assistant(""));
        let session = RevealSession::new(full_text.into(), index);

        if session.is_complete() {
            tracing::debug!(message_index = index, "Empty reply, nothing to reveal");
        } else {
            tracing::debug!(
                message_index = index,
                chars = session.target_length(),
                "Reveal started"
            );
            self.state = RevealState::Revealing(session);
        }

        index
    }

    /// Reveal the next character
    ///
    /// Returns `true` when the conversation changed. A no-op while idle.
    pub fn tick(&mut self, conversation: &mut Conversation) -> bool {
        self.tick_many(conversation, 1) > 0
    }

    /// Reveal up to `count` characters, returning how many were shown
    pub fn tick_many(&mut self, conversation: &mut Conversation, count: usize) -> usize {
        let RevealState::Revealing(session) = &mut self.state else {
            return 0;
        };

        if conversation.last_index() != Some(session.message_index) {
            tracing::debug!(
                message_index = session.message_index,
                "Revealed message is no longer last, abandoning reveal"
            );
            self.state = RevealState::Idle;
            return 0;
        }

        let start = session.revealed_length;
        let end = (start + count).min(session.target_length());
        let chunk: String = session.target_chars[start..end].iter().collect();

        conversation.append_to(session.message_index, &chunk);
        session.revealed_length = end;

        if session.is_complete() {
            tracing::debug!(message_index = session.message_index, "Reveal complete");
            self.state = RevealState::Idle;
        }

        end - start
    }

    /// Reveal everything that is left at once
    pub fn finish(&mut self, conversation: &mut Conversation) -> usize {
        self.tick_many(conversation, usize::MAX)
    }

    /// Stop revealing, leaving shown text as it is
    pub fn cancel(&mut self) {
        if let RevealState::Revealing(session) = &self.state {
            tracing::debug!(
                message_index = session.message_index,
                revealed = session.revealed_length,
                remaining = session.remaining(),
                "Reveal cancelled"
            );
        }
        self.state = RevealState::Idle;
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> &RevealState {
        &self.state
    }

    /// Whether a reveal is in progress
    #[must_use]
    pub fn is_revealing(&self) -> bool {
        matches!(self.state, RevealState::Revealing(_))
    }

    /// The conversation as it should be stored
    ///
    /// The message under an active reveal carries its full target, so a
    /// reload shows the reply as already complete.
    #[must_use]
    pub fn settled(&self, conversation: &Conversation) -> Conversation {
        let mut settled = conversation.clone();
        if let RevealState::Revealing(session) = &self.state {
            let mut messages = settled.messages().to_vec();
            if let Some(message) = messages.get_mut(session.message_index) {
                message.content.clone_from(&session.target_text);
            }
            settled = Conversation::from_messages(messages);
        }
        settled
    }
}
