//! Tutor Messages
//!
//! Events sent from the [`Tutor`](crate::tutor::Tutor) to whatever surface is
//! drawing the conversation. The surface holds no business logic: it renders
//! what it is told and forwards what the learner types.

use serde::{Deserialize, Serialize};

use crate::conversation::Role;

/// Messages from the tutor to a surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TutorMessage {
    // ============================================
    // Conversation Messages
    // ============================================
    /// A message was appended to the conversation
    ///
    /// Assistant messages start empty and grow through [`Self::Revealed`].
    MessageAppended {
        /// Index in the conversation
        index: usize,
        /// Who sent the message
        role: Role,
        /// Content at the time of appending
        content: String,
    },

    /// More of a reply became visible
    Revealed {
        /// Index of the growing message
        index: usize,
        /// Newly shown text
        text: String,
    },

    /// A reply is fully shown
    RevealFinished {
        /// Index of the finished message
        index: usize,
    },

    /// The conversation was emptied
    HistoryCleared,

    /// The "assistant is composing" indicator changed
    Composing {
        /// Whether a completion is outstanding
        active: bool,
    },

    // ============================================
    // System Messages
    // ============================================
    /// System notification
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Title (optional)
        title: Option<String>,
        /// Message content
        message: String,
    },

    /// Tutor state change
    State {
        /// The new state
        state: TutorState,
    },

    /// Session information
    SessionInfo {
        /// Backend name
        backend: String,
        /// Model being used
        model: String,
        /// Messages restored from storage
        restored_messages: usize,
    },

    /// Vocabulary progress was refreshed
    VocabularyUpdated {
        /// Level, or `-1` when unknown
        level: i32,
        /// Number of words in progress
        words: usize,
    },
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
    /// Success
    Success,
}

/// Tutor operational states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TutorState {
    /// Starting up, not ready
    #[default]
    Initializing,
    /// Ready for input
    Ready,
    /// Waiting for the chat backend
    Composing,
    /// Revealing a reply
    Revealing,
    /// The last completion failed
    Error,
    /// Shutting down
    ShuttingDown,
}

impl TutorState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Initializing => "Starting up...",
            Self::Ready => "Ready",
            Self::Composing => "Composing...",
            Self::Revealing => "Replying...",
            Self::Error => "Error",
            Self::ShuttingDown => "Shutting down...",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tutor_state_description() {
        assert_eq!(TutorState::Ready.description(), "Ready");
        assert_eq!(TutorState::Composing.description(), "Composing...");
        assert_eq!(TutorState::default(), TutorState::Initializing);
    }

    #[test]
    fn test_message_serializes() {
        let message = TutorMessage::MessageAppended {
            index: 0,
            role: Role::User,
            content: "こんにちは".to_string(),
        };
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"user\""));
        let back: TutorMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);
    }
}
