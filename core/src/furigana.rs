//! Furigana Annotation
//!
//! Turns one line of text into display segments: plain runs and
//! (base, annotation) pairs that a surface renders as ruby text.
//!
//! A token is annotated when it has a reading and its surface contains at
//! least one kanji. The annotation covers the whole surface form; a token
//! like `食べる` gets `たべる` above the full word, not per character.
//!
//! Without a tokenizer the whole line comes back as a single plain segment.

use serde::{Deserialize, Serialize};

use crate::reading::to_display_script;
use crate::script::contains_ideograph;
use crate::tokenizer::{Tokenizer, TokenizerHandle};

/// A renderable piece of a line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplaySegment {
    /// Text shown as is
    Plain(String),
    /// Text shown with a reading above it
    Annotated {
        /// The text being annotated
        base: String,
        /// Reading in hiragana
        annotation: String,
    },
}

impl DisplaySegment {
    /// Build an annotated segment
    pub fn annotated(base: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self::Annotated {
            base: base.into(),
            annotation: annotation.into(),
        }
    }

    /// The source text this segment covers
    #[must_use]
    pub fn base_text(&self) -> &str {
        match self {
            Self::Plain(text) => text,
            Self::Annotated { base, .. } => base,
        }
    }
}

/// Annotate a single line
///
/// `tokenizer` is `None` until the tokenizer has been initialized.
pub fn annotate(line: &str, tokenizer: Option<&dyn Tokenizer>) -> Vec<DisplaySegment> {
    if line.is_empty() {
        return Vec::new();
    }

    let Some(tokenizer) = tokenizer else {
        return vec![DisplaySegment::Plain(line.to_string())];
    };

    let tokens = tokenizer.tokenize(line);

    let rebuilt: String = tokens.iter().map(|t| t.surface_form.as_str()).collect();
    if rebuilt != line {
        tracing::warn!(
            line_len = line.len(),
            covered = rebuilt.len(),
            "Tokenizer output does not cover the line, rendering without furigana"
        );
        return vec![DisplaySegment::Plain(line.to_string())];
    }

    tokens
        .into_iter()
        .map(|token| match token.reading {
            Some(reading) if contains_ideograph(&token.surface_form) => DisplaySegment::Annotated {
                annotation: to_display_script(&reading),
                base: token.surface_form,
            },
            _ => DisplaySegment::Plain(token.surface_form),
        })
        .collect()
}

/// Annotate a line using whatever the shared handle currently holds
pub fn annotate_with(line: &str, handle: &TokenizerHandle) -> Vec<DisplaySegment> {
    let tokenizer = handle.get();
    annotate(line, tokenizer.as_deref())
}

/// Concatenate the base text of `segments`
#[must_use]
pub fn base_text(segments: &[DisplaySegment]) -> String {
    segments.iter().map(DisplaySegment::base_text).collect()
}
