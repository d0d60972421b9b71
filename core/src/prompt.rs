//! Prompt Composition
//!
//! Builds the system instruction from independently edited fragments. The
//! clause order is fixed and every optional clause disappears entirely when
//! its fragment is missing:
//!
//! 1. base instruction (always)
//! 2. expression directive syntax and the list of names
//! 3. the user's biography
//! 4. vocabulary level and words in progress
//!
//! Clauses are separated by a blank line. Composition is pure: fragments are
//! gathered by the caller and passed in.

use serde::{Deserialize, Serialize};

use crate::directive::marker;
use crate::expression::ExpressionCatalogue;

/// Default assistant persona
pub const DEFAULT_BASE_PROMPT: &str = "You are a dedicated Japanese language learning assistant, \
equipped with the ability to automatically generate furigana for all kanji characters. Your role \
is to assist with understanding and comprehension of the Japanese language without the need to \
provide pronunciation guidance or romaji. Please remember: No romaji should be used in our \
interactions. Let's focus on meaningful conversation and language learning!";

/// Vocabulary level meaning "unknown"
pub const UNKNOWN_LEVEL: i32 = -1;

const CLAUSE_SEPARATOR: &str = "\n\n";

const BIOGRAPHY_LEAD_IN: &str = "Here is what the user says about themselves: ";

/// Everything the system instruction is made from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptFragments {
    /// Base instruction
    pub base: String,
    /// Available expressions, if configured
    pub expression_catalogue: Option<ExpressionCatalogue>,
    /// Free-form text the user wrote about themselves
    pub biography: Option<String>,
    /// Vocabulary level, or [`UNKNOWN_LEVEL`]
    pub vocabulary_level: i32,
    /// Words the user is still learning
    pub vocabulary_in_progress: Vec<String>,
}

impl Default for PromptFragments {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_PROMPT)
    }
}

impl PromptFragments {
    /// Fragments with only a base instruction
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            expression_catalogue: None,
            biography: None,
            vocabulary_level: UNKNOWN_LEVEL,
            vocabulary_in_progress: Vec::new(),
        }
    }

    /// Set the expression catalogue
    #[must_use]
    pub fn with_catalogue(mut self, catalogue: ExpressionCatalogue) -> Self {
        self.expression_catalogue = Some(catalogue);
        self
    }

    /// Set the biography
    #[must_use]
    pub fn with_biography(mut self, biography: impl Into<String>) -> Self {
        self.biography = Some(biography.into());
        self
    }

    /// Set vocabulary progress
    #[must_use]
    pub fn with_vocabulary(mut self, level: i32, in_progress: Vec<String>) -> Self {
        self.vocabulary_level = level;
        self.vocabulary_in_progress = in_progress;
        self
    }
}

/// Compose the system instruction
#[must_use]
pub fn compose(fragments: &PromptFragments) -> String {
    let mut clauses = vec![fragments.base.clone()];

    if let Some(catalogue) = fragments
        .expression_catalogue
        .as_ref()
        .filter(|c| !c.is_empty())
    {
        clauses.push(expression_clause(catalogue));
    }

    if let Some(biography) = fragments
        .biography
        .as_deref()
        .filter(|b| !b.trim().is_empty())
    {
        clauses.push(format!("{BIOGRAPHY_LEAD_IN}{biography}"));
    }

    if fragments.vocabulary_level != UNKNOWN_LEVEL {
        clauses.push(vocabulary_clause(
            fragments.vocabulary_level,
            &fragments.vocabulary_in_progress,
        ));
    }

    clauses.join(CLAUSE_SEPARATOR)
}

fn expression_clause(catalogue: &ExpressionCatalogue) -> String {
    let names: Vec<&str> = catalogue.names().collect();
    format!(
        "You are also able to express emotions and greeting simply by typing {}. \
         It is encouraged to use emotions and expressions. This is the emotionName list: {}",
        marker("emotionName"),
        names.join(", ")
    )
}

fn vocabulary_clause(level: i32, in_progress: &[String]) -> String {
    let mut clause = format!("The user's vocabulary level is {level}.");
    if !in_progress.is_empty() {
        clause.push_str(" These are the vocabulary words the user is still learning: ");
        clause.push_str(&in_progress.join(", "));
    }
    clause
}
