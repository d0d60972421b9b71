//! Expression Catalogue
//!
//! Maps expression names (the `NAME` in `<Image emotion=NAME>`) to image
//! links. Order is insertion order: it is the order names are listed to the
//! model and shown in settings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Emotion names offered out of the box
pub const DEFAULT_EMOTIONS: &[&str] = &[
    "happy",
    "sad",
    "angry",
    "surprised",
    "disappointed",
    "teasing",
    "confused",
    "excited",
    "scared",
    "bored",
    "anxious",
    "curious",
    "embarrassed",
    "frustrated",
    "impressed",
    "inquisitive",
    "jealous",
    "joyful",
    "nervous",
    "proud",
    "relieved",
    "shy",
    "skeptical",
    "sorrowful",
    "thoughtful",
    "tired",
    "triumphant",
    "worried",
];

/// Greeting-style expression names offered out of the box
pub const DEFAULT_GREETINGS: &[&str] = &["hello", "goodbye", "thankYou", "please", "congratulations"];

/// Insertion-ordered mapping of expression name to image link
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpressionCatalogue {
    links: IndexMap<String, String>,
}

impl ExpressionCatalogue {
    /// Create an empty catalogue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalogue with every default name and no links yet
    #[must_use]
    pub fn with_default_names() -> Self {
        DEFAULT_EMOTIONS
            .iter()
            .chain(DEFAULT_GREETINGS)
            .map(|name| ((*name).to_string(), String::new()))
            .collect()
    }

    /// Set the link for `name`
    ///
    /// Updating an existing name keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, link: impl Into<String>) {
        self.links.insert(name.into(), link.into());
    }

    /// Remove `name`, keeping the order of the others
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.links.shift_remove(name)
    }

    /// Whether `name` is in the catalogue
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.links.contains_key(name)
    }

    /// The link for `name`, if one is configured
    ///
    /// Names that are listed but have an empty link resolve to `None`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.links
            .get(name)
            .map(String::as_str)
            .filter(|link| !link.is_empty())
    }

    /// Names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }

    /// `(name, link)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.links.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of names
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the catalogue has no names
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExpressionCatalogue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            links: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
