//! Dictionary-driven tokenizer
//!
//! Greedy longest-match segmentation over a prefix trie of dictionary
//! surfaces. Runs of characters with no dictionary entry are emitted as a
//! single token without a reading, so the output always covers the input.
//!
//! Dictionary format (UTF-8):
//!
//! ```text
//! # comment
//! 日本語	ニホンゴ
//! 食べる	タベル
//! ```

use std::collections::HashMap;
use std::path::Path;

use super::{Token, Tokenizer, TokenizerError};

#[derive(Debug, Default)]
struct TrieNode {
    children: HashMap<char, TrieNode>,
    /// Reading when a dictionary surface ends at this node
    reading: Option<String>,
}

/// Longest-match tokenizer over a surface → reading dictionary
#[derive(Debug, Default)]
pub struct LexiconTokenizer {
    root: TrieNode,
    entries: usize,
}

impl LexiconTokenizer {
    /// Create an empty tokenizer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(surface, reading)` pairs
    ///
    /// When a surface appears twice, the first reading wins.
    pub fn from_entries<I, S, R>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, R)>,
        S: AsRef<str>,
        R: Into<String>,
    {
        let mut tokenizer = Self::new();
        for (surface, reading) in entries {
            tokenizer.insert(surface.as_ref(), reading);
        }
        tokenizer
    }

    /// Parse a tab-separated dictionary
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::Parse`] for a line without a tab separator
    /// and [`TokenizerError::Empty`] when no entries were found.
    pub fn parse(source: &str) -> Result<Self, TokenizerError> {
        let mut tokenizer = Self::new();

        for (idx, raw) in source.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((surface, reading)) = line.split_once('\t') else {
                return Err(TokenizerError::Parse {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };

            if surface.is_empty() {
                return Err(TokenizerError::Parse {
                    line: idx + 1,
                    content: line.to_string(),
                });
            }

            tokenizer.insert(surface, reading.trim());
        }

        if tokenizer.entries == 0 {
            return Err(TokenizerError::Empty);
        }

        tracing::debug!(entries = tokenizer.entries, "Parsed tokenizer dictionary");
        Ok(tokenizer)
    }

    /// Load a dictionary file asynchronously
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TokenizerError> {
        let path = path.as_ref();
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| TokenizerError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::parse(&source)
    }

    /// Number of dictionary entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Whether the dictionary is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    fn insert(&mut self, surface: &str, reading: impl Into<String>) {
        let mut node = &mut self.root;
        for ch in surface.chars() {
            node = node.children.entry(ch).or_default();
        }
        if node.reading.is_none() {
            let reading = reading.into();
            // An empty reading still marks the surface as a known word
            node.reading = Some(reading);
            self.entries += 1;
        }
    }

    /// Longest dictionary match starting at `start`: (end index, reading)
    fn longest_match(&self, chars: &[char], start: usize) -> Option<(usize, &str)> {
        let mut node = &self.root;
        let mut best = None;

        for (offset, ch) in chars[start..].iter().enumerate() {
            match node.children.get(ch) {
                Some(child) => {
                    node = child;
                    if let Some(reading) = &node.reading {
                        best = Some((start + offset + 1, reading.as_str()));
                    }
                }
                None => break,
            }
        }

        best
    }
}

impl Tokenizer for LexiconTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut unknown = String::new();
        let mut pos = 0;

        while pos < chars.len() {
            if let Some((end, reading)) = self.longest_match(&chars, pos) {
                if !unknown.is_empty() {
                    tokens.push(Token::plain(std::mem::take(&mut unknown)));
                }
                let surface: String = chars[pos..end].iter().collect();
                if reading.is_empty() {
                    tokens.push(Token::plain(surface));
                } else {
                    tokens.push(Token::with_reading(surface, reading));
                }
                pos = end;
            } else {
                unknown.push(chars[pos]);
                pos += 1;
            }
        }

        if !unknown.is_empty() {
            tokens.push(Token::plain(unknown));
        }

        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LexiconTokenizer {
        LexiconTokenizer::from_entries([
            ("日本", "ニホン"),
            ("日本語", "ニホンゴ"),
            ("勉強", "ベンキョウ"),
            ("する", "スル"),
        ])
    }

    fn surfaces(tokens: &[Token]) -> String {
        tokens.iter().map(|t| t.surface_form.as_str()).collect()
    }

    #[test]
    fn test_longest_match_wins() {
        let tokens = sample().tokenize("日本語");
        assert_eq!(tokens, vec![Token::with_reading("日本語", "ニホンゴ")]);
    }

    #[test]
    fn test_unknown_runs_are_merged() {
        let tokens = sample().tokenize("日本語を勉強する!");
        assert_eq!(
            tokens,
            vec![
                Token::with_reading("日本語", "ニホンゴ"),
                Token::plain("を"),
                Token::with_reading("勉強", "ベンキョウ"),
                Token::with_reading("する", "スル"),
                Token::plain("!"),
            ]
        );
    }

    #[test]
    fn test_covers_input_contiguously() {
        let input = "abc日本xyz日本語語";
        let tokens = sample().tokenize(input);
        assert_eq!(surfaces(&tokens), input);
    }

    #[test]
    fn test_empty_input() {
        assert!(sample().tokenize("").is_empty());
    }

    #[test]
    fn test_first_reading_wins() {
        let tokenizer = LexiconTokenizer::from_entries([("今日", "キョウ"), ("今日", "コンニチ")]);
        assert_eq!(tokenizer.len(), 1);
        assert_eq!(
            tokenizer.tokenize("今日"),
            vec![Token::with_reading("今日", "キョウ")]
        );
    }

    #[test]
    fn test_parse_dictionary() {
        let source = "# sample\n日本語\tニホンゴ\r\n\n食べる\tタベル\n";
        let tokenizer = LexiconTokenizer::parse(source).unwrap();
        assert_eq!(tokenizer.len(), 2);
        assert_eq!(
            tokenizer.tokenize("食べる"),
            vec![Token::with_reading("食べる", "タベル")]
        );
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        let err = LexiconTokenizer::parse("日本語 ニホンゴ").unwrap_err();
        assert!(matches!(err, TokenizerError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_empty_dictionary() {
        let err = LexiconTokenizer::parse("# nothing here\n\n").unwrap_err();
        assert!(matches!(err, TokenizerError::Empty));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = LexiconTokenizer::load("/nonexistent/kaiwa/dict.tsv")
            .await
            .unwrap_err();
        assert!(matches!(err, TokenizerError::Read { .. }));
    }
}
