//! Bundled morphological tokenizer
//!
//! Wraps `lindera` with its embedded IPADIC dictionary, the same dictionary
//! kuromoji ships with. IPADIC token details are laid out as
//!
//! ```text
//! 品詞,品詞細分類1,品詞細分類2,品詞細分類3,活用型,活用形,原形,読み,発音
//! ```
//!
//! so the katakana reading is field 7. Unknown words carry a short detail
//! list, and known words without a reading carry `*`; both map to no reading.

use lindera::dictionary::load_dictionary;
use lindera::mode::Mode;
use lindera::segmenter::Segmenter;

use super::{Token, Tokenizer, TokenizerError};

/// Dictionary URI of the IPADIC build compiled into the binary
const EMBEDDED_IPADIC: &str = "embedded://ipadic";

/// Index of the reading in an IPADIC detail list
const READING_FIELD: usize = 7;

/// Tokenizer backed by lindera and the embedded IPADIC dictionary
pub struct IpadicTokenizer {
    inner: lindera::tokenizer::Tokenizer,
}

impl std::fmt::Debug for IpadicTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IpadicTokenizer").finish_non_exhaustive()
    }
}

impl IpadicTokenizer {
    /// Build the tokenizer from the embedded dictionary
    ///
    /// Decompressing the dictionary takes a noticeable moment, so callers
    /// normally go through [`IpadicTokenizer::load`].
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerError::Dictionary`] if the dictionary cannot be
    /// loaded.
    pub fn embedded() -> Result<Self, TokenizerError> {
        let dictionary = load_dictionary(EMBEDDED_IPADIC)
            .map_err(|e| TokenizerError::Dictionary(e.to_string()))?;
        let segmenter = Segmenter::new(Mode::Normal, dictionary, None);
        tracing::debug!("Loaded embedded IPADIC dictionary");
        Ok(Self {
            inner: lindera::tokenizer::Tokenizer::new(segmenter),
        })
    }

    /// Build the tokenizer on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns an error if the dictionary cannot be loaded or the loader
    /// task is cancelled.
    pub async fn load() -> Result<Self, TokenizerError> {
        tokio::task::spawn_blocking(Self::embedded)
            .await
            .map_err(|e| TokenizerError::Aborted(e.to_string()))?
    }
}

/// Reading carried by an IPADIC detail list, if any
fn reading_field(details: &[&str]) -> Option<String> {
    match details.get(READING_FIELD) {
        Some(&reading) if !reading.is_empty() && reading != "*" => Some(reading.to_string()),
        _ => None,
    }
}

impl Tokenizer for IpadicTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = match self.inner.tokenize(text) {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "Tokenization failed, line left unsegmented");
                return vec![Token::plain(text)];
            }
        };

        tokens
            .iter_mut()
            .map(|token| {
                let surface = token.surface.to_string();
                match reading_field(&token.details()) {
                    Some(reading) => Token::with_reading(surface, reading),
                    None => Token::plain(surface),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_field() {
        let known = ["名詞", "一般", "*", "*", "*", "*", "日本語", "ニホンゴ", "ニホンゴ"];
        assert_eq!(reading_field(&known), Some("ニホンゴ".to_string()));

        let starred = ["記号", "一般", "*", "*", "*", "*", "*", "*", "*"];
        assert_eq!(reading_field(&starred), None);

        assert_eq!(reading_field(&["UNK"]), None);
        assert_eq!(reading_field(&[]), None);
    }

    #[test]
    fn test_embedded_dictionary_reads_kanji() {
        let tokenizer = IpadicTokenizer::embedded().unwrap();
        let tokens = tokenizer.tokenize("日本語を勉強します");

        let surfaces: String = tokens.iter().map(|t| t.surface_form.as_str()).collect();
        assert_eq!(surfaces, "日本語を勉強します");

        let nihongo = tokens.iter().find(|t| t.surface_form == "日本語").unwrap();
        assert_eq!(nihongo.reading.as_deref(), Some("ニホンゴ"));

        let benkyou = tokens.iter().find(|t| t.surface_form == "勉強").unwrap();
        assert_eq!(benkyou.reading.as_deref(), Some("ベンキョウ"));
    }

    #[test]
    fn test_unknown_text_keeps_its_surface() {
        let tokenizer = IpadicTokenizer::embedded().unwrap();
        let tokens = tokenizer.tokenize("kaiwa");

        let surfaces: String = tokens.iter().map(|t| t.surface_form.as_str()).collect();
        assert_eq!(surfaces, "kaiwa");
        assert!(tokens.iter().all(|t| t.reading.is_none()));
    }

    #[tokio::test]
    async fn test_load_on_blocking_pool() {
        let tokenizer = IpadicTokenizer::load().await.unwrap();
        assert!(!tokenizer.tokenize("漢字").is_empty());
    }
}
