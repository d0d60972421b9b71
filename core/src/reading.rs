//! Reading Normalization
//!
//! Tokenizer readings arrive in katakana; furigana are displayed in
//! hiragana. Conversion is a fixed code point shift applied to the katakana
//! letters U+30A1 (ァ) through U+30F6 (ヶ).
//!
//! The prolonged sound mark `ー` (U+30FC) sits outside that range and is
//! left as is, so a reading like `コーヒー` displays as `こーひー`.
//! Punctuation, the middle dot and iteration marks are also untouched.

/// First katakana letter that has a hiragana counterpart
const KATAKANA_START: u32 = 0x30A1;

/// Last katakana letter that has a hiragana counterpart
const KATAKANA_END: u32 = 0x30F6;

/// Distance between a katakana letter and its hiragana equivalent
const KANA_OFFSET: u32 = 0x60;

/// Convert a katakana reading to the hiragana used for display
#[must_use]
pub fn to_display_script(reading: &str) -> String {
    reading.chars().map(to_hiragana).collect()
}

fn to_hiragana(ch: char) -> char {
    let code = u32::from(ch);
    if (KATAKANA_START..=KATAKANA_END).contains(&code) {
        char::from_u32(code - KANA_OFFSET).unwrap_or(ch)
    } else {
        ch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_conversion() {
        assert_eq!(to_display_script("ニホンゴ"), "にほんご");
        assert_eq!(to_display_script("タベル"), "たべる");
    }

    #[test]
    fn test_range_edges() {
        assert_eq!(to_display_script("ァ"), "ぁ");
        assert_eq!(to_display_script("ヶ"), "ゖ");
        // U+30F7 (ヷ) has no hiragana counterpart
        assert_eq!(to_display_script("ヷ"), "ヷ");
    }

    #[test]
    fn test_long_vowel_mark_is_kept() {
        assert_eq!(to_display_script("コーヒー"), "こーひー");
    }

    #[test]
    fn test_non_katakana_passthrough() {
        assert_eq!(to_display_script("すでに"), "すでに");
        assert_eq!(to_display_script("ABC・、"), "ABC・、");
        assert_eq!(to_display_script(""), "");
    }
}
