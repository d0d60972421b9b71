//! Script Classification
//!
//! Decides whether a character is a kanji. Only the two CJK Unified
//! Ideograph blocks that cover everyday Japanese text are recognized:
//!
//! - CJK Unified Ideographs (U+4E00–U+9FAF)
//! - CJK Unified Ideographs Extension A (U+3400–U+4DBF)
//!
//! Everything else, including characters outside the Basic Multilingual
//! Plane, is classified as non-ideographic.

use std::ops::RangeInclusive;

/// CJK Unified Ideographs
const CJK_UNIFIED: RangeInclusive<char> = '\u{4E00}'..='\u{9FAF}';

/// CJK Unified Ideographs Extension A
const CJK_EXTENSION_A: RangeInclusive<char> = '\u{3400}'..='\u{4DBF}';

/// Returns true if `ch` is an ideographic (kanji) character
#[must_use]
pub fn is_ideographic(ch: char) -> bool {
    CJK_UNIFIED.contains(&ch) || CJK_EXTENSION_A.contains(&ch)
}

/// Returns true if any character of `text` is ideographic
#[must_use]
pub fn contains_ideograph(text: &str) -> bool {
    text.chars().any(is_ideographic)
}
