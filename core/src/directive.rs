//! Inline Directive Segmentation
//!
//! The assistant can embed expression images in its replies:
//!
//! ```text
//! こんにちは<Image emotion=happy>元気ですか？
//! ```
//!
//! The grammar has two token kinds, literal text and `<Image emotion=NAME>`,
//! where NAME is everything up to the next `>`. There is no nesting. Syntax
//! that does not close (`<Image emotion=happy` with no `>`) stays literal.
//!
//! Literal runs are split into lines because furigana annotation works one
//! line at a time.

use serde::{Deserialize, Serialize};

/// Opening of a directive marker
pub const DIRECTIVE_OPEN: &str = "<Image emotion=";

/// Closing of a directive marker
pub const DIRECTIVE_CLOSE: char = '>';

/// A piece of a parsed message body
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentSegment {
    /// One line of literal text (without its newline)
    Text(String),
    /// An expression directive, by name
    Directive(String),
}

impl ContentSegment {
    /// Whether a surface should render a line break after this segment
    ///
    /// Every non-empty text line ends with a break. Empty lines do not, so a
    /// line followed directly by a directive does not get a doubled break.
    #[must_use]
    pub fn breaks_after(&self) -> bool {
        match self {
            Self::Text(text) => !text.is_empty(),
            Self::Directive(_) => false,
        }
    }
}

/// Render a directive marker for `name`
#[must_use]
pub fn marker(name: &str) -> String {
    format!("{DIRECTIVE_OPEN}{name}{DIRECTIVE_CLOSE}")
}

/// Split `content` into alternating literal and directive-name groups
///
/// Even indices are literal text, odd indices are directive names. The
/// result always has an odd length.
fn split_groups(content: &str) -> Vec<&str> {
    let mut groups = Vec::new();
    let mut rest = content;

    while let Some(start) = rest.find(DIRECTIVE_OPEN) {
        let after_open = &rest[start + DIRECTIVE_OPEN.len()..];
        let Some(end) = after_open.find(DIRECTIVE_CLOSE) else {
            // No `>` anywhere after this point, so no later opening can close either
            break;
        };
        groups.push(&rest[..start]);
        groups.push(&after_open[..end]);
        rest = &after_open[end + DIRECTIVE_CLOSE.len_utf8()..];
    }

    groups.push(rest);
    groups
}

/// Segment a message body into text lines and directives
pub fn segment(content: &str) -> Vec<ContentSegment> {
    let mut segments = Vec::new();

    for (idx, group) in split_groups(content).into_iter().enumerate() {
        if idx % 2 == 1 {
            segments.push(ContentSegment::Directive(group.to_string()));
        } else if !group.is_empty() {
            segments.extend(
                group
                    .split('\n')
                    .map(|line| ContentSegment::Text(line.to_string())),
            );
        }
    }

    segments
}

/// Rebuild a message body from its segments
///
/// Adjacent text segments came from the same literal run and were separated
/// by a newline.
#[must_use]
pub fn reconstruct(segments: &[ContentSegment]) -> String {
    let mut body = String::new();
    let mut previous_was_text = false;

    for segment in segments {
        match segment {
            ContentSegment::Text(text) => {
                if previous_was_text {
                    body.push('\n');
                }
                body.push_str(text);
                previous_was_text = true;
            }
            ContentSegment::Directive(name) => {
                body.push_str(&marker(name));
                previous_was_text = false;
            }
        }
    }

    body
}

/// Names of all directives in `content`, in order
#[must_use]
pub fn directive_names(content: &str) -> Vec<String> {
    split_groups(content)
        .into_iter()
        .skip(1)
        .step_by(2)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> ContentSegment {
        ContentSegment::Text(s.to_string())
    }

    fn directive(s: &str) -> ContentSegment {
        ContentSegment::Directive(s.to_string())
    }

    #[test]
    fn test_directive_between_text() {
        let segments = segment("こんにちは<Image emotion=happy>さようなら");
        assert_eq!(
            segments,
            vec![text("こんにちは"), directive("happy"), text("さようなら")]
        );
    }

    #[test]
    fn test_plain_text_only() {
        assert_eq!(segment("hello"), vec![text("hello")]);
        assert!(segment("").is_empty());
    }

    #[test]
    fn test_lines_are_split() {
        let segments = segment("一行目\n二行目<Image emotion=sad>\n三行目");
        assert_eq!(
            segments,
            vec![
                text("一行目"),
                text("二行目"),
                directive("sad"),
                text(""),
                text("三行目"),
            ]
        );
    }

    #[test]
    fn test_leading_and_adjacent_directives() {
        let segments = segment("<Image emotion=hello><Image emotion=happy>やあ");
        assert_eq!(
            segments,
            vec![directive("hello"), directive("happy"), text("やあ")]
        );
    }

    #[test]
    fn test_unclosed_directive_is_literal() {
        let content = "見て<Image emotion=happy";
        assert_eq!(segment(content), vec![text(content)]);
    }

    #[test]
    fn test_unclosed_after_valid_directive() {
        let segments = segment("<Image emotion=sad>まあ<Image emotion=oops");
        assert_eq!(
            segments,
            vec![directive("sad"), text("まあ<Image emotion=oops")]
        );
    }

    #[test]
    fn test_case_sensitive() {
        let content = "<image emotion=happy>";
        assert_eq!(segment(content), vec![text(content)]);
    }

    #[test]
    fn test_unknown_and_empty_names_still_produce_directives() {
        let segments = segment("<Image emotion=definitely-not-real><Image emotion=>");
        assert_eq!(segments, vec![directive("definitely-not-real"), directive("")]);
    }

    #[test]
    fn test_name_runs_to_first_close() {
        let segments = segment("<Image emotion=<Image emotion=x>>");
        assert_eq!(segments, vec![directive("<Image emotion=x"), text(">")]);
    }

    #[test]
    fn test_breaks_after() {
        assert!(text("line").breaks_after());
        assert!(!text("").breaks_after());
        assert!(!directive("happy").breaks_after());
    }

    #[test]
    fn test_reconstruct_round_trips() {
        let samples = [
            "",
            "plain",
            "a\nb\n\nc",
            "こんにちは<Image emotion=happy>さようなら",
            "<Image emotion=hello>\n最初\n<Image emotion=sad>",
            "trailing newline\n",
            "\n",
            "<Image emotion=a><Image emotion=b>",
            "broken <Image emotion=x and > later",
            "broken <Image emotion=never closes",
        ];
        for sample in samples {
            assert_eq!(reconstruct(&segment(sample)), sample, "sample: {sample:?}");
        }
    }

    #[test]
    fn test_segment_is_idempotent() {
        let content = "今日は<Image emotion=happy>\nいい天気";
        assert_eq!(segment(content), segment(content));
    }

    #[test]
    fn test_directive_names() {
        assert_eq!(
            directive_names("a<Image emotion=happy>b<Image emotion=sad>"),
            vec!["happy".to_string(), "sad".to_string()]
        );
        assert!(directive_names("nothing").is_empty());
    }
}
