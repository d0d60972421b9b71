//! Message Rendering
//!
//! Combines directive segmentation and furigana annotation for a whole
//! message body. Surfaces receive a [`RenderedMessage`] and only need to
//! draw it.
//!
//! Only assistant replies may carry expression directives. Learner text is
//! split into lines and annotated as typed, so a learner writing
//! `<Image emotion=happy>` sees those characters.

use serde::{Deserialize, Serialize};

use crate::conversation::{Message, Role};
use crate::directive::{segment, ContentSegment};
use crate::expression::ExpressionCatalogue;
use crate::furigana::{annotate, DisplaySegment};
use crate::tokenizer::Tokenizer;

/// A drawable piece of a message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderBlock {
    /// One annotated line of text
    Line {
        /// Display segments of the line
        segments: Vec<DisplaySegment>,
        /// Whether a line break follows
        break_after: bool,
    },
    /// An expression image
    Expression {
        /// Name from the directive
        name: String,
        /// Image link, when the catalogue has one
        link: Option<String>,
    },
}

/// A message ready for display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    /// Who sent the message
    pub role: Role,
    /// Blocks in display order
    pub blocks: Vec<RenderBlock>,
}

/// Render a message body
pub fn render_content(
    content: &str,
    tokenizer: Option<&dyn Tokenizer>,
    catalogue: &ExpressionCatalogue,
) -> Vec<RenderBlock> {
    segment(content)
        .into_iter()
        .map(|seg| match seg {
            ContentSegment::Text(ref line) => RenderBlock::Line {
                segments: annotate(line, tokenizer),
                break_after: seg.breaks_after(),
            },
            ContentSegment::Directive(name) => {
                let link = catalogue.resolve(&name).map(str::to_string);
                if link.is_none() {
                    tracing::trace!(name = %name, "Expression has no image link");
                }
                RenderBlock::Expression { name, link }
            }
        })
        .collect()
}

/// Render text without looking for directives
pub fn render_text(content: &str, tokenizer: Option<&dyn Tokenizer>) -> Vec<RenderBlock> {
    if content.is_empty() {
        return Vec::new();
    }

    content
        .split('\n')
        .map(|line| RenderBlock::Line {
            segments: annotate(line, tokenizer),
            break_after: !line.is_empty(),
        })
        .collect()
}

/// Render a conversation message
pub fn render_message(
    message: &Message,
    tokenizer: Option<&dyn Tokenizer>,
    catalogue: &ExpressionCatalogue,
) -> RenderedMessage {
    let blocks = match message.role {
        Role::Assistant => render_content(&message.content, tokenizer, catalogue),
        Role::User => render_text(&message.content, tokenizer),
    };

    RenderedMessage {
        role: message.role,
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::LexiconTokenizer;

    fn catalogue() -> ExpressionCatalogue {
        [("happy", "https://img.example/happy.png"), ("sad", "")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_render_mixed_content() {
        let tokenizer = LexiconTokenizer::from_entries([("元気", "ゲンキ")]);
        let blocks = render_content(
            "こんにちは<Image emotion=happy>元気？",
            Some(&tokenizer),
            &catalogue(),
        );

        assert_eq!(
            blocks,
            vec![
                RenderBlock::Line {
                    segments: vec![DisplaySegment::Plain("こんにちは".to_string())],
                    break_after: true,
                },
                RenderBlock::Expression {
                    name: "happy".to_string(),
                    link: Some("https://img.example/happy.png".to_string()),
                },
                RenderBlock::Line {
                    segments: vec![
                        DisplaySegment::annotated("元気", "げんき"),
                        DisplaySegment::Plain("？".to_string()),
                    ],
                    break_after: true,
                },
            ]
        );
    }

    #[test]
    fn test_unknown_and_linkless_expressions() {
        let blocks = render_content(
            "<Image emotion=sad><Image emotion=mystery>",
            None,
            &catalogue(),
        );
        assert_eq!(
            blocks,
            vec![
                RenderBlock::Expression {
                    name: "sad".to_string(),
                    link: None,
                },
                RenderBlock::Expression {
                    name: "mystery".to_string(),
                    link: None,
                },
            ]
        );
    }

    #[test]
    fn test_empty_line_has_no_break() {
        let blocks = render_content("a\n\nb", None, &ExpressionCatalogue::new());
        let breaks: Vec<bool> = blocks
            .iter()
            .map(|b| matches!(b, RenderBlock::Line { break_after: true, .. }))
            .collect();
        assert_eq!(breaks, vec![true, false, true]);
    }

    #[test]
    fn test_user_text_is_not_segmented() {
        let rendered = render_message(
            &Message::user("見て<Image emotion=happy>ね"),
            None,
            &catalogue(),
        );
        assert_eq!(
            rendered.blocks,
            vec![RenderBlock::Line {
                segments: vec![DisplaySegment::Plain("見て<Image emotion=happy>ね".to_string())],
                break_after: true,
            }]
        );
    }

    #[test]
    fn test_assistant_directives_still_render() {
        let rendered = render_message(
            &Message::assistant("見て<Image emotion=happy>ね"),
            None,
            &catalogue(),
        );
        assert!(rendered
            .blocks
            .iter()
            .any(|b| matches!(b, RenderBlock::Expression { name, .. } if name == "happy")));
    }

    #[test]
    fn test_user_text_lines_are_annotated() {
        let tokenizer = LexiconTokenizer::from_entries([("元気", "ゲンキ")]);
        let blocks = render_text("元気\n\nです", Some(&tokenizer));
        assert_eq!(
            blocks,
            vec![
                RenderBlock::Line {
                    segments: vec![DisplaySegment::annotated("元気", "げんき")],
                    break_after: true,
                },
                RenderBlock::Line {
                    segments: Vec::new(),
                    break_after: false,
                },
                RenderBlock::Line {
                    segments: vec![DisplaySegment::Plain("です".to_string())],
                    break_after: true,
                },
            ]
        );
        assert!(render_text("", None).is_empty());
    }

    #[test]
    fn test_render_message_keeps_role() {
        let rendered = render_message(&Message::user("日本語"), None, &ExpressionCatalogue::new());
        assert_eq!(rendered.role, Role::User);
        assert_eq!(rendered.blocks.len(), 1);
    }
}
