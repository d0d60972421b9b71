//! Plain-text rendering for the terminal
//!
//! Terminals have no ruby layout, so readings go in parentheses after the
//! word they belong to.

use kaiwa_core::{DisplaySegment, NotifyLevel, RenderBlock, RenderedMessage, Role, TutorMessage};

/// Render blocks as text, furigana inline
pub fn blocks_to_text(blocks: &[RenderBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            RenderBlock::Line {
                segments,
                break_after,
            } => {
                for segment in segments {
                    match segment {
                        DisplaySegment::Plain(text) => out.push_str(text),
                        DisplaySegment::Annotated { base, annotation } => {
                            out.push_str(base);
                            out.push('(');
                            out.push_str(annotation);
                            out.push(')');
                        }
                    }
                }
                if *break_after {
                    out.push('\n');
                }
            }
            RenderBlock::Expression { name, link } => match link {
                Some(link) => out.push_str(&format!("[{name}: {link}]")),
                None => out.push_str(&format!("[{name}]")),
            },
        }
    }
    out.trim_end_matches('\n').to_string()
}

/// Render a whole message with a speaker prefix
pub fn message_to_text(message: &RenderedMessage) -> String {
    let speaker = match message.role {
        Role::User => "you",
        Role::Assistant => "先生",
    };
    format!("{speaker}> {}", blocks_to_text(&message.blocks))
}

/// Whether rendering adds anything over the raw text
pub fn has_annotations(blocks: &[RenderBlock]) -> bool {
    blocks.iter().any(|block| match block {
        RenderBlock::Line { segments, .. } => segments
            .iter()
            .any(|s| matches!(s, DisplaySegment::Annotated { .. })),
        RenderBlock::Expression { .. } => true,
    })
}

/// Status line for tutor messages the REPL reports directly
pub fn status_line(msg: &TutorMessage) -> Option<String> {
    match msg {
        TutorMessage::Notify {
            level,
            title,
            message,
        } => {
            let tag = match level {
                NotifyLevel::Info => "info",
                NotifyLevel::Warning => "warning",
                NotifyLevel::Error => "error",
                NotifyLevel::Success => "ok",
            };
            Some(match title {
                Some(title) => format!("[{tag}] {title}: {message}"),
                None => format!("[{tag}] {message}"),
            })
        }
        TutorMessage::SessionInfo {
            backend,
            model,
            restored_messages,
        } => Some(format!(
            "Connected to {backend} ({model}), {restored_messages} messages restored"
        )),
        TutorMessage::HistoryCleared => Some("Conversation cleared".to_string()),
        TutorMessage::VocabularyUpdated { level, words } if *level >= 0 => Some(format!(
            "Vocabulary level {level}, {words} words in progress"
        )),
        TutorMessage::VocabularyUpdated { .. } => {
            Some("Vocabulary progress unavailable".to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_furigana_inline() {
        let blocks = vec![
            RenderBlock::Line {
                segments: vec![
                    DisplaySegment::annotated("日本語", "にほんご"),
                    DisplaySegment::Plain("です".to_string()),
                ],
                break_after: true,
            },
            RenderBlock::Expression {
                name: "happy".to_string(),
                link: None,
            },
            RenderBlock::Expression {
                name: "wave".to_string(),
                link: Some("w.gif".to_string()),
            },
        ];
        assert_eq!(
            blocks_to_text(&blocks),
            "日本語(にほんご)です\n[happy][wave: w.gif]"
        );
        assert!(has_annotations(&blocks));
    }

    #[test]
    fn test_plain_message() {
        let message = RenderedMessage {
            role: Role::User,
            blocks: vec![RenderBlock::Line {
                segments: vec![DisplaySegment::Plain("hello".to_string())],
                break_after: true,
            }],
        };
        assert_eq!(message_to_text(&message), "you> hello");
        assert!(!has_annotations(&message.blocks));
    }

    #[test]
    fn test_status_lines() {
        let msg = TutorMessage::Notify {
            level: NotifyLevel::Error,
            title: None,
            message: "Problem".to_string(),
        };
        assert_eq!(status_line(&msg).as_deref(), Some("[error] Problem"));
        assert!(status_line(&TutorMessage::Composing { active: true }).is_none());
        assert_eq!(
            status_line(&TutorMessage::VocabularyUpdated { level: -1, words: 0 }).as_deref(),
            Some("Vocabulary progress unavailable")
        );
    }
}
