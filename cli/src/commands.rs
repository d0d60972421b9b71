//! REPL command parsing
//!
//! Lines starting with `/` are commands; anything else is said to the tutor.

/// A parsed input line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Send text to the tutor
    Say(String),
    /// Show the rest of the current reply
    Skip,
    /// List commands
    Help,
    /// Empty the conversation
    Clear,
    /// Leave
    Quit,
    /// Set the biography; empty clears it
    Bio(String),
    /// Link an expression name to an image
    Expression {
        /// Expression name
        name: String,
        /// Image link
        link: String,
    },
    /// List expressions
    Expressions,
    /// Print the system instruction
    Prompt,
    /// Store the OpenAI key
    Key(String),
    /// Store the WaniKani key and refresh progress
    WaniKani(String),
    /// Anything starting with `/` we don't know
    Unknown(String),
}

/// Help text for `/help`
pub const HELP: &str = "\
Commands:
  /help                      show this help
  /skip (or empty line)      show the rest of the reply
  /clear                     start a new conversation
  /bio [text]                tell the tutor about yourself (no text clears)
  /expression <name> <link>  set the image for an expression
  /expressions               list expressions
  /prompt                    print the system instruction
  /key <openai-key>          save your OpenAI key
  /wanikani <api-key>        save your WaniKani key and load your progress
  /quit                      leave";

/// Parse one line of input
#[must_use]
pub fn parse(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Skip;
    }

    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Say(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "help" | "h" | "?" => Command::Help,
        "skip" => Command::Skip,
        "clear" => Command::Clear,
        "quit" | "exit" | "q" => Command::Quit,
        "bio" => Command::Bio(arg.to_string()),
        "expressions" => Command::Expressions,
        "expression" => match arg.split_once(char::is_whitespace) {
            Some((name, link)) => Command::Expression {
                name: name.to_string(),
                link: link.trim().to_string(),
            },
            None => Command::Unknown(trimmed.to_string()),
        },
        "prompt" => Command::Prompt,
        "key" if !arg.is_empty() => Command::Key(arg.to_string()),
        "wanikani" if !arg.is_empty() => Command::WaniKani(arg.to_string()),
        _ => Command::Unknown(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_is_said() {
        assert_eq!(parse("元気です\n"), Command::Say("元気です".to_string()));
        assert_eq!(parse("  はい"), Command::Say("  はい".to_string()));
    }

    #[test]
    fn test_blank_line_skips() {
        assert_eq!(parse(""), Command::Skip);
        assert_eq!(parse("   "), Command::Skip);
        assert_eq!(parse("/skip"), Command::Skip);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("/help"), Command::Help);
        assert_eq!(parse("/clear"), Command::Clear);
        assert_eq!(parse("/quit"), Command::Quit);
        assert_eq!(parse("/prompt"), Command::Prompt);
        assert_eq!(parse("/expressions"), Command::Expressions);
    }

    #[test]
    fn test_bio() {
        assert_eq!(
            parse("/bio 大学生です。猫が好き"),
            Command::Bio("大学生です。猫が好き".to_string())
        );
        assert_eq!(parse("/bio"), Command::Bio(String::new()));
    }

    #[test]
    fn test_expression() {
        assert_eq!(
            parse("/expression happy https://example.com/h.png"),
            Command::Expression {
                name: "happy".to_string(),
                link: "https://example.com/h.png".to_string(),
            }
        );
        assert!(matches!(parse("/expression happy"), Command::Unknown(_)));
    }

    #[test]
    fn test_keys_require_argument() {
        assert_eq!(parse("/key sk-123"), Command::Key("sk-123".to_string()));
        assert_eq!(parse("/wanikani abc"), Command::WaniKani("abc".to_string()));
        assert!(matches!(parse("/key"), Command::Unknown(_)));
        assert!(matches!(parse("/nope"), Command::Unknown(_)));
    }
}
