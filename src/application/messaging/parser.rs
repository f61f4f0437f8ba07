//! Message parser - Finds a command invocation in raw message text

use once_cell::sync::Lazy;
use regex_lite::Regex;

static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<@!?(\d+)>").expect("mention pattern is valid"));

/// A command name and its arguments, cut out of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Lowercased command name
    pub name: String,
    /// Name exactly as typed
    pub invoked_with: String,
    pub args: Vec<String>,
    /// Prefix the message actually used
    pub prefix: String,
}

/// Recognises the configured prefix or a mention of the bot
pub struct MessageParser {
    command_prefix: String,
    bot_id: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>, bot_id: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
            bot_id: bot_id.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.command_prefix
    }

    /// Parse `text`, returning `None` when it is not a command invocation
    pub fn parse(&self, text: &str) -> Option<Invocation> {
        let (prefix, rest) = self.strip_prefix(text)?;

        // Whitespace after the prefix is allowed.
        let mut parts = rest.trim_start().split_whitespace();
        let invoked_with = parts.next()?.to_string();
        let args = parts.map(str::to_string).collect();

        Some(Invocation {
            name: invoked_with.to_lowercase(),
            invoked_with,
            args,
            prefix,
        })
    }

    fn strip_prefix<'a>(&self, text: &'a str) -> Option<(String, &'a str)> {
        if let Some(found) = MENTION.captures(text) {
            let whole = found.get(0)?;
            if found.get(1).map(|id| id.as_str()) == Some(self.bot_id.as_str()) {
                return Some((whole.as_str().to_string(), &text[whole.end()..]));
            }
        }

        if self.command_prefix.is_empty() {
            return None;
        }

        // Compare by characters: case folding may change the byte length.
        let count = self.command_prefix.chars().count();
        let end = text.char_indices().nth(count).map_or(text.len(), |(i, _)| i);
        let head = &text[..end];
        if head.chars().count() == count && head.to_lowercase() == self.command_prefix.to_lowercase() {
            return Some((head.to_string(), &text[end..]));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> MessageParser {
        MessageParser::new("rick ", "999")
    }

    #[test]
    fn test_prefix_is_case_insensitive() {
        let inv = parser().parse("RICK Install https://example.com/x.git").unwrap();
        assert_eq!(inv.name, "install");
        assert_eq!(inv.invoked_with, "Install");
        assert_eq!(inv.args, vec!["https://example.com/x.git".to_string()]);
        assert_eq!(inv.prefix, "RICK ");
    }

    #[test]
    fn test_non_ascii_prefix_is_case_insensitive() {
        let p = MessageParser::new("ñ!", "999");
        let inv = p.parse("Ñ!help").unwrap();
        assert_eq!(inv.name, "help");
        assert_eq!(inv.prefix, "Ñ!");
        assert!(p.parse("Ñ").is_none());
    }

    #[test]
    fn test_whitespace_after_prefix_is_stripped() {
        let inv = MessageParser::new("!", "999").parse("!   help   me").unwrap();
        assert_eq!(inv.name, "help");
        assert_eq!(inv.args, vec!["me".to_string()]);
    }

    #[test]
    fn test_mention_works_as_prefix() {
        let p = parser();
        assert_eq!(p.parse("<@999> help").unwrap().name, "help");
        assert_eq!(p.parse("<@!999>help").unwrap().name, "help");
        assert!(p.parse("<@123> help").is_none());
    }

    #[test]
    fn test_plain_text_is_not_a_command() {
        let p = parser();
        assert!(p.parse("hello there").is_none());
        assert!(p.parse("rick ").is_none());
        assert!(p.parse("").is_none());
    }
}
