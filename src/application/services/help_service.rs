//! Help rendering over the live extension and command tables

use crate::domain::entities::{Command, Embed};
use crate::extensions::trait_def::ExtensionInfo;

const DOT: &str = "•";

/// Builds help embeds
pub struct HelpService {
    title: String,
    prefix: String,
    color: u32,
    blacklist: Vec<String>,
}

/// What `help <query>` resolved to
pub enum HelpTopic<'a> {
    Extension(&'a ExtensionInfo),
    Command(&'a Command),
    Missing(&'a str),
}

impl HelpService {
    pub fn new(title: impl Into<String>, prefix: impl Into<String>, color: u32, blacklist: &[String]) -> Self {
        Self {
            title: title.into(),
            prefix: prefix.into(),
            color,
            blacklist: blacklist.iter().map(|b| b.to_lowercase()).collect(),
        }
    }

    fn listed(&self, info: &ExtensionInfo) -> bool {
        !info.hidden && !self.blacklist.contains(&info.name.to_lowercase())
    }

    /// One field per visible extension
    pub fn overview(&self, extensions: &[ExtensionInfo]) -> Embed {
        let mut embed = Embed::new().with_title(&self.title).with_color(self.color);
        for info in extensions.iter().filter(|i| self.listed(i)) {
            embed = embed.add_field(
                &info.name,
                format!("{} `{}help {}`", DOT, self.prefix, info.name.to_lowercase()),
                false,
            );
        }
        embed
    }

    /// Find the extension (by display or raw name) a query refers to
    pub fn find_extension<'a>(&self, extensions: &'a [ExtensionInfo], query: &str) -> Option<&'a ExtensionInfo> {
        let query = query.to_lowercase();
        extensions
            .iter()
            .filter(|i| self.listed(i))
            .find(|i| i.name.to_lowercase() == query || i.raw_name.to_lowercase() == query)
    }

    pub fn render(&self, topic: HelpTopic<'_>) -> Embed {
        match topic {
            HelpTopic::Extension(info) => self.extension_help(info),
            HelpTopic::Command(command) => self.command_help(command),
            HelpTopic::Missing(query) => Embed::new()
                .with_description(format!("**Error:** `No command called \"{}\" found.`", query))
                .with_color(self.color),
        }
    }

    fn extension_help(&self, info: &ExtensionInfo) -> Embed {
        let commands = if info.commands.is_empty() {
            "No Commands.".to_string()
        } else {
            info.commands.iter().map(|c| format!("`{}`", c)).collect::<Vec<_>>().join(", ")
        };

        let mut embed = Embed::new()
            .with_title(format!("**{}**", info.name))
            .with_description(commands)
            .with_color(self.color);
        if let Some(description) = &info.description {
            embed = embed.with_footer(description);
        }
        embed
    }

    fn command_help(&self, command: &Command) -> Embed {
        let name = format!("`{}{}`", self.prefix, command.name);
        let mut embed = Embed::new().with_title(&name).with_color(self.color);

        if let Some(usage) = &command.usage {
            embed = embed.add_field("Usage:", format!("`{}{} {}`", self.prefix, command.name, usage), false);
        }
        if let Some(description) = &command.description {
            embed = embed.add_field("Description:", description, false);
        }
        if !command.aliases.is_empty() {
            let aliases: Vec<String> = command.aliases.iter().map(|a| format!("`{}`", a)).collect();
            embed = embed.add_field("Aliases:", aliases.join(", "), false);
        }
        embed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ExtensionKind;

    fn info(raw: &str, name: &str, hidden: bool, commands: &[&str]) -> ExtensionInfo {
        ExtensionInfo {
            raw_name: raw.to_string(),
            kind: ExtensionKind::Cog,
            name: name.to_string(),
            description: None,
            hidden,
            commands: commands.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn service() -> HelpService {
        HelpService::new("rick-bot", "!", 0, &["Music".to_string()])
    }

    #[test]
    fn test_overview_skips_hidden_and_blacklisted() {
        let extensions = vec![
            info("installer", "Installer", true, &["install"]),
            info("music", "Music", false, &["play"]),
            info("greet", "Greeter", false, &["hello"]),
        ];
        let embed = service().overview(&extensions);

        assert_eq!(embed.fields.len(), 1);
        assert_eq!(embed.fields[0].name, "Greeter");
        assert_eq!(embed.fields[0].value, "• `!help greeter`");
    }

    #[test]
    fn test_extension_lookup_by_either_name() {
        let extensions = vec![info("greet", "Greeter", false, &[])];
        let s = service();
        assert!(s.find_extension(&extensions, "GREETER").is_some());
        assert!(s.find_extension(&extensions, "greet").is_some());

        let embed = s.render(HelpTopic::Extension(&extensions[0]));
        assert_eq!(embed.description.as_deref(), Some("No Commands."));
    }

    #[test]
    fn test_command_help_fields() {
        let command = Command::new("install")
            .with_usage("<repo>")
            .with_description("Install a cog or feature")
            .with_aliases(vec!["add".to_string()]);
        let embed = service().render(HelpTopic::Command(&command));

        assert_eq!(embed.title.as_deref(), Some("`!install`"));
        let names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Usage:", "Description:", "Aliases:"]);
        assert_eq!(embed.fields[0].value, "`!install <repo>`");
    }
}
