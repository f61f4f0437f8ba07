/// Default embed colour when the config does not set one.
pub const DEFAULT_COLOR: u32 = 0x2f3136;

/// Structured rich-content body
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    pub fn add_field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    /// True when the embed would render as an empty box.
    pub fn is_empty(&self) -> bool {
        self.title.as_deref().map_or(true, str::is_empty)
            && self.description.as_deref().map_or(true, str::is_empty)
            && self.fields.is_empty()
            && self.footer.is_none()
    }

    /// The boxed one-line status embed used for bot feedback.
    pub fn status(text: &str) -> Self {
        Self::new().with_description(format!("`{}`", text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_embed_wraps_in_code() {
        let embed = Embed::status("Downloading...");
        assert_eq!(embed.description.as_deref(), Some("`Downloading...`"));
        assert!(!embed.is_empty());
    }

    #[test]
    fn test_empty_embed() {
        assert!(Embed::new().is_empty());
        assert!(Embed::new().with_color(1).is_empty());
        assert!(!Embed::new().add_field("a", "b", false).is_empty());
    }
}
