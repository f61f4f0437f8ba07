//! Page sources feeding a paginated view

use async_trait::async_trait;
use crate::application::errors::WidgetError;
use crate::domain::entities::Embed;
use crate::domain::traits::OutgoingMessage;

/// What a page source renders a page into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageContent {
    /// Plain text body
    Text(String),
    /// Structured rich-content body
    Embed(Embed),
    /// Explicit body and embed, either of which may be left out
    Directive {
        content: Option<String>,
        embed: Option<Embed>,
    },
}

impl From<String> for PageContent {
    fn from(text: String) -> Self {
        PageContent::Text(text)
    }
}

impl From<&str> for PageContent {
    fn from(text: &str) -> Self {
        PageContent::Text(text.to_string())
    }
}

impl From<Embed> for PageContent {
    fn from(embed: Embed) -> Self {
        PageContent::Embed(embed)
    }
}

impl PageContent {
    /// Turn rendered content into a message body, rejecting anything that would render empty.
    pub fn into_message(self) -> Result<OutgoingMessage, WidgetError> {
        let (content, embed) = match self {
            PageContent::Text(text) => (Some(text), None),
            PageContent::Embed(embed) => (None, Some(embed)),
            PageContent::Directive { content, embed } => (content, embed),
        };

        let content = content.filter(|c| !c.trim().is_empty());
        let embed = embed.filter(|e| !e.is_empty());

        if content.is_none() && embed.is_none() {
            return Err(WidgetError::RenderContractViolation(
                "page rendered to neither text nor an embed".to_string(),
            ));
        }

        Ok(OutgoingMessage {
            content,
            embed,
            ..OutgoingMessage::default()
        })
    }
}

/// Supplies and formats the pages of a paginated view
#[async_trait]
pub trait PageSource: Send + Sync {
    type Page: Send;

    /// Number of pages, when known. Unknown counts disable wrap-around.
    fn max_pages(&self) -> Option<usize>;

    /// Fetch page `index`; `WidgetError::PageOutOfRange` when there is no such page.
    async fn get_page(&self, index: usize) -> Result<Self::Page, WidgetError>;

    async fn format_page(&self, page: Self::Page) -> PageContent;
}

type Formatter<T> = Box<dyn Fn(usize, &[T]) -> PageContent + Send + Sync>;

/// Splits a list into pages of `per_page` entries
pub struct ListPageSource<T> {
    entries: Vec<T>,
    per_page: usize,
    formatter: Formatter<T>,
}

impl<T: Clone + Send + Sync + 'static> ListPageSource<T> {
    pub fn new<F>(entries: Vec<T>, per_page: usize, formatter: F) -> Self
    where
        F: Fn(usize, &[T]) -> PageContent + Send + Sync + 'static,
    {
        Self {
            entries,
            per_page: per_page.max(1),
            formatter: Box::new(formatter),
        }
    }
}

impl ListPageSource<PageContent> {
    /// One ready-made page per entry
    pub fn pages(pages: Vec<PageContent>) -> Self {
        Self::new(pages, 1, |_, page| {
            page.first()
                .cloned()
                .unwrap_or_else(|| PageContent::Text(String::new()))
        })
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> PageSource for ListPageSource<T> {
    type Page = (usize, Vec<T>);

    fn max_pages(&self) -> Option<usize> {
        Some(self.entries.len().div_ceil(self.per_page).max(1))
    }

    async fn get_page(&self, index: usize) -> Result<Self::Page, WidgetError> {
        let start = index * self.per_page;
        if start >= self.entries.len() && !(index == 0 && self.entries.is_empty()) {
            return Err(WidgetError::PageOutOfRange(index));
        }
        let end = (start + self.per_page).min(self.entries.len());
        Ok((index, self.entries[start..end].to_vec()))
    }

    async fn format_page(&self, page: Self::Page) -> PageContent {
        (self.formatter)(page.0, &page.1)
    }
}
