use std::sync::LazyLock;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

/// Elements whose text never counts as page content.
const DROPPED_ELEMENTS: [&str; 8] = [
    "script", "style", "svg", "noscript", "iframe", "meta", "link", "head",
];

static MAIN: LazyLock<Selector> = LazyLock::new(|| selector("main"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));
static TEXT_BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| selector("p, li, h1, h2, h3, h4, h5, h6"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("page unreachable: {0}")]
    Unavailable(String),

    #[error("page answered with status {0}")]
    Status(u16),
}

#[async_trait]
pub trait PageReader: Send + Sync {
    /// Fetches `url` and returns its readable text, one block per line.
    async fn read_text(&self, url: &str) -> Result<String, PageError>;
}

#[derive(Clone)]
pub struct WebPageReader {
    client: reqwest::Client,
}

impl WebPageReader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageReader for WebPageReader {
    async fn read_text(&self, url: &str) -> Result<String, PageError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PageError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PageError::Status(response.status().as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| PageError::Unavailable(e.to_string()))?;

        let text = extract_text(&html);
        tracing::debug!(url, chars = text.len(), "Read page content");
        Ok(text)
    }
}

fn is_dropped(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .chain(std::iter::once(**element))
        .filter_map(|node| node.value().as_element())
        .any(|e| DROPPED_ELEMENTS.contains(&e.name()))
}

/// Text of `element` without the text of dropped descendants.
fn block_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .take_while(|ancestor| *ancestor != *element)
            .filter_map(|ancestor| ancestor.value().as_element())
            .any(|e| DROPPED_ELEMENTS.contains(&e.name()));
        if !hidden {
            text.push_str(fragment);
        }
    }
    text
}

/// Paragraph, list and heading text of the page's `main` element (or
/// `body`), trimmed, with consecutive repeats collapsed.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Some(root) = document
        .select(&MAIN)
        .find(|e| !is_dropped(e))
        .or_else(|| document.select(&BODY).next())
    else {
        return String::new();
    };

    let mut blocks: Vec<String> = Vec::new();
    for element in root.select(&TEXT_BLOCKS) {
        if is_dropped(&element) {
            continue;
        }
        let text = block_text(element);
        let text = text.trim();
        if text.is_empty() || blocks.last().is_some_and(|last| last == text) {
            continue;
        }
        blocks.push(text.to_string());
    }

    blocks.join("\n")
}
