//! Web page fetching and readable-text extraction

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::SourceError;

const FETCH_TIMEOUT_SECS: u64 = 30;
const TEXT_WIDTH: usize = 100;

/// Containers tried in order; the first one with text wins.
const CONTENT_SELECTORS: [&str; 3] = ["article", "main", "body"];

/// Fetches the HTML of a page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, SourceError>;
}

/// [`PageFetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    http: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mindmap-ingest/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| SourceError::FetchFailed {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { http })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        let failed = |reason: String| SourceError::FetchFailed {
            url: url.to_string(),
            reason,
        };

        info!(url, "Fetching web page");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let html = response.text().await.map_err(|e| failed(e.to_string()))?;
        debug!(url, bytes = html.len(), "Web page downloaded");
        Ok(html)
    }
}

/// Reduce an HTML page to readable markdown-like text.
///
/// Scripts and styles are dropped. Returns `None` when no readable text
/// remains.
pub fn extract_readable(html: &str) -> Option<String> {
    use scraper::{Html, Selector};

    let document = Html::parse_document(html);

    for css in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let Some(element) = document.select(&selector).next() else {
            continue;
        };

        let text = html_to_text(&strip_noise(&element.html()));
        if !text.is_empty() {
            debug!(container = css, chars = text.len(), "Readable content extracted");
            return Some(text);
        }
    }
    None
}

/// Remove `<script>`, `<style>` and `<noscript>` subtrees.
fn strip_noise(html: &str) -> String {
    use scraper::{Html, Selector};

    let fragment = Html::parse_fragment(html);
    let Ok(noise) = Selector::parse("script, style, noscript") else {
        return html.to_string();
    };

    let mut cleaned = fragment.root_element().html();
    for element in fragment.select(&noise) {
        cleaned = cleaned.replacen(&element.html(), "", 1);
    }
    cleaned
}

fn html_to_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), TEXT_WIDTH);

    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_preferred_over_body() {
        let html = r#"<html><body>
            <nav>Home | About</nav>
            <article><h1>Photosynthesis</h1><p>Plants convert light.</p></article>
            <footer>Copyright</footer>
        </body></html>"#;
        let text = extract_readable(html).unwrap();
        assert!(text.contains("Photosynthesis"));
        assert!(text.contains("Plants convert light."));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn test_main_used_without_article() {
        let html = "<html><body><header>Menu</header><main><p>Core idea</p></main></body></html>";
        let text = extract_readable(html).unwrap();
        assert!(text.contains("Core idea"));
        assert!(!text.contains("Menu"));
    }

    #[test]
    fn test_body_fallback_and_script_removed() {
        let html = "<html><body><p>Plain page</p><script>var tracking = 1;</script></body></html>";
        let text = extract_readable(html).unwrap();
        assert!(text.contains("Plain page"));
        assert!(!text.contains("tracking"));
    }

    #[test]
    fn test_empty_page_has_no_content() {
        assert_eq!(extract_readable("<html><body>   </body></html>"), None);
        assert_eq!(extract_readable(""), None);
        assert_eq!(
            extract_readable("<html><body><script>x()</script></body></html>"),
            None
        );
    }

    #[tokio::test]
    async fn test_invalid_url_is_fetch_failure() {
        let fetcher = HttpPageFetcher::new().unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert_eq!(err.kind(), "fetch_failed");
    }
}
