//! HTML parser for extracting links and metadata
//!
//! This module handles parsing rendered HTML to extract:
//! - Links to follow (from `<a href>` tags)
//! - Page title

use crate::url::{normalize, NormalizedUrl};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Normalized links in document order, duplicates removed
    pub links: Vec<NormalizedUrl>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, resolved against
///   `<base href>` when present, else against the document URL
///
/// The document URL is the address the browser actually ended up on, not
/// the normalized one: `/docs/` and `/docs` resolve `intro` differently.
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:`, `data:` links
/// - Fragment-only links (same page anchors)
/// - Anything that fails normalization (non-HTTP schemes, no host)
///
/// Scope filtering is left to the caller.
///
/// # Example
///
/// ```
/// use site_folio::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, document_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document);
    let base = extract_base(&document, document_url).unwrap_or_else(|| document_url.clone());
    let links = extract_links(&document, &base);

    ParsedPage { title, links }
}

/// Convenience function for extracting just the links from HTML
pub fn extract_links_simple(html: &str, document_url: &Url) -> Vec<NormalizedUrl> {
    parse_html(html, document_url).links
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Reads `<base href>`, resolved against the document URL
fn extract_base(document: &Html, document_url: &Url) -> Option<Url> {
    let base_selector = Selector::parse("base[href]").ok()?;
    let href = document
        .select(&base_selector)
        .next()?
        .value()
        .attr("href")?;
    document_url.join(href.trim()).ok()
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base: &Url) -> Vec<NormalizedUrl> {
    let mut links: Vec<NormalizedUrl> = Vec::new();
    let mut seen: HashSet<NormalizedUrl> = HashSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(url) = resolve_link(href, base) {
                if seen.insert(url.clone()) {
                    links.push(url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to a normalized URL
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, base: &Url) -> Option<NormalizedUrl> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute = base.join(href).ok()?;
    match normalize(absolute.as_str(), None) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::trace!("Dropping link '{}': {}", href, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    fn link_strings(html: &str) -> Vec<String> {
        parse_html(html, &base_url())
            .links
            .iter()
            .map(|u| u.to_string())
            .collect()
    }

    #[test]
    fn test_extract_title() {
        let html = r#"<html><head><title>  Test Page  </title></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let html = r#"<html><head></head><body></body></html>"#;
        let parsed = parse_html(html, &base_url());
        assert_eq!(parsed.title, None);
    }

    #[test]
    fn test_extract_absolute_link() {
        let html = r#"<html><body><a href="https://other.com/page">Link</a></body></html>"#;
        assert_eq!(link_strings(html), vec!["https://other.com/page"]);
    }

    #[test]
    fn test_extract_relative_links() {
        let html = r#"<html><body><a href="/other/">A</a><a href="sibling">B</a></body></html>"#;
        assert_eq!(
            link_strings(html),
            vec!["https://example.com/other", "https://example.com/sibling"]
        );
    }

    #[test]
    fn test_fragment_stripped_and_deduplicated() {
        let html = r#"<html><body><a href="/a#top">A</a><a href="/a">A again</a><a href="/a/">A slash</a></body></html>"#;
        assert_eq!(link_strings(html), vec!["https://example.com/a"]);
    }

    #[test]
    fn test_skip_special_schemes() {
        let html = r#"
            <html><body>
                <a href="javascript:void(0)">JS</a>
                <a href="JavaScript:alert(1)">JS upper</a>
                <a href="mailto:test@example.com">Email</a>
                <a href="tel:+1234567890">Call</a>
                <a href="data:text/html,<h1>Test</h1>">Data</a>
                <a href="ftp://example.com/file">FTP</a>
            </body></html>
        "#;
        assert!(link_strings(html).is_empty());
    }

    #[test]
    fn test_skip_download_link() {
        let html = r#"<html><body><a href="/file.pdf" download>Download</a></body></html>"#;
        assert!(link_strings(html).is_empty());
    }

    #[test]
    fn test_skip_fragment_only() {
        let html = r##"<html><body><a href="#section">Jump</a></body></html>"##;
        assert!(link_strings(html).is_empty());
    }

    #[test]
    fn test_follow_nofollow_links() {
        let html = r#"<html><body><a href="/page2" rel="nofollow">Link</a></body></html>"#;
        assert_eq!(link_strings(html), vec!["https://example.com/page2"]);
    }

    #[test]
    fn test_base_href_is_honoured() {
        let html = r#"<html><head><base href="/docs/"></head><body><a href="intro">Intro</a></body></html>"#;
        assert_eq!(link_strings(html), vec!["https://example.com/docs/intro"]);
    }

    #[test]
    fn test_directory_document_url() {
        let html = r#"<html><body><a href="intro">Intro</a></body></html>"#;
        let dir = Url::parse("https://example.com/docs/").unwrap();
        let links: Vec<String> = parse_html(html, &dir)
            .links
            .iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(links, vec!["https://example.com/docs/intro"]);
    }

    #[test]
    fn test_query_kept() {
        let html = r#"<html><body><a href="/search?q=a&amp;page=2">Next</a></body></html>"#;
        assert_eq!(
            link_strings(html),
            vec!["https://example.com/search?q=a&page=2"]
        );
    }

    #[test]
    fn test_document_order_preserved() {
        let html = r#"<html><body><a href="/c">C</a><a href="/a">A</a><a href="/b">B</a></body></html>"#;
        assert_eq!(
            link_strings(html),
            vec![
                "https://example.com/c",
                "https://example.com/a",
                "https://example.com/b"
            ]
        );
    }

    #[test]
    fn test_repeated_links_keep_first_occurrence() {
        let mut html = String::from("<html><body>");
        for round in 0..4 {
            for i in 0..500 {
                let href = if round % 2 == 0 {
                    format!("/p{}", i)
                } else {
                    format!("/p{}/#r{}", 499 - i, round)
                };
                html.push_str(&format!(r#"<a href="{}">x</a>"#, href));
            }
        }
        html.push_str("</body></html>");

        let links = link_strings(&html);
        assert_eq!(links.len(), 500);
        assert_eq!(links[0], "https://example.com/p0");
        assert_eq!(links[499], "https://example.com/p499");
    }
}
