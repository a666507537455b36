//! HTML parsing for link discovery
//!
//! Links come from `<a href>` tags and canonical links and are resolved
//! against the page's final URL (after redirects), so relative links on a
//! redirected page point where the browser would send them.

use scraper::{Html, Selector};
use url::Url;

/// Link targets that never lead to a document
const SKIPPED_SCHEMES: [&str; 4] = ["javascript:", "mailto:", "tel:", "data:"];

/// Anchors (minus download links) and canonical links, in document order
const LINK_SELECTOR: &str = "a[href]:not([download]), link[rel='canonical'][href]";

/// Collects the followable links of a fetched page, in document order
///
/// Same-page anchors, download links and links with a non-document scheme
/// are dropped. Every kept link is absolute, http(s) and fragment-free.
///
/// ```
/// use lex_archiver::crawler::parse_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="L002.htm#art1">L2</a><a href="mailto:x@planalto.gov.br">x</a></body></html>"#;
/// let base_url = Url::parse("http://www.planalto.gov.br/ccivil_03/leis/L001.htm").unwrap();
/// assert_eq!(
///     parse_links(html, &base_url),
///     vec!["http://www.planalto.gov.br/ccivil_03/leis/L002.htm"]
/// );
/// ```
pub fn parse_links(html: &str, base_url: &Url) -> Vec<String> {
    extract_links(&Html::parse_document(html), base_url)
}

/// Text of the first non-blank `<title>`
pub(crate) fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .map(|title| title.text().collect::<String>().trim().to_string())
        .find(|title| !title.is_empty())
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse(LINK_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Joins `href` onto the page URL, or `None` when it is not worth following
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return None;
    }

    let mut resolved = base_url.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    resolved.set_fragment(None);

    Some(resolved.into())
}
