//! Content extraction
//!
//! Selects the part of a page worth archiving. When the source names a
//! content container and the page has it, only that sub-tree is kept,
//! wrapped in a minimal document. Otherwise the whole page passes through.
//! Either way the output carries a provenance comment with the source URL,
//! right after the doctype when there is one, and declares UTF-8.

use crate::crawler::parser::extract_title;
use crate::policy::{SourceProfile, UrlPolicy};
use scraper::Html;
use url::Url;

/// How the archived body was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// The container matched by this selector was kept
    Container(String),
    /// The source archives whole pages
    WholePage,
    /// None of the source's selectors matched; the whole page was kept
    StructureMissing,
}

/// The normalized markup for one page
#[derive(Debug, Clone)]
pub struct Extraction {
    pub body: String,
    pub outcome: ExtractionOutcome,
}

impl Extraction {
    /// Returns true if the expected structure was absent
    pub fn is_fallback(&self) -> bool {
        self.outcome == ExtractionOutcome::StructureMissing
    }
}

/// Extracts the archivable markup of a page, looking the source up by URL
pub fn extract(policy: &UrlPolicy, url: &Url, raw_markup: &str) -> Extraction {
    extract_with_profile(policy.profile_for(url), url, raw_markup)
}

/// Extracts the archivable markup of a page for a known source
///
/// Never fails: a page lacking every configured container is returned
/// whole, flagged as [`ExtractionOutcome::StructureMissing`].
pub fn extract_with_profile(
    profile: Option<&SourceProfile>,
    url: &Url,
    raw_markup: &str,
) -> Extraction {
    let header = provenance_header(url);

    let selectors = match profile {
        Some(profile) if !profile.selectors.is_empty() => &profile.selectors,
        _ => {
            return Extraction {
                body: passthrough(&header, raw_markup),
                outcome: ExtractionOutcome::WholePage,
            }
        }
    };

    let document = Html::parse_document(raw_markup);
    for candidate in selectors {
        if let Some(element) = document.select(&candidate.selector).next() {
            let title = extract_title(&document).unwrap_or_default();
            let body = format!(
                "<!DOCTYPE html>\n{}\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
                header,
                escape_text(&title),
                element.html()
            );
            return Extraction {
                body,
                outcome: ExtractionOutcome::Container(candidate.text.clone()),
            };
        }
    }

    Extraction {
        body: passthrough(&header, raw_markup),
        outcome: ExtractionOutcome::StructureMissing,
    }
}

/// The whole page, re-declared as UTF-8, with the header after its doctype
fn passthrough(header: &str, raw_markup: &str) -> String {
    let markup = declare_utf8(raw_markup);

    match doctype_end(&markup) {
        Some(end) => format!("{}\n{}{}", &markup[..end], header, &markup[end..]),
        None => format!("{}\n{}", header, markup),
    }
}

/// Byte offset just past a leading `<!DOCTYPE ...>`
fn doctype_end(markup: &str) -> Option<usize> {
    let start = markup.len() - markup.trim_start().len();
    let rest = &markup[start..];
    if !rest.get(..9)?.eq_ignore_ascii_case("<!doctype") {
        return None;
    }
    rest.find('>').map(|close| start + close + 1)
}

/// Rewrites every `charset=` inside a `<meta>` tag to `utf-8`
///
/// Documents are always written as UTF-8, whatever code page the source
/// declared.
fn declare_utf8(markup: &str) -> String {
    const KEY: &str = "charset=";

    // ASCII lowercasing keeps byte offsets aligned with `markup`
    let lower = markup.to_ascii_lowercase();
    let mut out = String::with_capacity(markup.len());
    let mut copied = 0;
    let mut search = 0;

    while let Some(found) = lower[search..].find(KEY) {
        let mut value_start = search + found + KEY.len();
        search = value_start;
        if !inside_meta_tag(&lower[..value_start]) {
            continue;
        }

        if lower[value_start..].starts_with(|c| c == '"' || c == '\'') {
            value_start += 1;
        }
        let value_len = lower[value_start..]
            .find(|c: char| matches!(c, '"' | '\'' | ';' | '>' | '/') || c.is_ascii_whitespace())
            .unwrap_or(lower.len() - value_start);

        out.push_str(&markup[copied..value_start]);
        out.push_str("utf-8");
        copied = value_start + value_len;
        search = copied;
    }

    out.push_str(&markup[copied..]);
    out
}

fn inside_meta_tag(before: &str) -> bool {
    before
        .rfind('<')
        .is_some_and(|open| before[open..].starts_with("<meta") && !before[open..].contains('>'))
}

/// Builds the HTML comment recording where a document came from
///
/// `--` cannot appear inside an HTML comment, so it is percent-encoded.
pub fn provenance_header(url: &Url) -> String {
    format!("<!-- source-url: {} -->", url.as_str().replace("--", "-%2D"))
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
