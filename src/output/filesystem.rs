//! Filesystem document sink
//!
//! Documents land directly under the output root, one UTF-8 file per
//! archived page, named from the page's URL path.

use crate::config::FilenameStyle;
use crate::output::{DocumentSink, OutputError, OutputResult};
use crate::url::path_segments;
use std::path::PathBuf;
use url::Url;

/// Characters that are not allowed in file names on common filesystems
const UNSAFE_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// An archived page, ready to be written
#[derive(Debug, Clone)]
pub struct Document {
    pub source_url: Url,
    pub body: String,
    pub style: FilenameStyle,
}

impl Document {
    pub fn new(source_url: Url, body: String, style: FilenameStyle) -> Self {
        Self {
            source_url,
            body,
            style,
        }
    }

    /// Derives the output file name from the URL path
    ///
    /// # Rules
    ///
    /// - `LastTwoSegments`: `<parent>_<last>`, or `<last>` for a one-segment path
    /// - `LastSegment`: `<last>`
    /// - Unsafe characters and control characters are removed
    /// - `.htm` becomes `.html`; `.html` is appended when missing
    ///
    /// # Examples
    ///
    /// ```
    /// use lex_archiver::config::FilenameStyle;
    /// use lex_archiver::output::Document;
    /// use url::Url;
    ///
    /// let url = Url::parse("http://www.planalto.gov.br/ccivil_03/leis/L8078.htm").unwrap();
    /// let doc = Document::new(url, String::new(), FilenameStyle::LastTwoSegments);
    /// assert_eq!(doc.file_name().unwrap(), "leis_L8078.html");
    /// ```
    pub fn file_name(&self) -> OutputResult<String> {
        let segments = path_segments(&self.source_url);
        let raw = match (self.style, segments.as_slice()) {
            (_, []) => String::new(),
            (FilenameStyle::LastTwoSegments, [.., parent, last]) => format!("{}_{}", parent, last),
            (_, [.., last]) => last.to_string(),
        };

        let name: String = raw
            .chars()
            .filter(|c| !UNSAFE_CHARS.contains(c) && !c.is_control())
            .collect();
        let name = name.trim_matches(|c: char| c == '.' || c.is_whitespace());

        if name.is_empty() {
            return Err(OutputError::InvalidName(self.source_url.to_string()));
        }

        Ok(with_html_extension(name))
    }
}

fn with_html_extension(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".html") {
        name.to_string()
    } else if lower.ends_with(".htm") {
        format!("{}.html", &name[..name.len() - 4])
    } else {
        format!("{}.html", name)
    }
}

/// Writes documents as files under a root directory
#[derive(Debug, Clone)]
pub struct FsDocumentSink {
    root: PathBuf,
}

impl FsDocumentSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the root directory if it does not exist
    pub fn ensure_root(&self) -> OutputResult<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

impl DocumentSink for FsDocumentSink {
    fn write(&self, document: &Document) -> OutputResult<PathBuf> {
        let path = self.root.join(document.file_name()?);
        std::fs::write(&path, document.body.as_bytes())?;
        Ok(path)
    }
}
