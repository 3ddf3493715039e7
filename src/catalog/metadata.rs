//! Structured data pulled from one vault page

use serde::{Deserialize, Serialize};

/// Title used when the download link carries no `title` attribute
pub const FALLBACK_TITLE: &str = "Unknown Module Title";

/// Metadata of a single catalog page. Transient: consumed by the acquisition
/// pipeline and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    /// Absolute download link
    pub href: String,
    pub title: String,
    /// Byte size as advertised by the page
    pub size: Option<String>,
    /// Subtype of the advertised MIME type, e.g. `zip` or `x-7z-compressed`
    pub compression: String,
    pub author: Option<String>,
    /// Digit groups of the "changed" date joined with `-`
    pub changed: Option<String>,
    pub project_version: Option<String>,
    pub game: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub tags: Vec<String>,
    pub required_projects: Vec<String>,
    pub related_projects: Vec<String>,
    pub requirements: Vec<String>,
}

impl CatalogMetadata {
    /// Advertised size in bytes, when the page gave a parseable one
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref().and_then(|s| s.trim().parse().ok())
    }
}

/// A module link on a catalog listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub title: String,
    pub url: String,
}

// ============================================================================
// Field Helpers
// ============================================================================

/// Split a MIME-like attribute (`application/zip; length=1048576`) into
/// (compression kind, size).
///
/// The kind is the text between the first `/` and the following `;`; the size is
/// whatever follows `length=`.
pub fn parse_mime_attribute(attr: &str) -> (String, Option<String>) {
    let compression = attr
        .split_once('/')
        .map(|(_, rest)| rest.split(';').next().unwrap_or(rest).trim().to_string())
        .unwrap_or_default();

    let size = attr.split_once("length=").map(|(_, rest)| {
        rest.split(|c: char| c == ';' || c.is_whitespace())
            .next()
            .unwrap_or(rest)
            .to_string()
    });

    (compression, size)
}

/// Keep only the digit groups of a date text, joined with `-`
///
/// `"Changed: Thursday, 12 March, 2020 - 21:38"` becomes `"12-2020-21-38"`.
pub fn normalize_date(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|group| !group.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Last non-empty segment of a path such as `/users/stefan`
pub fn last_path_segment(path: &str) -> Option<String> {
    path.rsplit('/')
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Split `"Label: value"` into a lower-cased key and trimmed value
pub fn split_labeled(text: &str) -> Option<(String, String)> {
    let (key, value) = text.split_once(':')?;
    Some((key.trim().to_lowercase(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_attribute_yields_kind_and_size() {
        let (kind, size) = parse_mime_attribute("application/zip; length=1048576");
        assert_eq!(kind, "zip");
        assert_eq!(size.as_deref(), Some("1048576"));

        let (kind, size) = parse_mime_attribute("application/x-7z-compressed");
        assert_eq!(kind, "x-7z-compressed");
        assert_eq!(size, None);

        let (kind, _) = parse_mime_attribute("");
        assert_eq!(kind, "");
    }

    #[test]
    fn dates_keep_digit_groups() {
        assert_eq!(
            normalize_date("Changed: Thursday, 12 March, 2020 - 21:38"),
            "12-2020-21-38"
        );
        assert_eq!(normalize_date("no digits"), "");
    }

    #[test]
    fn user_links_reduce_to_last_segment() {
        assert_eq!(last_path_segment("/users/stefan").as_deref(), Some("stefan"));
        assert_eq!(last_path_segment("/users/stefan/").as_deref(), Some("stefan"));
        assert_eq!(last_path_segment(""), None);
    }

    #[test]
    fn labeled_text_splits_on_first_colon() {
        assert_eq!(
            split_labeled("Game:\u{a0}Neverwinter Nights: Enhanced Edition"),
            Some(("game".into(), "Neverwinter Nights: Enhanced Edition".into()))
        );
        assert_eq!(split_labeled("no label"), None);
    }

    #[test]
    fn size_bytes_parses_advertised_size() {
        let metadata = CatalogMetadata {
            size: Some("1048576".into()),
            ..Default::default()
        };
        assert_eq!(metadata.size_bytes(), Some(1_048_576));
    }
}
