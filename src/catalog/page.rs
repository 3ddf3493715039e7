//! Vault page parsing
//!
//! A vault project page is an HTML document made of labeled field blocks
//! (`<div class="field field-name-field-tags">` with a `Tags:` label and one
//! `.field-item` per value). Blocks missing from a page are skipped.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::metadata::{
    last_path_segment, normalize_date, parse_mime_attribute, split_labeled, CatalogEntry,
    CatalogMetadata, FALLBACK_TITLE,
};
use crate::error::{Result, VaultError};

/// Substring identifying the payload download link
pub const DOWNLOAD_LINK_PATTERN: &str = "/modules/";

/// Substring identifying project pages on a listing
pub const PROJECT_LINK_PATTERN: &str = "/project/";

const SUBMITTED_BY_BLOCK: &str = ".field-name-submitted-by";
const CHANGED_DATE_BLOCK: &str = ".field-name-changed-date";

/// Single-value blocks
#[derive(Debug, Clone, Copy)]
enum SingleField {
    ProjectVersion,
    Game,
    Category,
    Language,
}

const SINGLE_FIELDS: &[(&str, SingleField)] = &[
    (".field-name-field-project-version", SingleField::ProjectVersion),
    (".field-name-field-game", SingleField::Game),
    (".field-name-field-category", SingleField::Category),
    (".field-name-field-language", SingleField::Language),
];

/// Multi-value blocks
#[derive(Debug, Clone, Copy)]
enum MultiField {
    Requirements,
    Tags,
    RelatedProjects,
    RequiredProjects,
}

const MULTI_FIELDS: &[(&str, MultiField)] = &[
    (".field-name-field-requirements", MultiField::Requirements),
    (".field-name-field-tags", MultiField::Tags),
    (".field-name-field-related-projects", MultiField::RelatedProjects),
    (".field-name-field-required-projects", MultiField::RequiredProjects),
];

// ============================================================================
// Selector Helpers
// ============================================================================

fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Whitespace-collapsed text of an element
fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Site root of the page (`https://host[:port]/`)
fn site_root(page_url: &Url) -> Url {
    page_url.join("/").unwrap_or_else(|_| page_url.clone())
}

// ============================================================================
// Detail Page
// ============================================================================

/// Parse a vault detail page fetched from `page_url`.
///
/// Fails with `AnchorNotFound` when the page has no download link.
pub fn parse_page(html: &str, page_url: &Url) -> Result<CatalogMetadata> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let anchor = select_all(root, "a[href]")
        .into_iter()
        .find(|a| {
            a.value()
                .attr("href")
                .is_some_and(|href| href.contains(DOWNLOAD_LINK_PATTERN))
        })
        .ok_or_else(|| VaultError::AnchorNotFound {
            page: page_url.to_string(),
        })?;

    let raw_href = anchor.value().attr("href").unwrap_or_default();
    let href = site_root(page_url)
        .join(raw_href)
        .map_err(|e| VaultError::InvalidAddress {
            address: raw_href.to_string(),
            reason: e.to_string(),
        })?;

    let (compression, size) = parse_mime_attribute(anchor.value().attr("type").unwrap_or_default());

    let mut metadata = CatalogMetadata {
        href: href.to_string(),
        title: anchor
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(FALLBACK_TITLE)
            .to_string(),
        size,
        compression,
        ..Default::default()
    };

    if let Some(block) = select_first(root, SUBMITTED_BY_BLOCK) {
        metadata.author = select_first(block, "[about]")
            .and_then(|user| user.value().attr("about"))
            .and_then(last_path_segment);
    }

    if let Some(block) = select_first(root, CHANGED_DATE_BLOCK) {
        let date = normalize_date(&text_of(block));
        metadata.changed = Some(date).filter(|d| !d.is_empty());
    }

    for (css, field) in SINGLE_FIELDS {
        let Some(block) = select_first(root, css) else {
            continue;
        };
        let Some((_, value)) = split_labeled(&text_of(block)) else {
            continue;
        };
        let slot = match field {
            SingleField::ProjectVersion => &mut metadata.project_version,
            SingleField::Game => &mut metadata.game,
            SingleField::Category => &mut metadata.category,
            SingleField::Language => &mut metadata.language,
        };
        *slot = Some(value).filter(|v| !v.is_empty());
    }

    for (css, field) in MULTI_FIELDS {
        let Some(block) = select_first(root, css) else {
            continue;
        };
        let values = block_values(block);
        let slot = match field {
            MultiField::Requirements => &mut metadata.requirements,
            MultiField::Tags => &mut metadata.tags,
            MultiField::RelatedProjects => &mut metadata.related_projects,
            MultiField::RequiredProjects => &mut metadata.required_projects,
        };
        *slot = values;
    }

    Ok(metadata)
}

/// Every value of a multi-value block: one per `.field-item`, or the
/// comma-separated text after the label when the block has no items.
fn block_values(block: ElementRef<'_>) -> Vec<String> {
    let items: Vec<String> = select_all(block, ".field-item")
        .into_iter()
        .map(text_of)
        .filter(|t| !t.is_empty())
        .collect();
    if !items.is_empty() {
        return items;
    }

    split_labeled(&text_of(block))
        .map(|(_, value)| {
            value
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Listing Page
// ============================================================================

/// Project links on a listing page, absolute, first occurrence wins
pub fn parse_listing(html: &str, page_url: &Url) -> Vec<CatalogEntry> {
    let document = Html::parse_document(html);
    let root = site_root(page_url);
    let mut entries: Vec<CatalogEntry> = Vec::new();

    for anchor in select_all(document.root_element(), "a[href]") {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(PROJECT_LINK_PATTERN) {
            continue;
        }
        let title = text_of(anchor);
        let Ok(url) = root.join(href) else {
            continue;
        };
        let url = url.to_string();
        if title.is_empty() || entries.iter().any(|e| e.url == url) {
            continue;
        }
        entries.push(CatalogEntry { title, url });
    }

    entries
}
