//! Neverwinter Vault catalog access
//!
//! Address validation and the metadata types are always available. Page parsing
//! and the HTTP client need the `acquire` feature.
//!
//! # Example
//!
//! ```rust,ignore
//! use nwn_vault::catalog::CatalogClient;
//!
//! let metadata = CatalogClient::default()
//!     .extract("https://neverwintervault.org/project/nwn1/module/enigma-island")?;
//! println!("{} -> {} ({})", metadata.title, metadata.href, metadata.compression);
//! ```

mod address;
mod metadata;

#[cfg(feature = "acquire")]
mod client;
#[cfg(feature = "acquire")]
mod page;

pub use address::validate_address;
pub use metadata::{
    last_path_segment, normalize_date, parse_mime_attribute, split_labeled, CatalogEntry,
    CatalogMetadata, FALLBACK_TITLE,
};

#[cfg(feature = "acquire")]
pub use client::{extract, CatalogClient};
#[cfg(feature = "acquire")]
pub use page::{parse_listing, parse_page, DOWNLOAD_LINK_PATTERN, PROJECT_LINK_PATTERN};
