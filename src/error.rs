//! Error types shared by discovery, acquisition and the registry

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Scan target does not exist
    #[error("directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    /// Catalog address rejected before any network access
    #[error("invalid catalog address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Transport failure, timeout or non-success HTTP status
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("unknown compression format: '{0}'")]
    UnknownCompressionFormat(String),

    #[error("unrecognized version of Neverwinter Nights: '{0}'")]
    UnknownVersion(String),

    /// Catalog page carries no download link
    #[error("no download link found on {page}")]
    AnchorNotFound { page: String },

    #[error("failed to extract {}: {reason}", archive.display())]
    Extraction { archive: PathBuf, reason: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Registry snapshot could not be written or read back
    #[error("registry snapshot {}: {reason}", path.display())]
    Registry { path: PathBuf, reason: String },

    #[error("config file {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl VaultError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        VaultError::Io {
            context: context.into(),
            source,
        }
    }

    /// Kinds that abort an acquisition (every kind except an unknown edition,
    /// which only degrades the owning installation).
    pub fn is_acquisition_failure(&self) -> bool {
        !matches!(self, VaultError::UnknownVersion(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = VaultError::DirectoryNotFound {
            path: PathBuf::from("/nowhere/nwn"),
        };
        assert_eq!(err.to_string(), "directory not found: /nowhere/nwn");

        let err = VaultError::UnknownCompressionFormat("octet-stream".into());
        assert!(err.to_string().contains("octet-stream"));
    }

    #[test]
    fn unknown_version_does_not_abort_acquisition() {
        assert!(!VaultError::UnknownVersion("platinum".into()).is_acquisition_failure());
        assert!(VaultError::Cancelled.is_acquisition_failure());
    }
}
