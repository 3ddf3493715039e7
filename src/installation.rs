//! Game editions and installations
//!
//! An `Installation` owns its directory snapshot and registry. Two installations
//! (e.g. Diamond and Enhanced Edition) share nothing and can be scanned from
//! separate threads.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{AppConfig, DEFAULT_MODULES_SUBDIRECTORY};
use crate::error::{Result, VaultError};
use crate::logging::log_warning;
use crate::module::ModuleRegistry;
use crate::scanner::{discover_into, Directory};

// ============================================================================
// Editions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEdition {
    DiamondEdition,
    EnhancedEdition,
}

impl GameEdition {
    pub const ALL: [GameEdition; 2] = [GameEdition::EnhancedEdition, GameEdition::DiamondEdition];

    pub fn tag(&self) -> &'static str {
        match self {
            GameEdition::DiamondEdition => "diamond_edition",
            GameEdition::EnhancedEdition => "enhanced_edition",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GameEdition::DiamondEdition => "Diamond Edition",
            GameEdition::EnhancedEdition => "Enhanced Edition",
        }
    }

    /// Accepts `"diamond_edition"`, `"Diamond Edition"`, `"DIAMOND_EDITION"`, ...
    pub fn from_tag(tag: &str) -> Result<Self> {
        let normalized = tag.trim().to_lowercase().replace(|c: char| c == ' ' || c == '-', "_");
        Self::ALL
            .into_iter()
            .find(|e| e.tag() == normalized)
            .ok_or_else(|| VaultError::UnknownVersion(tag.to_string()))
    }

    /// Main executable, relative to the install root
    pub fn executable(&self) -> &'static str {
        match self {
            GameEdition::DiamondEdition => "nwmain.exe",
            GameEdition::EnhancedEdition => {
                if cfg!(windows) {
                    "bin/win32/nwmain.exe"
                } else {
                    "bin/linux-x86/nwmain-linux"
                }
            }
        }
    }
}

impl fmt::Display for GameEdition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Installation
// ============================================================================

/// One game installation and the modules known for it
#[derive(Debug)]
pub struct Installation {
    pub root: Directory,
    edition: Option<GameEdition>,
    /// Tag that failed to resolve, kept so the caller can see why `edition` is unset
    unknown_edition: Option<String>,
    modules_subdirectory: String,
    pub registry: ModuleRegistry,
}

impl Installation {
    /// Snapshot the install root. An unknown edition tag leaves the edition unset
    /// instead of failing; see `edition_status`.
    pub fn open(path: impl AsRef<Path>, edition_tag: &str) -> Result<Self> {
        let root = Directory::scan(path)?;
        let (edition, unknown_edition) = match GameEdition::from_tag(edition_tag) {
            Ok(edition) => (Some(edition), None),
            Err(e) => {
                log_warning(&e.to_string());
                (None, Some(edition_tag.to_string()))
            }
        };

        Ok(Self {
            root,
            edition,
            unknown_edition,
            modules_subdirectory: DEFAULT_MODULES_SUBDIRECTORY.to_string(),
            registry: ModuleRegistry::new(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let installation = Self::open(config.install_root(), &config.edition)?;
        Ok(installation.with_modules_subdirectory(&config.modules_subdirectory_name))
    }

    pub fn with_modules_subdirectory(mut self, name: &str) -> Self {
        self.modules_subdirectory = name.to_string();
        self
    }

    pub fn path(&self) -> &Path {
        &self.root.path
    }

    pub fn edition(&self) -> Option<GameEdition> {
        self.edition
    }

    /// The edition, or the `UnknownVersion` error recorded at `open`
    pub fn edition_status(&self) -> Result<GameEdition> {
        match (self.edition, &self.unknown_edition) {
            (Some(edition), _) => Ok(edition),
            (None, Some(tag)) => Err(VaultError::UnknownVersion(tag.clone())),
            (None, None) => Err(VaultError::UnknownVersion(String::new())),
        }
    }

    pub fn executable(&self) -> Option<PathBuf> {
        self.edition.map(|e| self.root.path.join(e.executable()))
    }

    pub fn modules_directory(&self) -> PathBuf {
        self.root.path.join(&self.modules_subdirectory)
    }

    /// Scan the modules folder into this installation's registry (permissive merge)
    pub fn discover(&mut self) -> Result<usize> {
        discover_into(&self.root.path, &self.modules_subdirectory, &mut self.registry)
    }
}
