use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, VaultError};
use crate::installation::GameEdition;
use crate::paths::resolve_home_relative;

/// Vault page listing every campaign and module series for NWN1
pub const DEFAULT_CATALOG_URL: &str =
    "https://neverwintervault.org/article/reference/campaigns-and-module-series-list-nwn1";

/// Conventional name of the folder holding `.mod` files in every NWN layout
pub const DEFAULT_MODULES_SUBDIRECTORY: &str = "modules";

/// Bounded timeout applied to every catalog request
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Per-OS Defaults
// ============================================================================

/// Default locations for one host OS, relative to `$HOME` unless absolute
#[derive(Debug, Clone, Copy)]
pub struct DefaultLayout {
    pub diamond_install: &'static str,
    pub diamond_local: &'static str,
    pub enhanced_install: &'static str,
    pub enhanced_local: &'static str,
}

pub const LINUX_LAYOUT: DefaultLayout = DefaultLayout {
    diamond_install: ".wine/drive_c/GOG Games/NWN Diamond",
    diamond_local: ".wine/drive_c/GOG Games/NWN Diamond",
    enhanced_install: ".steam/steam/steamapps/common/Neverwinter Nights",
    enhanced_local: ".local/share/Neverwinter Nights",
};

pub const WINDOWS_LAYOUT: DefaultLayout = DefaultLayout {
    diamond_install: "GOG Games/NWN Diamond",
    diamond_local: "GOG Games/NWN Diamond",
    enhanced_install: "C:/Program Files/steam/steamapps/common/Neverwinter Nights",
    enhanced_local: "Documents/Neverwinter Nights",
};

impl DefaultLayout {
    pub fn for_host() -> Self {
        if cfg!(windows) {
            WINDOWS_LAYOUT
        } else {
            LINUX_LAYOUT
        }
    }

    /// (install, local vault) for an edition
    pub fn paths_for(&self, edition: GameEdition) -> (&'static str, &'static str) {
        match edition {
            GameEdition::DiamondEdition => (self.diamond_install, self.diamond_local),
            GameEdition::EnhancedEdition => (self.enhanced_install, self.enhanced_local),
        }
    }
}

// ============================================================================
// Main App Config
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Edition tag, e.g. "diamond_edition"
    pub edition: String,
    pub install_path: PathBuf,
    pub local_vault_path: PathBuf,
    pub modules_subdirectory_name: String,
    /// Where downloaded payloads are written
    pub working_directory: PathBuf,
    pub registry_file: PathBuf,
    pub history_file: PathBuf,
    pub catalog_url: String,
    pub http_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_edition(GameEdition::DiamondEdition)
    }
}

impl AppConfig {
    /// Defaults for an edition on the host OS
    pub fn for_edition(edition: GameEdition) -> Self {
        let (install, local) = DefaultLayout::for_host().paths_for(edition);
        Self {
            edition: edition.tag().to_string(),
            install_path: PathBuf::from(install),
            local_vault_path: PathBuf::from(local),
            modules_subdirectory_name: DEFAULT_MODULES_SUBDIRECTORY.to_string(),
            working_directory: PathBuf::from("."),
            registry_file: vault_path!("modules_bin"),
            history_file: vault_path!("history.log"),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }

    pub fn get_path() -> PathBuf {
        vault_path!("config.json")
    }

    /// Load the config at the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::get_path()).unwrap_or_default()
    }

    /// Load a config file. A missing file yields defaults; a malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| VaultError::io(format!("reading {}", path.display()), e))?;
        serde_json::from_str(&content).map_err(|e| VaultError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| VaultError::io(format!("creating {}", parent.display()), e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| VaultError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| VaultError::io(format!("writing {}", path.display()), e))
    }

    /// Install root with relative paths resolved against `$HOME`
    pub fn install_root(&self) -> PathBuf {
        resolve_home_relative(&self.install_path)
    }

    pub fn local_vault_root(&self) -> PathBuf {
        resolve_home_relative(&self.local_vault_path)
    }

    /// Where acquired modules are extracted
    pub fn modules_directory(&self) -> PathBuf {
        self.install_root().join(&self.modules_subdirectory_name)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "install_path": "/games/nwn" }"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.install_path, PathBuf::from("/games/nwn"));
        assert_eq!(config.modules_subdirectory_name, "modules");
        assert_eq!(config.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);
        assert_eq!(config.modules_directory(), PathBuf::from("/games/nwn/modules"));
    }

    #[test]
    fn absent_file_is_default_but_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert_eq!(AppConfig::load_from(&missing).unwrap(), AppConfig::default());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::load_from(&broken),
            Err(VaultError::Config { .. })
        ));
    }

    #[test]
    fn save_then_load_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = AppConfig::for_edition(GameEdition::EnhancedEdition);
        config.http_timeout_secs = 5;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.edition, "enhanced_edition");
    }
}
