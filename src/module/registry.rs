//! The working set of known modules

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::ModuleRecord;
use crate::error::{Result, VaultError};

/// Ordered collection of module records owned by one discovery/acquisition session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleRegistry {
    modules: Vec<ModuleRecord>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(modules: Vec<ModuleRecord>) -> Self {
        Self { modules }
    }

    /// Insert `candidate` unless an identity-equal record is already present.
    ///
    /// Used by remote acquisition: catalog entries must not duplicate what the
    /// user already owns. Returns true if inserted.
    pub fn merge(&mut self, candidate: ModuleRecord) -> bool {
        if self.contains(&candidate) {
            return false;
        }
        self.modules.push(candidate);
        true
    }

    /// Insert unconditionally. Used by local discovery, where files on disk are ground truth.
    pub fn merge_always(&mut self, candidate: ModuleRecord) {
        self.modules.push(candidate);
    }

    /// Remove every record identity-equal to `module`. Returns true if any was removed.
    pub fn remove(&mut self, module: &ModuleRecord) -> bool {
        let before = self.modules.len();
        self.modules.retain(|m| m != module);
        self.modules.len() != before
    }

    pub fn contains(&self, module: &ModuleRecord) -> bool {
        self.modules.iter().any(|m| m == module)
    }

    pub fn find_by_title(&self, title: &str) -> Option<&ModuleRecord> {
        self.modules.iter().find(|m| m.title == title)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn records(&self) -> &[ModuleRecord] {
        &self.modules
    }

    pub fn into_records(self) -> Vec<ModuleRecord> {
        self.modules
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Write the registry snapshot as JSON (temp file + rename)
    pub fn save(&self, file: &Path) -> Result<()> {
        let snapshot_err = |reason: String| VaultError::Registry {
            path: file.to_path_buf(),
            reason,
        };

        if let Some(module) = self.modules.iter().find(|m| !m.version.is_finite()) {
            return Err(snapshot_err(format!(
                "{} has a non-finite version",
                module.title
            )));
        }

        if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| VaultError::io(format!("creating {}", parent.display()), e))?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| snapshot_err(e.to_string()))?;
        let tmp = file.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| VaultError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, file)
            .map_err(|e| VaultError::io(format!("replacing {}", file.display()), e))
    }

    pub fn load(file: &Path) -> Result<Self> {
        let content = fs::read_to_string(file)
            .map_err(|e| VaultError::io(format!("reading {}", file.display()), e))?;
        serde_json::from_str(&content).map_err(|e| VaultError::Registry {
            path: file.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Like `load`, but a missing snapshot is an empty registry
    pub fn load_or_default(file: &Path) -> Result<Self> {
        if file.exists() {
            Self::load(file)
        } else {
            Ok(Self::new())
        }
    }
}

impl<'a> IntoIterator for &'a ModuleRegistry {
    type Item = &'a ModuleRecord;
    type IntoIter = std::slice::Iter<'a, ModuleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.modules.iter()
    }
}

// ============================================================================
// Free-function entry points
// ============================================================================

pub fn merge(registry: &mut ModuleRegistry, candidate: ModuleRecord) -> bool {
    registry.merge(candidate)
}

pub fn merge_always(registry: &mut ModuleRegistry, candidate: ModuleRecord) {
    registry.merge_always(candidate)
}

pub fn save_registry(registry: &ModuleRegistry, file: &Path) -> Result<()> {
    registry.save(file)
}

pub fn load_registry(file: &Path) -> Result<ModuleRegistry> {
    ModuleRegistry::load(file)
}

// ============================================================================
// Shared Registry
// ============================================================================

/// A registry that several threads merge into.
///
/// The duplicate check and the insert happen under one lock.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<Mutex<ModuleRegistry>>,
}

impl SharedRegistry {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    pub fn merge(&self, candidate: ModuleRecord) -> bool {
        self.inner.lock().merge(candidate)
    }

    pub fn merge_always(&self, candidate: ModuleRecord) {
        self.inner.lock().merge_always(candidate)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn snapshot(&self) -> ModuleRegistry {
        self.inner.lock().clone()
    }

    pub fn save(&self, file: &Path) -> Result<()> {
        self.inner.lock().save(file)
    }
}
