//! Local module discovery
//!
//! Scans a game installation the way every NWN release lays it out: module
//! archives sit directly inside a `modules` folder under the install root.
//!
//! ```rust,ignore
//! use nwn_vault::scanner::discover;
//!
//! for module in discover("/games/NWN Diamond")? {
//!     println!("{} ({})", module.title, module.name);
//! }
//! ```

mod file;

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub use file::{FileKind, ModuleFile};

use crate::config::DEFAULT_MODULES_SUBDIRECTORY;
use crate::error::{Result, VaultError};
use crate::logging::log_scan;
use crate::module::{ModuleRecord, ModuleRegistry};

/// Suffix every module file carries
pub const MODULE_SUFFIX: &str = ".mod";

// ============================================================================
// Directory Snapshot
// ============================================================================

/// A directory and its immediate children, captured once at construction
#[derive(Debug, Clone)]
pub struct Directory {
    pub path: PathBuf,
    /// Absolute paths of the immediate children, in listing order
    pub listing: Vec<PathBuf>,
    pub empty: bool,
}

impl Directory {
    /// Snapshot `path`. Fails with `DirectoryNotFound` when it is missing or not a directory.
    pub fn scan(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(VaultError::DirectoryNotFound {
                path: path.to_path_buf(),
            });
        }
        let path = std::path::absolute(path)
            .map_err(|e| VaultError::io(format!("resolving {}", path.display()), e))?;

        let mut listing = Vec::new();
        for entry in WalkDir::new(&path).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let context = format!("listing {}", path.display());
                match e.into_io_error() {
                    Some(io) => VaultError::io(context, io),
                    None => VaultError::io(context, std::io::Error::other("filesystem loop")),
                }
            })?;
            listing.push(path.join(entry.file_name()));
        }

        Ok(Self {
            empty: listing.is_empty(),
            path,
            listing,
        })
    }

    pub fn directories(&self) -> impl Iterator<Item = &PathBuf> {
        self.listing.iter().filter(|p| p.is_dir())
    }

    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.listing.iter().filter(|p| p.is_file())
    }

    /// Immediate child directory literally named `name`
    pub fn find_subdirectory(&self, name: &str) -> Option<PathBuf> {
        self.directories()
            .find(|p| p.file_name().is_some_and(|n| n == name))
            .cloned()
    }
}

// ============================================================================
// Scanner Operations
// ============================================================================

pub fn scan(path: impl AsRef<Path>) -> Result<Directory> {
    Directory::scan(path)
}

/// Locate the conventional `modules` folder. Not recursive.
pub fn find_modules_subdirectory(directory: &Directory) -> Option<PathBuf> {
    directory.find_subdirectory(DEFAULT_MODULES_SUBDIRECTORY)
}

/// Files directly inside `modules_path` whose name ends with `.mod`, in listing order
pub fn list_module_files(modules_path: impl AsRef<Path>) -> Result<Vec<ModuleFile>> {
    let directory = Directory::scan(modules_path)?;
    directory
        .files()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(MODULE_SUFFIX))
        })
        .map(|p| ModuleFile::open(p))
        .collect()
}

/// Initials of each whitespace-separated token ("Enigma Island.mod" -> "EI")
pub fn module_initials(file_name: &str) -> String {
    file_name
        .split_whitespace()
        .filter_map(|token| token.chars().next())
        .collect()
}

/// File name with the module suffix stripped
pub fn module_title(file_name: &str) -> String {
    file_name
        .strip_suffix(MODULE_SUFFIX)
        .unwrap_or(file_name)
        .to_string()
}

/// Build the on-disk record for a discovered module file
pub fn record_for(file: &ModuleFile) -> ModuleRecord {
    let file_name = file.file_name();
    let mut record = ModuleRecord::on_disk(module_title(&file_name), file.path.clone());
    record.name = module_initials(&file_name);
    record
}

// ============================================================================
// Discovery
// ============================================================================

/// One record per `.mod` file under `<path>/modules`
pub fn discover(path: impl AsRef<Path>) -> Result<Vec<ModuleRecord>> {
    discover_with(path, DEFAULT_MODULES_SUBDIRECTORY)
}

/// Discovery with a configured modules folder name
pub fn discover_with(path: impl AsRef<Path>, modules_subdirectory: &str) -> Result<Vec<ModuleRecord>> {
    let mut registry = ModuleRegistry::new();
    discover_into(path, modules_subdirectory, &mut registry)?;
    Ok(registry.into_records())
}

/// Append discovered modules to `registry` through the permissive merge.
///
/// The scan completes before the registry is touched, so a failure leaves it unchanged.
/// Returns the number of records added.
pub fn discover_into(
    path: impl AsRef<Path>,
    modules_subdirectory: &str,
    registry: &mut ModuleRegistry,
) -> Result<usize> {
    let path = path.as_ref();
    let root = Directory::scan(path)?;

    let Some(modules_dir) = root.find_subdirectory(modules_subdirectory) else {
        log_scan(&format!(
            "No '{}' folder in {}",
            modules_subdirectory,
            root.path.display()
        ));
        return Ok(0);
    };

    let records: Vec<ModuleRecord> = list_module_files(&modules_dir)?
        .iter()
        .map(record_for)
        .collect();

    let count = records.len();
    for record in records {
        registry.merge_always(record);
    }

    log_scan(&format!("Found {} modules at {}", count, modules_dir.display()));
    Ok(count)
}
