//! Neverwinter Nights file entities

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, VaultError};

/// Kinds of game content files, keyed by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Module,
    Hakpack,
    Music,
    Movie,
}

impl FileKind {
    pub const ALL: [FileKind; 4] = [
        FileKind::Module,
        FileKind::Hakpack,
        FileKind::Music,
        FileKind::Movie,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Module => "mod",
            FileKind::Hakpack => "hak",
            FileKind::Music => "bmu",
            FileKind::Movie => "bik",
        }
    }

    /// Case-insensitive lookup (`"MOD"` and `".mod"` both match)
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        Self::ALL.into_iter().find(|k| k.extension() == ext)
    }
}

/// A file on disk with its size and detected kind
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleFile {
    pub path: PathBuf,
    pub size: u64,
    /// Raw extension without the dot, empty when the file has none
    pub extension: String,
    pub kind: Option<FileKind>,
}

impl ModuleFile {
    pub fn open(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path)
            .map_err(|e| VaultError::io(format!("reading metadata of {}", path.display()), e))?;
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            size: meta.len(),
            kind: FileKind::from_extension(&extension),
            extension,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn is_module(&self) -> bool {
        self.kind == Some(FileKind::Module)
    }
}
