//! Module records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::catalog::CatalogMetadata;
use crate::scanner::module_initials;

pub const DEFAULT_VERSION: f64 = 1.0;
pub const DEFAULT_CEP_VERSION: f64 = 2.65;

// ============================================================================
// Supporting Types
// ============================================================================

/// Content a module needs besides itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DependencyKind {
    Hakpack,
    Movie,
    Music,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    pub diamond_edition: bool,
    pub enhanced_edition: bool,
}

impl Default for Compatibility {
    fn default() -> Self {
        Self {
            diamond_edition: true,
            enhanced_edition: false,
        }
    }
}

/// Which official content must be installed to play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirements {
    /// Original campaign content
    pub base: bool,
    /// Shadows of Undrentide
    pub xp1: bool,
    /// Hordes of the Underdark
    pub xp2: bool,
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            base: true,
            xp1: true,
            xp2: true,
        }
    }
}

impl Requirements {
    /// Derive flags from a catalog requirement list. An empty list keeps the defaults.
    pub fn from_listing(items: &[String]) -> Self {
        if items.is_empty() {
            return Self::default();
        }
        Self {
            base: true,
            xp1: items.iter().any(|i| mentions(i, "shadows of undrentide", "sou")),
            xp2: items.iter().any(|i| mentions(i, "hordes of the underdark", "hotu")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub surname: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            surname: None,
        }
    }
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            surname: Some("Author".to_string()),
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.surname {
            Some(surname) => write!(f, "{} {}", self.name, surname),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Where a record came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleSource {
    /// File found in a game installation
    OnDisk { path: PathBuf },
    /// Entry on a vault page; `file` is the payload link
    InCatalog { page: String, file: String },
}

impl ModuleSource {
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            ModuleSource::OnDisk { path } => Some(path),
            ModuleSource::InCatalog { .. } => None,
        }
    }

    pub fn is_catalog(&self) -> bool {
        matches!(self, ModuleSource::InCatalog { .. })
    }
}

// ============================================================================
// Module Record
// ============================================================================

/// A Neverwinter Nights module. Identity is `(title, version)`; see `PartialEq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleRecord {
    /// Short heuristic label, not an identifier
    pub name: String,
    pub title: String,
    pub is_part_of_series: bool,
    pub series: Option<String>,
    pub compatibility: Compatibility,
    pub requirements: Requirements,
    pub dependencies: BTreeMap<DependencyKind, Vec<String>>,
    /// Community Expansion Pack required
    pub cep: bool,
    pub cep_version: f64,
    pub author: Author,
    pub tags: Vec<String>,
    pub language: String,
    pub version: f64,
    pub source: ModuleSource,
}

impl ModuleRecord {
    fn with_source(title: String, source: ModuleSource) -> Self {
        Self {
            name: module_initials(&title),
            title,
            is_part_of_series: false,
            series: None,
            compatibility: Compatibility::default(),
            requirements: Requirements::default(),
            dependencies: BTreeMap::from([
                (DependencyKind::Hakpack, Vec::new()),
                (DependencyKind::Movie, Vec::new()),
                (DependencyKind::Music, Vec::new()),
            ]),
            cep: false,
            cep_version: 0.0,
            author: Author::default(),
            tags: Vec::new(),
            language: "English".to_string(),
            version: DEFAULT_VERSION,
            source,
        }
    }

    pub fn on_disk(title: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::with_source(title.into(), ModuleSource::OnDisk { path: path.into() })
    }

    pub fn in_catalog(
        title: impl Into<String>,
        page: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self::with_source(
            title.into(),
            ModuleSource::InCatalog {
                page: page.into(),
                file: file.into(),
            },
        )
    }

    /// Convert metadata scraped from a vault page at `page`
    pub fn from_catalog(page: &str, metadata: &CatalogMetadata) -> Self {
        let mut record = Self::in_catalog(metadata.title.clone(), page, metadata.href.clone());

        if let Some(author) = &metadata.author {
            record.author = Author::new(author.clone());
        }
        if let Some(language) = &metadata.language {
            record.language = language.clone();
        }
        if let Some(version) = metadata.project_version.as_deref().and_then(leading_number) {
            record.version = version;
        }
        record.tags = metadata.tags.clone();
        record.requirements = Requirements::from_listing(&metadata.requirements);
        if metadata
            .requirements
            .iter()
            .any(|r| mentions(r, "community expansion pack", "cep"))
        {
            record = record.with_cep();
        }
        if let Some(game) = &metadata.game {
            if mentions(game, "enhanced edition", "ee") {
                record.compatibility.enhanced_edition = true;
            }
        }
        record
    }

    pub fn with_version(mut self, version: f64) -> Self {
        self.version = version;
        self
    }

    /// Flag the module as needing the Community Expansion Pack
    pub fn with_cep(mut self) -> Self {
        self.cep = true;
        self.cep_version = DEFAULT_CEP_VERSION;
        self
    }

    pub fn with_series(mut self, series: impl Into<String>) -> Self {
        self.is_part_of_series = true;
        self.series = Some(series.into());
        self
    }

    pub fn add_dependency(&mut self, kind: DependencyKind, file: impl Into<String>) {
        self.dependencies.entry(kind).or_default().push(file.into());
    }

    pub fn dependencies_of(&self, kind: DependencyKind) -> &[String] {
        self.dependencies.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The identity key used for deduplication
    pub fn identity(&self) -> (&str, f64) {
        (&self.title, self.version)
    }
}

impl PartialEq for ModuleRecord {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.version == other.version
    }
}

impl fmt::Display for ModuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Module title: {}", self.title)
    }
}

/// True when `text` contains the full `phrase` or the `abbreviation` as a whole word
fn mentions(text: &str, phrase: &str, abbreviation: &str) -> bool {
    let text = text.to_lowercase();
    text.contains(phrase)
        || text
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == abbreviation)
}

/// Leading decimal number of a version label ("1.05b" -> 1.05, "v2" -> 2.0).
/// Labels that overflow `f64` yield `None`.
fn leading_number(label: &str) -> Option<f64> {
    let trimmed = label.trim().trim_start_matches(|c: char| c == 'v' || c == 'V');
    let end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(trimmed.len());
    trimmed[..end]
        .trim_end_matches('.')
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_everything_but_title_and_version() {
        let disk = ModuleRecord::on_disk("Enigma Island", "/games/modules/Enigma Island.mod");
        let mut vault = ModuleRecord::in_catalog(
            "Enigma Island",
            "https://neverwintervault.org/project/nwn1/module/enigma-island",
            "https://neverwintervault.org/modules/enigma.zip",
        );
        vault.author = Author::new("Stefan");
        vault.tags.push("Adventure".into());
        assert_eq!(disk, vault);

        assert_ne!(disk, vault.clone().with_version(1.1));
        assert_ne!(disk, ModuleRecord::on_disk("Enigma Island 2", "/x.mod"));
    }

    #[test]
    fn defaults_follow_the_classic_module_profile() {
        let record = ModuleRecord::on_disk("Prelude", "/p.mod");
        assert_eq!(record.name, "P");
        assert!(record.compatibility.diamond_edition);
        assert!(!record.compatibility.enhanced_edition);
        assert_eq!(record.requirements, Requirements::default());
        assert!(!record.cep);
        assert_eq!(record.cep_version, 0.0);
        assert_eq!(record.version, DEFAULT_VERSION);
        assert_eq!(record.to_string(), "Module title: Prelude");
        assert!(record.dependencies_of(DependencyKind::Hakpack).is_empty());
    }

    #[test]
    fn builders_set_series_cep_and_dependencies() {
        let mut record = ModuleRecord::on_disk("Chapter 2", "/c2.mod")
            .with_series("Aielund Saga")
            .with_cep();
        record.add_dependency(DependencyKind::Hakpack, "aielund.hak");

        assert!(record.is_part_of_series);
        assert_eq!(record.series.as_deref(), Some("Aielund Saga"));
        assert_eq!(record.cep_version, DEFAULT_CEP_VERSION);
        assert_eq!(record.dependencies_of(DependencyKind::Hakpack), ["aielund.hak"]);
    }

    #[test]
    fn version_labels_parse_leading_number() {
        assert_eq!(leading_number("1.05b"), Some(1.05));
        assert_eq!(leading_number("v2"), Some(2.0));
        assert_eq!(leading_number(" 3. "), Some(3.0));
        assert_eq!(leading_number("final"), None);
        assert_eq!(leading_number(&"9".repeat(400)), None);
    }

    #[test]
    fn overflowing_catalog_version_keeps_the_default() {
        let metadata = CatalogMetadata {
            title: "Enigma Island".into(),
            project_version: Some("9".repeat(400)),
            ..Default::default()
        };
        let record = ModuleRecord::from_catalog("https://neverwintervault.org/project/enigma", &metadata);
        assert_eq!(record.version, DEFAULT_VERSION);
    }

    #[test]
    fn abbreviations_only_match_whole_words() {
        assert!(mentions("Requires SoU", "shadows of undrentide", "sou"));
        assert!(!mentions("Custom soundset", "shadows of undrentide", "sou"));
        assert!(mentions("NWN:EE", "enhanced edition", "ee"));
        assert!(!mentions("Neverwinter Nights", "enhanced edition", "ee"));
    }

    #[test]
    fn requirement_listing_maps_to_flags() {
        let none = Requirements::from_listing(&[]);
        assert_eq!(none, Requirements::default());

        let hotu = Requirements::from_listing(&["Hordes of the Underdark".to_string()]);
        assert!(hotu.base);
        assert!(!hotu.xp1);
        assert!(hotu.xp2);
    }

    #[test]
    fn catalog_metadata_becomes_a_catalog_record() {
        let metadata = CatalogMetadata {
            href: "https://neverwintervault.org/modules/enigma.zip".into(),
            title: "Enigma Island".into(),
            author: Some("stefan".into()),
            project_version: Some("1.2".into()),
            language: Some("German".into()),
            game: Some("Neverwinter Nights: Enhanced Edition".into()),
            tags: vec!["Adventure".into()],
            requirements: vec!["SoU".into(), "CEP 2.65".into()],
            ..Default::default()
        };

        let record = ModuleRecord::from_catalog("https://neverwintervault.org/project/enigma", &metadata);
        assert_eq!(record.title, "Enigma Island");
        assert_eq!(record.name, "EI");
        assert_eq!(record.version, 1.2);
        assert_eq!(record.author.to_string(), "stefan");
        assert_eq!(record.language, "German");
        assert!(record.requirements.xp1);
        assert!(!record.requirements.xp2);
        assert!(record.cep);
        assert!(record.compatibility.enhanced_edition);
        assert_eq!(
            record.source,
            ModuleSource::InCatalog {
                page: "https://neverwintervault.org/project/enigma".into(),
                file: "https://neverwintervault.org/modules/enigma.zip".into(),
            }
        );
    }
}
