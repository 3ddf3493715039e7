//! Archive payloads: saving, format detection and extraction
//!
//! Extraction is not transactional. A failure partway through leaves the
//! members already written in the destination, and the saved payload is never
//! cleaned up. Entries whose path would leave the destination are refused.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, VaultError};
use crate::logging::{log_error, log_extract};

/// Archive formats the vault serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionKind {
    SevenZip,
    Zip,
    Rar,
}

impl CompressionKind {
    /// Substring dispatch on an advertised compression string
    /// (`"x-7z-compressed"`, `"application/zip"`, ...).
    pub fn detect(compression: &str) -> Result<Self> {
        let lowered = compression.to_ascii_lowercase();
        if lowered.contains("7z") {
            Ok(CompressionKind::SevenZip)
        } else if lowered.contains("zip") {
            Ok(CompressionKind::Zip)
        } else if lowered.contains("rar") {
            Ok(CompressionKind::Rar)
        } else {
            Err(VaultError::UnknownCompressionFormat(compression.to_string()))
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompressionKind::SevenZip => "7z",
            CompressionKind::Zip => "zip",
            CompressionKind::Rar => "rar",
        }
    }
}

// ============================================================================
// Payload File
// ============================================================================

/// Write a downloaded payload to `<working_dir>/<name>`
pub fn save_payload(bytes: &[u8], working_dir: &Path, name: &str) -> Result<PathBuf> {
    if name.is_empty() || name == "." || name == ".." || name.contains(|c: char| c == '/' || c == '\\') {
        return Err(VaultError::io(
            "saving payload",
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("'{}' is not a plain file name", name),
            ),
        ));
    }

    fs::create_dir_all(working_dir)
        .map_err(|e| VaultError::io(format!("creating {}", working_dir.display()), e))?;
    let path = working_dir.join(name);
    fs::write(&path, bytes).map_err(|e| VaultError::io(format!("writing {}", path.display()), e))?;
    Ok(path)
}

// ============================================================================
// Extraction
// ============================================================================

/// Extract every entry of `archive` into `destination`
pub fn extract_archive(kind: CompressionKind, archive: &Path, destination: &Path) -> Result<()> {
    fs::create_dir_all(destination)
        .map_err(|e| VaultError::io(format!("creating {}", destination.display()), e))?;

    log_extract(&format!(
        "Extracting {} archive {} -> {}",
        kind.label(),
        archive.display(),
        destination.display()
    ));

    let result = match kind {
        CompressionKind::SevenZip => extract_7z(archive, destination),
        CompressionKind::Zip => extract_zip(archive, destination),
        CompressionKind::Rar => extract_rar(archive, destination),
    };

    if let Err(e) = &result {
        log_error(&format!("Failed to extract archive: {}", e));
    }
    result
}

fn extraction_error(archive: &Path, reason: impl ToString) -> VaultError {
    VaultError::Extraction {
        archive: archive.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// True when `name` stays inside the extraction root once joined onto it
fn is_enclosed(name: &str) -> bool {
    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn extract_7z(archive: &Path, destination: &Path) -> Result<()> {
    let mut rejected: Option<String> = None;
    sevenz_rust::decompress_file_with_extract_fn(archive, destination, |entry, reader, dest| {
        if !is_enclosed(entry.name()) {
            rejected = Some(entry.name().to_string());
            return Ok(false);
        }
        sevenz_rust::default_entry_extract_fn(entry, reader, dest)
    })
    .map_err(|e| extraction_error(archive, e))?;

    match rejected {
        Some(name) => Err(extraction_error(
            archive,
            format!("entry '{}' escapes the destination", name),
        )),
        None => Ok(()),
    }
}

fn extract_zip(archive: &Path, destination: &Path) -> Result<()> {
    let file = fs::File::open(archive)
        .map_err(|e| VaultError::io(format!("opening {}", archive.display()), e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| extraction_error(archive, e))?;
    zip.extract(destination).map_err(|e| extraction_error(archive, e))
}

fn extract_rar(archive: &Path, destination: &Path) -> Result<()> {
    let mut rar = unrar::Archive::new(archive)
        .open_for_processing()
        .map_err(|e| extraction_error(archive, e))?;

    while let Some(header) = rar.read_header().map_err(|e| extraction_error(archive, e))? {
        let name = header.entry().filename.to_string_lossy().into_owned();
        if !is_enclosed(&name) {
            return Err(extraction_error(
                archive,
                format!("entry '{}' escapes the destination", name),
            ));
        }
        rar = if header.entry().is_file() {
            header
                .extract_with_base(destination)
                .map_err(|e| extraction_error(archive, e))?
        } else {
            header.skip().map_err(|e| extraction_error(archive, e))?
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn detection_uses_substring_match() {
        assert_eq!(
            CompressionKind::detect("application/x-7z-compressed").unwrap(),
            CompressionKind::SevenZip
        );
        assert_eq!(CompressionKind::detect("application/zip").unwrap(), CompressionKind::Zip);
        assert_eq!(
            CompressionKind::detect("application/x-rar-compressed").unwrap(),
            CompressionKind::Rar
        );
        assert_eq!(CompressionKind::detect("x-zip-compressed").unwrap(), CompressionKind::Zip);
    }

    #[test]
    fn unknown_format_is_rejected() {
        for compression in ["application/octet-stream", "octet-stream", ""] {
            assert!(matches!(
                CompressionKind::detect(compression),
                Err(VaultError::UnknownCompressionFormat(c)) if c == compression
            ));
        }
    }

    #[test]
    fn payload_is_written_under_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_payload(b"payload", &dir.path().join("downloads"), "enigma").unwrap();
        assert_eq!(path, dir.path().join("downloads").join("enigma"));
        assert_eq!(fs::read(&path).unwrap(), b"payload");
    }

    #[test]
    fn payload_name_must_be_a_plain_file_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["", "..", "../escape", "a/b"] {
            assert!(save_payload(b"x", dir.path(), name).is_err(), "{:?}", name);
        }
    }

    #[test]
    fn zip_archive_extracts_all_entries() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = zip_bytes(&[
            ("Enigma Island.mod", b"MOD V1.0"),
            ("hak/enigma.hak", b"HAK V1.0"),
        ]);
        let archive = save_payload(&bytes, dir.path(), "enigma").unwrap();
        let destination = dir.path().join("modules");

        extract_archive(CompressionKind::Zip, &archive, &destination).unwrap();
        assert_eq!(fs::read(destination.join("Enigma Island.mod")).unwrap(), b"MOD V1.0");
        assert!(destination.join("hak").join("enigma.hak").is_file());
        assert!(archive.exists());
    }

    fn seven_zip(dir: &Path, entries: &[(&str, &[u8])]) -> PathBuf {
        let archive = dir.join("payload.7z");
        let mut writer = sevenz_rust::SevenZWriter::create(&archive).unwrap();
        for (i, (name, data)) in entries.iter().enumerate() {
            let source = dir.join(format!("source-{}", i));
            fs::write(&source, data).unwrap();
            let entry = sevenz_rust::SevenZArchiveEntry::from_path(&source, name.to_string());
            writer
                .push_archive_entry(entry, Some(fs::File::open(&source).unwrap()))
                .unwrap();
        }
        writer.finish().unwrap();
        archive
    }

    #[test]
    fn seven_zip_archive_extracts_all_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = seven_zip(
            dir.path(),
            &[("Enigma Island.mod", b"MOD V1.0"), ("enigma.hak", b"HAK V1.0")],
        );
        let destination = dir.path().join("modules");

        extract_archive(CompressionKind::SevenZip, &archive, &destination).unwrap();
        assert_eq!(fs::read(destination.join("Enigma Island.mod")).unwrap(), b"MOD V1.0");
        assert_eq!(fs::read(destination.join("enigma.hak")).unwrap(), b"HAK V1.0");
    }

    #[test]
    fn seven_zip_entries_cannot_leave_the_destination() {
        let dir = tempfile::tempdir().unwrap();
        let archive = seven_zip(dir.path(), &[("../escape.txt", b"outside")]);
        let destination = dir.path().join("nwn").join("modules");

        assert!(matches!(
            extract_archive(CompressionKind::SevenZip, &archive, &destination),
            Err(VaultError::Extraction { .. })
        ));
        assert!(!dir.path().join("nwn").join("escape.txt").exists());
    }

    #[test]
    fn enclosed_names_stay_relative() {
        assert!(is_enclosed("Enigma Island.mod"));
        assert!(is_enclosed("hak/./enigma.hak"));
        assert!(!is_enclosed("../escape.txt"));
        assert!(!is_enclosed("hak/../../escape.txt"));
        assert!(!is_enclosed("/etc/passwd"));
    }

    #[test]
    fn corrupt_archives_report_extraction_errors() {
        let dir = tempfile::tempdir().unwrap();
        let archive = save_payload(b"definitely not an archive", dir.path(), "junk").unwrap();
        let destination = dir.path().join("out");

        for kind in [CompressionKind::Zip, CompressionKind::SevenZip, CompressionKind::Rar] {
            assert!(matches!(
                extract_archive(kind, &archive, &destination),
                Err(VaultError::Extraction { .. })
            ), "{:?}", kind);
        }
    }
}
