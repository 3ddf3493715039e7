//! NwnVault Logging System
//!
//! File logger with a system information header. The library never installs a
//! logger on its own: until `init_logger` runs, every `log_*` call is a no-op.

use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use parking_lot::Mutex;

static LOGGER: OnceLock<Mutex<VaultLogger>> = OnceLock::new();

// ============================================================================
// System Information Detection
// ============================================================================

#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub app_version: String,
    pub os: String,
    pub distro: String,
    pub kernel: String,
}

impl SystemInfo {
    pub fn detect() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            distro: detect_distro(),
            kernel: detect_kernel(),
        }
    }

    pub fn to_log_header(&self) -> String {
        format!(
r#"================================================================================
NwnVault Log - {}
================================================================================
Application:   NwnVault v{}
System Info:
  OS:          {}
  Distro:      {}
  Kernel:      {}
================================================================================
"#,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.app_version,
            self.os,
            self.distro,
            self.kernel,
        )
    }
}

fn detect_distro() -> String {
    if let Ok(file) = File::open("/etc/os-release") {
        let reader = BufReader::new(file);
        for line in reader.lines().map_while(Result::ok) {
            if line.starts_with("NAME=") {
                return line
                    .trim_start_matches("NAME=")
                    .trim_matches('"')
                    .to_string();
            }
        }
    }
    "Unknown".to_string()
}

fn detect_kernel() -> String {
    if let Ok(output) = Command::new("uname").arg("-r").output() {
        if output.status.success() {
            return String::from_utf8_lossy(&output.stdout).trim().to_string();
        }
    }
    "Unknown".to_string()
}

// ============================================================================
// Log Levels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Action, // User commands
    Scan,
    Download,
    Extract,
    Warning,
    Error,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "[INFO]",
            LogLevel::Action => "[ACTION]",
            LogLevel::Scan => "[SCAN]",
            LogLevel::Download => "[DOWNLOAD]",
            LogLevel::Extract => "[EXTRACT]",
            LogLevel::Warning => "[WARNING]",
            LogLevel::Error => "[ERROR]",
        }
    }
}

// ============================================================================
// NwnVault Logger
// ============================================================================

pub struct VaultLogger {
    log_file: Option<File>,
    echo: bool,
}

impl VaultLogger {
    /// Open a timestamped log file inside `log_dir`.
    pub fn new(log_dir: &Path, echo: bool) -> Self {
        let _ = fs::create_dir_all(log_dir);

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_path = log_dir.join(format!("nwn_vault_{}.log", timestamp));

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .ok();

        let mut logger = Self { log_file, echo };

        let header = SystemInfo::detect().to_log_header();
        logger.write_raw(&header);

        logger
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.log_file {
            let _ = writeln!(file, "{}", msg);
            let _ = file.flush();
        }

        if self.echo {
            println!("{}", msg);
        }
    }

    pub fn log(&mut self, level: LogLevel, message: &str) {
        let formatted = format_line(level, message);
        self.write_raw(&formatted);
    }
}

fn format_line(level: LogLevel, message: &str) -> String {
    let timestamp = Local::now().format("%H:%M:%S");
    format!("[{}] {} {}", timestamp, level.prefix(), message)
}

// ============================================================================
// Global Logger Access
// ============================================================================

/// Default log directory (`<data dir>/logs`)
pub fn default_log_dir() -> PathBuf {
    vault_path!("logs")
}

/// Install the process logger (call once at startup). Later calls are ignored.
pub fn init_logger(log_dir: &Path, echo: bool) {
    LOGGER.get_or_init(|| Mutex::new(VaultLogger::new(log_dir, echo)));
}

pub fn log(level: LogLevel, message: &str) {
    if let Some(logger) = LOGGER.get() {
        logger.lock().log(level, message);
    }
}

// ============================================================================
// Convenience Logging Functions
// ============================================================================

pub fn log_info(message: &str) {
    log(LogLevel::Info, message);
}

pub fn log_action(message: &str) {
    log(LogLevel::Action, message);
}

pub fn log_scan(message: &str) {
    log(LogLevel::Scan, message);
}

pub fn log_download(message: &str) {
    log(LogLevel::Download, message);
}

pub fn log_extract(message: &str) {
    log(LogLevel::Extract, message);
}

pub fn log_warning(message: &str) {
    log(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    log(LogLevel::Error, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_level_prefix() {
        let line = format_line(LogLevel::Download, "fetching enigma.zip");
        assert!(line.contains("[DOWNLOAD] fetching enigma.zip"));
        assert!(line.starts_with('['));
    }

    #[test]
    fn logger_writes_header_and_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = VaultLogger::new(dir.path(), false);
        logger.log(LogLevel::Scan, "Found 2 modules");
        drop(logger);

        let entry = fs::read_dir(dir.path()).unwrap().flatten().next().unwrap();
        let content = fs::read_to_string(entry.path()).unwrap();
        assert!(content.contains("NwnVault Log"));
        assert!(content.contains("[SCAN] Found 2 modules"));
    }

    #[test]
    fn logging_without_a_logger_is_a_no_op() {
        // Must not panic or create files when nothing was installed.
        log_warning("nobody is listening");
    }
}
