//! Command history
//!
//! The CLI records each command it runs here and appends the result to the
//! history file. Library calls never touch it.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::error::{Result, VaultError};

#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub at: DateTime<Local>,
    pub command: String,
    /// `ok` or the error message
    pub outcome: String,
}

impl CallRecord {
    pub fn to_line(&self) -> String {
        format!(
            "{} {} -> {}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            self.command,
            self.outcome
        )
    }
}

#[derive(Debug, Default)]
pub struct CallLog {
    entries: Vec<CallRecord>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<T, E: std::fmt::Display>(
        &mut self,
        command: impl Into<String>,
        result: &std::result::Result<T, E>,
    ) {
        let outcome = match result {
            Ok(_) => "ok".to_string(),
            Err(e) => e.to_string(),
        };
        self.entries.push(CallRecord {
            at: Local::now(),
            command: command.into(),
            outcome,
        });
    }

    pub fn entries(&self) -> &[CallRecord] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append every entry to `path`, one line each
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| VaultError::io(format!("creating {}", parent.display()), e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| VaultError::io(format!("opening {}", path.display()), e))?;

        for entry in &self.entries {
            writeln!(file, "{}", entry.to_line())
                .map_err(|e| VaultError::io(format!("writing {}", path.display()), e))?;
        }
        Ok(())
    }
}
