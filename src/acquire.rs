//! Remote acquisition: catalog page -> payload -> extracted module -> registry
//!
//! One acquisition moves through
//! `Requested -> MetadataExtracted -> Downloaded -> Extracted -> Registered`.
//! Any failure stops it where it is. The registry is only written in the last
//! transition, through the strict merge, so an aborted acquisition leaves it as it
//! was. Files already on disk (the payload, partially extracted members) stay.
//! When the merge finds an identity-equal record the acquisition ends in
//! `AlreadyRegistered` instead of `Registered`.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::archive::{extract_archive, save_payload, CompressionKind};
use crate::catalog::{CatalogClient, CatalogMetadata};
use crate::config::AppConfig;
use crate::error::Result;
use crate::logging::{log_action, log_error, log_info};
use crate::module::{ModuleRecord, ModuleRegistry, SharedRegistry};

// ============================================================================
// Stages
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionStage {
    Requested,
    MetadataExtracted,
    Downloaded,
    Extracted,
    Registered,
}

impl AcquisitionStage {
    pub fn label(&self) -> &'static str {
        match self {
            AcquisitionStage::Requested => "requested",
            AcquisitionStage::MetadataExtracted => "metadata extracted",
            AcquisitionStage::Downloaded => "downloaded",
            AcquisitionStage::Extracted => "extracted",
            AcquisitionStage::Registered => "registered",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionState {
    Reached(AcquisitionStage),
    /// Everything but the merge succeeded: the registry already held an
    /// identity-equal record and was left unchanged
    AlreadyRegistered,
    /// `at` is the stage that could not be reached
    Failed { at: AcquisitionStage, reason: String },
}

/// Progress of a single acquisition, handed to the stage callback
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub url: String,
    pub name: String,
    pub state: AcquisitionState,
}

impl Acquisition {
    fn new(url: &str, name: &str) -> Self {
        Self {
            url: url.to_string(),
            name: name.to_string(),
            state: AcquisitionState::Reached(AcquisitionStage::Requested),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, AcquisitionState::Failed { .. })
    }
}

pub type StageCallback = Arc<dyn Fn(&Acquisition) + Send + Sync>;

// ============================================================================
// Acquirer
// ============================================================================

/// Runs acquisitions with one client, payload directory and extraction target
#[derive(Clone)]
pub struct Acquirer {
    client: CatalogClient,
    working_directory: PathBuf,
    destination: PathBuf,
    stage_callback: Option<StageCallback>,
}

impl Acquirer {
    pub fn new(
        client: CatalogClient,
        working_directory: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            working_directory: working_directory.into(),
            destination: destination.into(),
            stage_callback: None,
        }
    }

    /// Payloads go to the configured working directory, modules to the
    /// installation's modules folder.
    pub fn from_config(config: &AppConfig, cancel_flag: Arc<AtomicBool>) -> Self {
        let client = CatalogClient::new(config.http_timeout()).with_cancel_flag(cancel_flag);
        Self::new(client, &config.working_directory, config.modules_directory())
    }

    pub fn on_stage(mut self, callback: impl Fn(&Acquisition) + Send + Sync + 'static) -> Self {
        self.stage_callback = Some(Arc::new(callback));
        self
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Acquire the module at `url` without registering it anywhere
    pub fn acquire(&self, url: &str, name: &str) -> Result<ModuleRecord> {
        self.run(url, name, |_| true).map(|(record, _)| record)
    }

    /// Acquire and strictly merge into `registry`. The flag is false when an
    /// identity-equal record was already present.
    pub fn acquire_into(
        &self,
        url: &str,
        name: &str,
        registry: &mut ModuleRegistry,
    ) -> Result<(ModuleRecord, bool)> {
        self.run(url, name, |record| registry.merge(record.clone()))
    }

    pub fn acquire_shared(
        &self,
        url: &str,
        name: &str,
        registry: &SharedRegistry,
    ) -> Result<(ModuleRecord, bool)> {
        self.run(url, name, |record| registry.merge(record.clone()))
    }

    /// Download the payload `metadata` points at, save it as `name` and extract
    /// it into the destination. Returns the payload path.
    pub fn fetch_and_extract(&self, metadata: &CatalogMetadata, name: &str) -> Result<PathBuf> {
        let payload = self.download(metadata, name)?;
        self.unpack(metadata, &payload)?;
        Ok(payload)
    }

    fn download(&self, metadata: &CatalogMetadata, name: &str) -> Result<PathBuf> {
        let bytes = self.client.fetch_payload(metadata)?;
        save_payload(&bytes, &self.working_directory, name)
    }

    fn unpack(&self, metadata: &CatalogMetadata, payload: &Path) -> Result<()> {
        let kind = CompressionKind::detect(&metadata.compression)?;
        self.client.check_cancelled()?;
        extract_archive(kind, payload, &self.destination)
    }

    fn run(
        &self,
        url: &str,
        name: &str,
        register: impl FnOnce(&ModuleRecord) -> bool,
    ) -> Result<(ModuleRecord, bool)> {
        log_action(&format!("Acquiring '{}' from {}", name, url));
        let mut acquisition = Acquisition::new(url, name);
        self.report(&acquisition);

        let metadata = self.step(
            &mut acquisition,
            AcquisitionStage::MetadataExtracted,
            self.client.extract(url),
        )?;

        let result = self.download(&metadata, name);
        let payload = self.step(&mut acquisition, AcquisitionStage::Downloaded, result)?;

        let result = self.unpack(&metadata, &payload);
        self.step(&mut acquisition, AcquisitionStage::Extracted, result)?;

        let record = ModuleRecord::from_catalog(url, &metadata);
        let inserted = register(&record);
        if inserted {
            self.step(&mut acquisition, AcquisitionStage::Registered, Ok(()))?;
            log_info(&format!("Registered {} ({})", record.title, payload.display()));
        } else {
            acquisition.state = AcquisitionState::AlreadyRegistered;
            self.report(&acquisition);
            log_info(&format!(
                "{} v{} is already registered, registry unchanged",
                record.title, record.version
            ));
        }
        Ok((record, inserted))
    }

    fn step<T>(
        &self,
        acquisition: &mut Acquisition,
        target: AcquisitionStage,
        result: Result<T>,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                acquisition.state = AcquisitionState::Reached(target);
                self.report(acquisition);
                Ok(value)
            }
            Err(e) => {
                log_error(&format!(
                    "Acquisition of '{}' failed before {}: {}",
                    acquisition.name,
                    target.label(),
                    e
                ));
                acquisition.state = AcquisitionState::Failed {
                    at: target,
                    reason: e.to_string(),
                };
                self.report(acquisition);
                Err(e)
            }
        }
    }

    fn report(&self, acquisition: &Acquisition) {
        if let Some(callback) = &self.stage_callback {
            callback(acquisition);
        }
    }
}

/// `acquire` with a default client, payloads in the current directory and
/// modules extracted under `destination`
pub fn acquire(url: &str, name: &str, destination: &Path) -> Result<ModuleRecord> {
    Acquirer::new(CatalogClient::default(), ".", destination).acquire(url, name)
}
