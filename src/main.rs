//! NWN Vault - command line front end
//!
//! Thin wrapper over the library: every command loads the config, runs one
//! library call and is recorded in the command history.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use nwn_vault::acquire::{AcquisitionState, Acquirer};
use nwn_vault::catalog::CatalogClient;
use nwn_vault::config::AppConfig;
use nwn_vault::installation::Installation;
use nwn_vault::logging::{default_log_dir, init_logger, log_action, log_error, log_info};
use nwn_vault::module::ModuleRegistry;
use nwn_vault::session::CallLog;
use nwn_vault::Result;

#[derive(Parser, Debug)]
#[command(name = "nwn-vault", version, about = "Neverwinter Nights module manager")]
struct Cli {
    /// Echo log lines to stdout
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List modules installed in the game directory
    Modules {
        /// Game install root (defaults to the configured one)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Edition tag, e.g. diamond_edition or enhanced_edition
        #[arg(long)]
        edition: Option<String>,
    },

    /// List modules on a catalog listing page
    Catalog {
        /// Listing URL (defaults to the configured catalog)
        url: Option<String>,
    },

    /// Show the metadata of a catalog page
    Info { url: String },

    /// Download, extract and register a module
    Install {
        url: String,
        /// File name for the downloaded payload
        name: String,
    },

    /// Show the saved registry
    Registry,

    /// Show the configuration
    Config {
        /// Write the default configuration file
        #[arg(long)]
        init: bool,
    },
}

impl Command {
    fn label(&self) -> String {
        match self {
            Command::Modules { path, .. } => match path {
                Some(path) => format!("modules --path {}", path.display()),
                None => "modules".to_string(),
            },
            Command::Catalog { url } => match url {
                Some(url) => format!("catalog {}", url),
                None => "catalog".to_string(),
            },
            Command::Info { url } => format!("info {}", url),
            Command::Install { url, name } => format!("install {} {}", url, name),
            Command::Registry => "registry".to_string(),
            Command::Config { init } => {
                if *init {
                    "config --init".to_string()
                } else {
                    "config".to_string()
                }
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(&default_log_dir(), cli.verbose);

    let config = AppConfig::load();
    let cancel_flag = Arc::new(AtomicBool::new(false));
    {
        let flag = cancel_flag.clone();
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            log_error(&format!("Failed to install Ctrl+C handler: {}", e));
        }
    }

    let label = cli.command.label();
    log_action(&format!("Running: {}", label));

    let result = run(cli.command, &config, cancel_flag);

    let mut history = CallLog::new();
    history.record(label, &result);
    if let Err(e) = history.write_to(&config.history_file) {
        log_error(&format!("Failed to write history: {}", e));
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_error(&e.to_string());
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, config: &AppConfig, cancel_flag: Arc<AtomicBool>) -> Result<()> {
    match command {
        Command::Modules { path, edition } => {
            let root = path.unwrap_or_else(|| config.install_root());
            let edition = edition.unwrap_or_else(|| config.edition.clone());
            let mut installation = Installation::open(&root, &edition)?
                .with_modules_subdirectory(&config.modules_subdirectory_name);
            let found = installation.discover()?;

            match installation.edition() {
                Some(edition) => println!("{} at {}", edition, installation.path().display()),
                None => println!("Unknown edition at {}", installation.path().display()),
            }
            for record in installation.registry.iter() {
                let path = record
                    .source
                    .local_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                println!("{:<6} {:<40} {}", record.name, record.title, path);
            }
            log_info(&format!("Found {} module(s)", found));
        }

        Command::Catalog { url } => {
            let client = CatalogClient::new(config.http_timeout()).with_cancel_flag(cancel_flag);
            let url = url.unwrap_or_else(|| config.catalog_url.clone());
            let entries = client.list(&url)?;
            for entry in &entries {
                println!("{:<40} {}", entry.title, entry.url);
            }
            log_info(&format!("Listed {} catalog entries", entries.len()));
        }

        Command::Info { url } => {
            let client = CatalogClient::new(config.http_timeout()).with_cancel_flag(cancel_flag);
            let metadata = client.extract(&url)?;
            println!("Title:       {}", metadata.title);
            println!("Download:    {}", metadata.href);
            println!("Compression: {}", metadata.compression);
            if let Some(size) = &metadata.size {
                println!("Size:        {}", size);
            }
            if let Some(author) = &metadata.author {
                println!("Author:      {}", author);
            }
            if let Some(changed) = &metadata.changed {
                println!("Changed:     {}", changed);
            }
            if let Some(version) = &metadata.project_version {
                println!("Version:     {}", version);
            }
            if let Some(game) = &metadata.game {
                println!("Game:        {}", game);
            }
            if let Some(language) = &metadata.language {
                println!("Language:    {}", language);
            }
            if !metadata.tags.is_empty() {
                println!("Tags:        {}", metadata.tags.join(", "));
            }
            if !metadata.requirements.is_empty() {
                println!("Requires:    {}", metadata.requirements.join(", "));
            }
        }

        Command::Install { url, name } => {
            let mut registry = ModuleRegistry::load_or_default(&config.registry_file)?;
            let acquirer = Acquirer::from_config(config, cancel_flag).on_stage(|acquisition| {
                match &acquisition.state {
                    AcquisitionState::Reached(stage) => println!("  {}", stage.label()),
                    AcquisitionState::AlreadyRegistered => println!("  already registered"),
                    AcquisitionState::Failed { at, reason } => {
                        println!("  failed before {}: {}", at.label(), reason)
                    }
                }
            });

            let (record, inserted) = acquirer.acquire_into(&url, &name, &mut registry)?;
            if inserted {
                registry.save(&config.registry_file)?;
                println!("Installed {} into {}", record.title, acquirer.destination().display());
            } else {
                println!("{} is already registered", record.title);
            }
        }

        Command::Registry => {
            let registry = ModuleRegistry::load_or_default(&config.registry_file)?;
            if registry.is_empty() {
                println!("Registry is empty ({})", config.registry_file.display());
            }
            for record in &registry {
                println!("{} v{} [{}]", record.title, record.version, record.author);
            }
        }

        Command::Config { init } => {
            let config = if init {
                let fresh = AppConfig::default();
                fresh.save()?;
                println!("Wrote {}", AppConfig::get_path().display());
                fresh
            } else {
                config.clone()
            };
            let json = serde_json::to_string_pretty(&config).map_err(|e| {
                nwn_vault::VaultError::Config {
                    path: AppConfig::get_path(),
                    reason: e.to_string(),
                }
            })?;
            println!("{}", json);
        }
    }
    Ok(())
}
