//! NWN Vault - Neverwinter Nights module manager
//!
//! Library crate shared with the `nwn-vault` CLI: local module discovery, the
//! module registry and, with the `acquire` feature, catalog scraping and archive
//! acquisition from the Neverwinter Vault.

#[macro_use]
pub mod paths;

pub mod catalog;
pub mod config;
pub mod error;
pub mod installation;
pub mod logging;
pub mod module;
pub mod scanner;
pub mod session;

#[cfg(feature = "acquire")]
pub mod acquire;
#[cfg(feature = "acquire")]
pub mod archive;

pub use error::{Result, VaultError};
pub use module::{load_registry, merge, merge_always, save_registry, ModuleRecord, ModuleRegistry};
pub use scanner::discover;

#[cfg(feature = "acquire")]
pub use acquire::{acquire, Acquirer};
