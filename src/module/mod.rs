//! Module records and the registry that holds them
//!
//! A record is identified by `(title, version)` only. Local discovery feeds the
//! registry through `merge_always`; remote acquisition goes through `merge`, which
//! refuses identity-equal duplicates.

mod record;
mod registry;

pub use record::{
    Author, Compatibility, DependencyKind, ModuleRecord, ModuleSource, Requirements,
    DEFAULT_CEP_VERSION, DEFAULT_VERSION,
};
pub use registry::{
    load_registry, merge, merge_always, save_registry, ModuleRegistry, SharedRegistry,
};
