//! File-backed JSON backend for the Quire entity store.
//!
//! One artifact per collection (`<collection>.json`), holding a key → record
//! object. Writers on a collection are serialised by a per-collection
//! reader/writer lock and every write lands through temp-file + atomic
//! rename, so readers never observe a partially written artifact.

mod artifact;
mod config;
mod store;

pub use config::StoreConfig;
pub use quire_core::{Error, Result};
pub use store::{JsonCollection, JsonStore};
