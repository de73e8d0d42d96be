//! Core types and trait definitions for the Quire entity store.
//!
//! This crate is deliberately free of file-system and runtime dependencies.
//! Storage backends (e.g. `quire-store-json`) implement [`store::DocumentStore`];
//! ingestion and tooling depend on this abstraction, not on a backend.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod entity;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod record;
pub mod store;

pub use error::{Error, Result};
pub use identity::{OriginKind, new_key, resolve_key};
pub use record::{Codec, JsonCodec, Record};
