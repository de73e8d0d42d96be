//! Canonical record keys for ingested content.
//!
//! Documents carry a caller-minted token and pass through untouched. Every
//! other origin names its content in an external namespace (article titles,
//! URLs), so the identifier is normalised and hashed: the same logical item
//! always resolves to the same key, whatever casing or padding it arrived
//! with.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Where a piece of content came from.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OriginKind {
  /// A user upload; its identifier is already globally unique.
  Document,
  Wikipedia,
  Web,
  Feed,
}

/// Resolve `(origin, raw)` to the canonical record key.
///
/// - [`OriginKind::Document`]: `raw` trimmed, case preserved.
/// - anything else: lowercase hex SHA-256 of
///   `"<origin>:" + lowercase(trim(raw))`.
///
/// Fails with [`Error::InvalidIdentifier`] if `raw` is empty or
/// whitespace-only, for every origin.
pub fn resolve_key(origin: OriginKind, raw: &str) -> Result<String> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(Error::InvalidIdentifier);
  }

  if origin == OriginKind::Document {
    return Ok(trimmed.to_owned());
  }

  let mut hasher = Sha256::new();
  hasher.update(origin.as_ref().as_bytes());
  hasher.update(b":");
  hasher.update(trimmed.to_lowercase().as_bytes());
  Ok(hex::encode(hasher.finalize()))
}

/// Mint a fresh key for records with no cross-ingestion identity
/// (sessions, users).
pub fn new_key() -> String { Uuid::new_v4().to_string() }
