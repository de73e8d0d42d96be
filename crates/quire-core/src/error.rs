//! Error types for `quire-core`.
//!
//! One taxonomy is shared by identity resolution and every store backend so
//! that callers (HTTP layer, ingestion) can map kinds onto their own surface.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Empty or whitespace-only identifier handed to identity resolution.
  #[error("invalid identifier: must contain a non-whitespace character")]
  InvalidIdentifier,

  #[error("key {key:?} already exists in collection {collection:?}")]
  Conflict { collection: String, key: String },

  #[error("key {key:?} not found in collection {collection:?}")]
  NotFound { collection: String, key: String },

  /// The artifact exists but does not match the expected record shape.
  #[error("collection {collection:?} is corrupt: {source}")]
  CorruptCollection {
    collection: String,
    #[source]
    source:     serde_json::Error,
  },

  /// I/O failure while reading or atomically replacing an artifact.
  #[error("persistence failure in collection {collection:?}: {source}")]
  PersistenceFailure {
    collection: String,
    #[source]
    source:     std::io::Error,
  },
}

impl Error {
  /// Everything except [`Error::PersistenceFailure`] is the caller's to
  /// handle; persistence failures point at the environment (disk full,
  /// permissions) rather than the request.
  pub fn is_recoverable(&self) -> bool {
    !matches!(self, Self::PersistenceFailure { .. })
  }

  pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound { .. }) }

  pub fn is_conflict(&self) -> bool { matches!(self, Self::Conflict { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn persistence_failure_is_the_only_unrecoverable_kind() {
    let io = Error::PersistenceFailure {
      collection: "users".into(),
      source:     std::io::Error::other("disk full"),
    };
    assert!(!io.is_recoverable());

    let conflict = Error::Conflict { collection: "users".into(), key: "k".into() };
    assert!(conflict.is_recoverable());
    assert!(conflict.is_conflict());
    assert!(Error::InvalidIdentifier.is_recoverable());
  }

  #[test]
  fn messages_name_collection_and_key() {
    let err = Error::NotFound { collection: "topics".into(), key: "abc".into() };
    assert_eq!(err.to_string(), r#"key "abc" not found in collection "topics""#);
  }
}
