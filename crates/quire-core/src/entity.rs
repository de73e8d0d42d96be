//! Entity types persisted by the application, one collection each.
//!
//! Sources are keyed by [`resolve_key`](crate::identity::resolve_key) so
//! re-ingested content deduplicates; everything else is keyed by
//! [`new_key`](crate::identity::new_key).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{identity::OriginKind, record::Record};

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub name:       String,
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

impl Record for User {
  const COLLECTION: &'static str = "users";
  const FIELDS: &'static [&'static str] = &["name", "email", "created_at"];
}

// ─── Topics ──────────────────────────────────────────────────────────────────

/// A user-curated grouping of sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
  pub title:       String,
  pub description: Option<String>,
  /// Keys into the `sources` collection.
  #[serde(default)]
  pub source_keys: Vec<String>,
  pub created_at:  DateTime<Utc>,
}

impl Record for Topic {
  const COLLECTION: &'static str = "topics";
  const FIELDS: &'static [&'static str] =
    &["title", "description", "source_keys", "created_at"];
}

// ─── Sources ─────────────────────────────────────────────────────────────────

/// A piece of ingested content: an uploaded document or a fetched article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
  pub origin:     OriginKind,
  /// The identifier as the caller supplied it, before normalisation.
  pub identifier: String,
  pub title:      String,
  pub body:       Option<String>,
  pub fetched_at: DateTime<Utc>,
}

impl Record for Source {
  const COLLECTION: &'static str = "sources";
  const FIELDS: &'static [&'static str] =
    &["origin", "identifier", "title", "body", "fetched_at"];
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
  pub user_key:   String,
  pub started_at: DateTime<Utc>,
  pub expires_at: Option<DateTime<Utc>>,
}

impl Record for Session {
  const COLLECTION: &'static str = "sessions";
  const FIELDS: &'static [&'static str] = &["user_key", "started_at", "expires_at"];
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use chrono::TimeZone;

  use super::*;

  fn serialized_fields<T: Record>(value: &T) -> BTreeSet<String> {
    serde_json::to_value(value)
      .unwrap()
      .as_object()
      .unwrap()
      .keys()
      .cloned()
      .collect()
  }

  fn declared_fields<T: Record>() -> BTreeSet<String> {
    T::FIELDS.iter().map(|f| f.to_string()).collect()
  }

  #[test]
  fn declared_fields_match_serialized_shape() {
    let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    let user = User { name: "Ada".into(), email: "ada@example.com".into(), created_at: at };
    assert_eq!(serialized_fields(&user), declared_fields::<User>());

    let topic = Topic {
      title:       "Cities".into(),
      description: None,
      source_keys: vec![],
      created_at:  at,
    };
    assert_eq!(serialized_fields(&topic), declared_fields::<Topic>());

    let source = Source {
      origin:     OriginKind::Wikipedia,
      identifier: "Paris".into(),
      title:      "Paris".into(),
      body:       None,
      fetched_at: at,
    };
    assert_eq!(serialized_fields(&source), declared_fields::<Source>());

    let session = Session { user_key: "u".into(), started_at: at, expires_at: None };
    assert_eq!(serialized_fields(&session), declared_fields::<Session>());
  }

  #[test]
  fn origin_serializes_lowercase() {
    let value = serde_json::to_value(OriginKind::Wikipedia).unwrap();
    assert_eq!(value, "wikipedia");
  }
}
