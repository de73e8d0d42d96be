//! Deduplicating ingestion of external content.

use crate::{
  Error, Result,
  identity::{OriginKind, resolve_key},
  store::DocumentStore,
};

/// Outcome of [`ingest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingested {
  pub key:     String,
  /// `false` when the source was already present.
  pub created: bool,
}

/// Store the record for `(origin, raw)` unless it is already present.
///
/// `build` is only called when the key is free. Losing an `add` race to a
/// concurrent ingester of the same source is reported as `created: false`.
pub async fn ingest<S, T, F>(
  store: &S,
  origin: OriginKind,
  raw: &str,
  build: F,
) -> Result<Ingested>
where
  S: DocumentStore<T, Error = Error>,
  F: FnOnce(&str) -> T,
{
  let key = resolve_key(origin, raw)?;

  if store.exists(&key).await? {
    return Ok(Ingested { key, created: false });
  }

  let record = build(&key);
  match store.add(&key, record).await {
    Ok(()) => Ok(Ingested { key, created: true }),
    Err(e) if e.is_conflict() => Ok(Ingested { key, created: false }),
    Err(e) => Err(e),
  }
}

#[cfg(test)]
mod tests {
  use std::{collections::BTreeMap, sync::Mutex};

  use super::*;

  /// Minimal in-memory store for exercising the trait contract.
  #[derive(Default)]
  struct MemoryStore {
    records: Mutex<BTreeMap<String, String>>,
  }

  impl MemoryStore {
    fn len(&self) -> usize { self.records.lock().unwrap().len() }
  }

  fn missing(key: &str) -> Error {
    Error::NotFound { collection: "memory".into(), key: key.into() }
  }

  impl DocumentStore<String> for MemoryStore {
    type Error = Error;

    async fn get(&self, key: &str) -> Result<String> {
      self.records.lock().unwrap().get(key).cloned().ok_or_else(|| missing(key))
    }

    async fn get_all(&self) -> Result<Vec<String>> {
      Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    async fn entries(&self) -> Result<Vec<(String, String)>> {
      Ok(
        self
          .records
          .lock()
          .unwrap()
          .iter()
          .map(|(k, v)| (k.clone(), v.clone()))
          .collect(),
      )
    }

    async fn add(&self, key: &str, value: String) -> Result<()> {
      let mut records = self.records.lock().unwrap();
      if records.contains_key(key) {
        return Err(Error::Conflict { collection: "memory".into(), key: key.into() });
      }
      records.insert(key.to_owned(), value);
      Ok(())
    }

    async fn update(&self, key: &str, value: String) -> Result<()> {
      let mut records = self.records.lock().unwrap();
      let slot = records.get_mut(key).ok_or_else(|| missing(key))?;
      *slot = value;
      Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
      self.records.lock().unwrap().remove(key).map(|_| ()).ok_or_else(|| missing(key))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
      Ok(self.records.lock().unwrap().contains_key(key))
    }
  }

  #[tokio::test]
  async fn reingesting_the_same_article_is_a_noop() {
    let store = MemoryStore::default();

    let first = ingest(&store, OriginKind::Wikipedia, "Paris", |_| "v1".to_owned())
      .await
      .unwrap();
    assert!(first.created);

    let second = ingest(&store, OriginKind::Wikipedia, "  paris ", |_| -> String {
      panic!("builder must not run for a known source")
    })
    .await
    .unwrap();
    assert!(!second.created);
    assert_eq!(first.key, second.key);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get(&first.key).await.unwrap(), "v1");
  }

  #[tokio::test]
  async fn blank_identifier_is_rejected_before_touching_the_store() {
    let store = MemoryStore::default();
    let err = ingest(&store, OriginKind::Web, "  ", |_| String::new())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::InvalidIdentifier));
    assert_eq!(store.len(), 0);
  }

  #[tokio::test]
  async fn builder_receives_the_resolved_key() {
    let store = MemoryStore::default();
    let out = ingest(&store, OriginKind::Document, " doc-7 ", |key| key.to_owned())
      .await
      .unwrap();
    assert_eq!(out.key, "doc-7");
    assert_eq!(store.get("doc-7").await.unwrap(), "doc-7");
  }
}
