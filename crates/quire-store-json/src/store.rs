//! [`JsonStore`] and [`JsonCollection`] — the file-backed implementation of
//! [`DocumentStore`].

use std::{
  collections::HashMap,
  io,
  marker::PhantomData,
  path::{Path, PathBuf},
  sync::{Arc, Mutex, PoisonError},
};

use quire_core::{
  Error, Result,
  record::{Codec, JsonCodec, Record},
  store::DocumentStore,
};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::{StoreConfig, artifact};

const LOCK_FILE: &str = ".lock";

// ─── Store ───────────────────────────────────────────────────────────────────

/// Root of a file-backed store: a directory of collection artifacts plus the
/// registry of per-collection locks.
///
/// Cloning is cheap — the lock registry is reference-counted and shared, so
/// every handle to a collection serialises against every other.
#[derive(Clone)]
pub struct JsonStore {
  inner: Arc<Inner>,
}

struct Inner {
  dir:        PathBuf,
  fsync:      bool,
  locks:      Mutex<HashMap<String, Arc<RwLock<()>>>>,
  /// Exclusive advisory lock on `<dir>/.lock`, held for the store's lifetime.
  _lock_file: std::fs::File,
}

impl JsonStore {
  /// Open (or create) a store in `config.data_dir`.
  ///
  /// This is the start-up phase: it creates the directory, takes the
  /// directory lock and removes temp artifacts orphaned by writes that were
  /// interrupted in a previous run.
  ///
  /// Fails with [`io::ErrorKind::WouldBlock`] if another store, in this
  /// process or another, already has the directory open. Collection locks
  /// live in the store, so two stores on one directory would not serialise
  /// against each other.
  pub async fn open(config: &StoreConfig) -> io::Result<Self> {
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let lock_path = config.data_dir.join(LOCK_FILE);
    let lock_file = std::fs::OpenOptions::new()
      .create(true)
      .truncate(false)
      .read(true)
      .write(true)
      .open(&lock_path)?;
    fs2::FileExt::try_lock_exclusive(&lock_file).map_err(|_| {
      io::Error::new(
        io::ErrorKind::WouldBlock,
        format!("store at {} is already in use", config.data_dir.display()),
      )
    })?;

    for orphan in artifact::sweep_orphans(&config.data_dir).await? {
      tracing::warn!(path = %orphan.display(), "removed orphaned temp artifact");
    }

    tracing::debug!(dir = %config.data_dir.display(), "store opened");
    Ok(Self {
      inner: Arc::new(Inner {
        dir:        config.data_dir.clone(),
        fsync:      config.fsync,
        locks:      Mutex::new(HashMap::new()),
        _lock_file: lock_file,
      }),
    })
  }

  pub fn dir(&self) -> &Path { &self.inner.dir }

  /// Handle to the collection of `T`, using the default [`JsonCodec`].
  pub fn collection<T: Record>(&self) -> JsonCollection<T> {
    self.collection_with_codec(T::COLLECTION, JsonCodec::new())
  }

  /// Handle to the collection `name`, encoding records with `codec`.
  ///
  /// `name` is used verbatim as the artifact's file stem.
  pub fn collection_with_codec<T, C>(&self, name: &str, codec: C) -> JsonCollection<T, C>
  where
    C: Codec<T>,
  {
    JsonCollection {
      name:    name.to_owned(),
      path:    artifact::artifact_path(&self.inner.dir, name),
      fsync:   self.inner.fsync,
      lock:    self.lock_for(name),
      codec:   Arc::new(codec),
      _record: PhantomData,
    }
  }

  /// Names of the collections that currently have an artifact on disk.
  pub async fn collections(&self) -> io::Result<Vec<String>> {
    artifact::collection_names(&self.inner.dir).await
  }

  pub(crate) fn lock_for(&self, name: &str) -> Arc<RwLock<()>> {
    // The map is only ever inserted into, so a poisoned guard is still valid.
    let mut locks = self.inner.locks.lock().unwrap_or_else(PoisonError::into_inner);
    locks.entry(name.to_owned()).or_default().clone()
  }
}

// ─── Collection ──────────────────────────────────────────────────────────────

/// One collection of `T` records, backed by one artifact.
///
/// Cloning is cheap; clones share the collection lock.
pub struct JsonCollection<T, C = JsonCodec<T>> {
  name:    String,
  path:    PathBuf,
  fsync:   bool,
  lock:    Arc<RwLock<()>>,
  codec:   Arc<C>,
  _record: PhantomData<fn() -> T>,
}

impl<T, C> Clone for JsonCollection<T, C> {
  fn clone(&self) -> Self {
    Self {
      name:    self.name.clone(),
      path:    self.path.clone(),
      fsync:   self.fsync,
      lock:    self.lock.clone(),
      codec:   self.codec.clone(),
      _record: PhantomData,
    }
  }
}

type Entries<T> = Vec<(String, T)>;

impl<T, C> JsonCollection<T, C>
where
  T: Send + Sync + 'static,
  C: Codec<T> + 'static,
{
  pub fn name(&self) -> &str { &self.name }

  pub fn path(&self) -> &Path { &self.path }

  fn not_found(&self, key: &str) -> Error {
    Error::NotFound { collection: self.name.clone(), key: key.to_owned() }
  }

  fn conflict(&self, key: &str) -> Error {
    Error::Conflict { collection: self.name.clone(), key: key.to_owned() }
  }

  fn corrupt(&self, source: serde_json::Error) -> Error {
    Error::CorruptCollection { collection: self.name.clone(), source }
  }

  fn persistence(&self, source: io::Error) -> Error {
    Error::PersistenceFailure { collection: self.name.clone(), source }
  }

  /// Read and decode the whole collection. Caller holds the lock.
  async fn load(&self) -> Result<Entries<T>> {
    let Some(bytes) = artifact::read(&self.path)
      .await
      .map_err(|e| self.persistence(e))?
    else {
      return Ok(Vec::new());
    };

    let raw: Map<String, Value> =
      serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e))?;

    raw
      .into_iter()
      .map(|(key, value)| {
        let record = self.codec.decode(value).map_err(|e| self.corrupt(e))?;
        Ok((key, record))
      })
      .collect()
  }

  /// Encode the whole collection and atomically replace the artifact.
  /// Caller holds the write lock.
  async fn commit(&self, entries: &Entries<T>) -> Result<()> {
    let mut object = Map::with_capacity(entries.len());
    for (key, record) in entries {
      let value = self
        .codec
        .encode(record)
        .map_err(|e| self.persistence(e.into()))?;
      object.insert(key.clone(), value);
    }

    let bytes = serde_json::to_vec_pretty(&object).map_err(|e| self.persistence(e.into()))?;
    artifact::replace(&self.path, &bytes, self.fsync)
      .await
      .map_err(|e| self.persistence(e))
  }

  /// Run one read-modify-write under the collection's write lock. Nothing is
  /// committed unless `change` succeeds and the replace lands.
  async fn mutate<F>(&self, key: &str, op: &'static str, change: F) -> Result<()>
  where
    F: FnOnce(&mut Entries<T>) -> Result<()> + Send,
  {
    let _guard = self.lock.write().await;
    let mut entries = self.load().await?;
    change(&mut entries)?;

    match self.commit(&entries).await {
      Ok(()) => {
        tracing::debug!(collection = %self.name, key, op, records = entries.len(), "committed");
        Ok(())
      }
      Err(e) => {
        tracing::warn!(collection = %self.name, key, op, error = %e, "write failed");
        Err(e)
      }
    }
  }

  async fn read(&self) -> Result<Entries<T>> {
    let _guard = self.lock.read().await;
    self.load().await
  }
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl<T, C> DocumentStore<T> for JsonCollection<T, C>
where
  T: Send + Sync + 'static,
  C: Codec<T> + 'static,
{
  type Error = Error;

  async fn get(&self, key: &str) -> Result<T> {
    self
      .read()
      .await?
      .into_iter()
      .find_map(|(k, record)| (k == key).then_some(record))
      .ok_or_else(|| self.not_found(key))
  }

  async fn get_all(&self) -> Result<Vec<T>> {
    Ok(self.read().await?.into_iter().map(|(_, record)| record).collect())
  }

  async fn entries(&self) -> Result<Vec<(String, T)>> { self.read().await }

  async fn add(&self, key: &str, value: T) -> Result<()> {
    self
      .mutate(key, "add", |entries| {
        if entries.iter().any(|(k, _)| k == key) {
          return Err(self.conflict(key));
        }
        entries.push((key.to_owned(), value));
        Ok(())
      })
      .await
  }

  async fn update(&self, key: &str, value: T) -> Result<()> {
    self
      .mutate(key, "update", |entries| {
        let slot = entries
          .iter_mut()
          .find_map(|(k, record)| (k == key).then_some(record))
          .ok_or_else(|| self.not_found(key))?;
        *slot = value;
        Ok(())
      })
      .await
  }

  async fn delete(&self, key: &str) -> Result<()> {
    self
      .mutate(key, "delete", |entries| {
        let index = entries
          .iter()
          .position(|(k, _)| k == key)
          .ok_or_else(|| self.not_found(key))?;
        entries.remove(index);
        Ok(())
      })
      .await
  }

  async fn exists(&self, key: &str) -> Result<bool> {
    Ok(self.read().await?.iter().any(|(k, _)| k == key))
  }
}
