//! On-disk artifacts: reading, atomic replacement, orphan cleanup.
//!
//! A write goes to `<collection>.json.<uuid>.tmp` in the same directory and
//! is renamed over `<collection>.json` only once fully written. An
//! interrupted write leaves the live artifact intact and an orphaned temp
//! file behind, which [`sweep_orphans`] removes at start-up.

use std::{
  io::{self, ErrorKind},
  path::{Path, PathBuf},
};

use tokio::{fs, io::AsyncWriteExt as _};
use uuid::Uuid;

const EXTENSION: &str = "json";
const TEMP_SUFFIX: &str = ".tmp";

pub(crate) fn artifact_path(dir: &Path, collection: &str) -> PathBuf {
  dir.join(format!("{collection}.{EXTENSION}"))
}

fn temp_path(path: &Path) -> PathBuf {
  path.with_extension(format!("{EXTENSION}.{}{TEMP_SUFFIX}", Uuid::new_v4().simple()))
}

fn is_orphan(name: &str) -> bool {
  name.ends_with(TEMP_SUFFIX) && name.contains(&format!(".{EXTENSION}."))
}

/// Read an artifact. A missing artifact is an empty collection, not an error.
pub(crate) async fn read(path: &Path) -> io::Result<Option<Vec<u8>>> {
  match fs::read(path).await {
    Ok(bytes)                               => Ok(Some(bytes)),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
    Err(e)                                  => Err(e),
  }
}

/// Atomically replace the artifact at `path` with `bytes`.
///
/// On failure the previous artifact is untouched and the temp file is
/// removed on a best-effort basis.
pub(crate) async fn replace(path: &Path, bytes: &[u8], fsync: bool) -> io::Result<()> {
  let tmp = temp_path(path);
  let result = write_then_rename(&tmp, path, bytes, fsync).await;
  if result.is_err() {
    let _ = fs::remove_file(&tmp).await;
  }
  result
}

async fn write_then_rename(
  tmp: &Path,
  path: &Path,
  bytes: &[u8],
  fsync: bool,
) -> io::Result<()> {
  let mut file = fs::File::create(tmp).await?;
  file.write_all(bytes).await?;
  file.flush().await?;
  if fsync {
    file.sync_all().await?;
  }
  drop(file);
  fs::rename(tmp, path).await?;
  if fsync {
    sync_parent(path).await?;
  }
  Ok(())
}

/// Make the rename itself durable by syncing the containing directory.
#[cfg(unix)]
async fn sync_parent(path: &Path) -> io::Result<()> {
  let Some(dir) = path.parent() else { return Ok(()) };
  fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_parent(_path: &Path) -> io::Result<()> { Ok(()) }

/// Remove temp artifacts orphaned by interrupted writes. Returns the paths
/// that were removed.
pub(crate) async fn sweep_orphans(dir: &Path) -> io::Result<Vec<PathBuf>> {
  let mut removed = Vec::new();
  let mut entries = fs::read_dir(dir).await?;
  while let Some(entry) = entries.next_entry().await? {
    let name = entry.file_name();
    let Some(name) = name.to_str() else { continue };
    if is_orphan(name) && entry.file_type().await?.is_file() {
      fs::remove_file(entry.path()).await?;
      removed.push(entry.path());
    }
  }
  Ok(removed)
}

/// Names of the collections that have an artifact in `dir`, sorted.
pub(crate) async fn collection_names(dir: &Path) -> io::Result<Vec<String>> {
  let mut names = Vec::new();
  let mut entries = fs::read_dir(dir).await?;
  while let Some(entry) = entries.next_entry().await? {
    let path = entry.path();
    if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
      continue;
    }
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
      names.push(stem.to_owned());
    }
  }
  names.sort();
  Ok(names)
}
