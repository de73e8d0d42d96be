//! Store configuration, deserialised by the binary from file + environment.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// Directory holding one `<collection>.json` artifact per entity type.
  pub data_dir: PathBuf,
  /// `fsync` each temp artifact before it replaces the live one.
  #[serde(default = "default_fsync")]
  pub fsync:    bool,
}

impl StoreConfig {
  pub fn new(data_dir: impl Into<PathBuf>) -> Self {
    Self { data_dir: data_dir.into(), fsync: default_fsync() }
  }
}

fn default_fsync() -> bool { true }
