//! The seams between typed records and their persisted JSON form.
//!
//! Each entity type names its collection and its canonical field set; a
//! [`Codec`] turns records into JSON values and back. Stores are handed a
//! codec at construction and never reflect over record types themselves.

use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

/// A persistable entity type.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
  /// Collection name, the plural of the entity type. Backends derive the
  /// artifact name from it (`users` → `users.json`).
  const COLLECTION: &'static str;

  /// Canonical serialized field names. Used to fold keys whose casing has
  /// drifted between versions back onto the current schema.
  const FIELDS: &'static [&'static str];
}

/// Serializer/deserializer pair for one record type.
pub trait Codec<T>: Send + Sync {
  fn encode(&self, value: &T) -> serde_json::Result<Value>;

  /// Decode one stored value. Missing required fields are an error; the
  /// store reports it as a corrupt collection.
  fn decode(&self, raw: Value) -> serde_json::Result<T>;
}

// ─── Default codec ───────────────────────────────────────────────────────────

/// The default [`Codec`] for any [`Record`].
///
/// Decoding matches field names case-insensitively against
/// [`Record::FIELDS`] and drops unknown fields; an exact-case key wins over a
/// folded duplicate.
pub struct JsonCodec<T> {
  _record: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
  pub fn new() -> Self { Self { _record: PhantomData } }
}

impl<T> Default for JsonCodec<T> {
  fn default() -> Self { Self::new() }
}

impl<T> Clone for JsonCodec<T> {
  fn clone(&self) -> Self { Self::new() }
}

impl<T: Record> Codec<T> for JsonCodec<T> {
  fn encode(&self, value: &T) -> serde_json::Result<Value> {
    serde_json::to_value(value)
  }

  fn decode(&self, raw: Value) -> serde_json::Result<T> {
    match raw {
      Value::Object(object) => {
        serde_json::from_value(Value::Object(fold_fields(T::FIELDS, object)))
      }
      other => serde_json::from_value(other),
    }
  }
}

fn fold_fields(fields: &[&str], raw: Map<String, Value>) -> Map<String, Value> {
  let mut folded = Map::with_capacity(raw.len());
  let mut drifted = Vec::new();

  for (name, value) in raw {
    if fields.contains(&name.as_str()) {
      folded.insert(name, value);
    } else if let Some(canonical) =
      fields.iter().find(|f| f.eq_ignore_ascii_case(&name))
    {
      drifted.push((*canonical, value));
    }
  }

  for (canonical, value) in drifted {
    if !folded.contains_key(canonical) {
      folded.insert(canonical.to_owned(), value);
    }
  }
  folded
}
