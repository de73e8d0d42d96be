//! The `DocumentStore` trait.
//!
//! Implemented by storage backends (e.g. `quire-store-json`). Each value of a
//! `DocumentStore<T>` addresses exactly one collection of `T` records; keys
//! come from [`resolve_key`](crate::identity::resolve_key) or
//! [`new_key`](crate::identity::new_key).

use std::future::Future;

/// Keyed CRUD over one collection.
///
/// Records are only ever replaced whole. Reads hand out independent copies,
/// so mutating a returned value never changes stored state.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait DocumentStore<T>: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch one record; not-found is an error, not `None`.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send + 'a;

  /// Every record in the collection, in stored order.
  fn get_all(&self) -> impl Future<Output = Result<Vec<T>, Self::Error>> + Send + '_;

  /// Like [`get_all`](Self::get_all), paired with each record's key.
  fn entries(
    &self,
  ) -> impl Future<Output = Result<Vec<(String, T)>, Self::Error>> + Send + '_;

  /// Insert a new record. Never overwrites: an existing key is a conflict.
  fn add<'a>(
    &'a self,
    key: &'a str,
    value: T,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Replace an existing record.
  fn update<'a>(
    &'a self,
    key: &'a str,
    value: T,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn delete<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn exists<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}
