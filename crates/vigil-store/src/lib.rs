//! Persistence boundary for vigil run documents.
//!
//! The serialization core never talks to a network or disk; it hands a
//! primitive document, a schema description, and a primary-key
//! description to a store behind the [`RunStore`] trait. This crate
//! defines that trait together with [`MemoryStore`], a map-backed
//! reference implementation.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use vigil_core::RunId;
//! use vigil_store::{KeySpec, MemoryStore, RunStore};
//!
//! let store = MemoryStore::new();
//! let id = RunId::generate();
//!
//! store.put_run(id, json!({"status": "created"})).unwrap();
//! let doc = store.get_run(&id).unwrap().unwrap();
//! assert_eq!(doc["status"], json!("created"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;

pub use error::{Result, StoreError};
pub use keys::{KeySpec, SortOrder};
pub use memory::MemoryStore;

use serde_json::Value;
use vigil_core::RunId;
use vigil_schema::Schema;

/// The storage trait run documents are persisted through.
///
/// Implementations accept documents produced by the serialization engine
/// together with the schema that describes them; they never see the
/// typed entities themselves.
pub trait RunStore: Send + Sync {
    /// Make the backing table match the supplied schema and key layout.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownKeyColumn`] if the key names a column
    /// the schema does not describe, or a backend error.
    fn sync_schema(&self, schema: &Schema, keys: &KeySpec) -> Result<()>;

    /// Insert or replace the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend operation fails.
    fn put_run(&self, id: RunId, doc: Value) -> Result<()>;

    /// Fetch the document stored under `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend operation fails.
    fn get_run(&self, id: &RunId) -> Result<Option<Value>>;

    /// Delete the document stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no document is stored under
    /// `id`, or a backend error.
    fn delete_run(&self, id: &RunId) -> Result<()>;
}
