//! Association persistence.
//!
//! Relying parties keep negotiated associations keyed by provider URL and
//! handle. The stores here implement that contract in memory and on disk;
//! anything transactional or shared across processes is the embedding
//! application's concern. The contract is plain get/put/remove;
//! concurrent writers for the same key must be serialized by the caller.

use anyhow::Result;

use crate::association::Association;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Key-value persistence for associations.
///
/// Keys are the composite (server URL, handle). Expired associations are
/// skipped by retrieval and removed by [`cleanup_associations`]; until
/// then they may remain in storage.
///
/// [`cleanup_associations`]: AssociationStore::cleanup_associations
pub trait AssociationStore {
    /// Saves an association for `server_url`, replacing any record with
    /// the same handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the association cannot be persisted.
    fn store_association(&mut self, server_url: &str, association: &Association) -> Result<()>;

    /// Retrieves an association for `server_url`.
    ///
    /// With a handle, returns that exact association; without one, the
    /// freshest (most recently issued) live association for the server.
    /// Expired records are never returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get_association(&self, server_url: &str, handle: Option<&str>) -> Result<Option<Association>>;

    /// Removes the association with the given handle.
    ///
    /// Returns whether a record existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be removed.
    fn remove_association(&mut self, server_url: &str, handle: &str) -> Result<bool>;

    /// Purges expired and unusable records, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be scanned.
    fn cleanup_associations(&mut self) -> Result<usize>;
}
