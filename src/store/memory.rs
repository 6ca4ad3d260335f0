use anyhow::Result;
use hashbrown::HashMap;

use crate::association::Association;
use crate::store::AssociationStore;

/// In-process association store.
///
/// Nested maps keyed by server URL, then handle. Intended for tests and
/// single-process deployments; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    associations: HashMap<String, HashMap<String, Association>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssociationStore for MemoryStore {
    fn store_association(&mut self, server_url: &str, association: &Association) -> Result<()> {
        self.associations
            .entry(server_url.to_string())
            .or_default()
            .insert(association.handle().to_string(), association.clone());

        Ok(())
    }

    fn get_association(&self, server_url: &str, handle: Option<&str>) -> Result<Option<Association>> {
        let Some(server_associations) = self.associations.get(server_url) else {
            return Ok(None);
        };

        let found = match handle {
            Some(handle) => server_associations.get(handle).filter(|association| !association.is_expired()).cloned(),
            None => server_associations
                .values()
                .filter(|association| !association.is_expired())
                .max_by_key(|association| association.issued())
                .cloned(),
        };

        Ok(found)
    }

    fn remove_association(&mut self, server_url: &str, handle: &str) -> Result<bool> {
        let Some(server_associations) = self.associations.get_mut(server_url) else {
            return Ok(false);
        };

        let removed = server_associations.remove(handle).is_some();
        if server_associations.is_empty() {
            self.associations.remove(server_url);
        }

        Ok(removed)
    }

    fn cleanup_associations(&mut self) -> Result<usize> {
        let mut removed = 0;

        for server_associations in self.associations.values_mut() {
            let before = server_associations.len();
            server_associations.retain(|_, association| !association.is_expired());
            removed += before - server_associations.len();
        }
        self.associations.retain(|_, server_associations| !server_associations.is_empty());

        Ok(removed)
    }
}
