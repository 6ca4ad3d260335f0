use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use rand::rand_core::TryRng;
use rand::rngs::SysRng;
use sha2::{Digest, Sha256};
use tracing::warn;
use walkdir::WalkDir;

use crate::association::Association;
use crate::config::{ASSOCIATION_FILE_EXTENSION, STORE_DIGEST_LEN};
use crate::store::AssociationStore;

/// Directory-backed association store.
///
/// One serialized record per file, named by digests of the server URL and
/// handle so arbitrary URLs map to safe filenames. Writes land in a
/// random-suffixed temp file first and are renamed into place, so a
/// concurrent reader never observes a torn record.
#[derive(Debug)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Opens a store rooted at `directory`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).with_context(|| format!("failed to create store directory: {}", directory.display()))?;

        Ok(Self { directory })
    }

    fn digest(input: &str) -> String {
        let mut digest = hex::encode(Sha256::digest(input.as_bytes()));
        digest.truncate(STORE_DIGEST_LEN);
        digest
    }

    fn association_path(&self, server_url: &str, handle: &str) -> PathBuf {
        self.directory.join(format!("{}-{}{}", Self::digest(server_url), Self::digest(handle), ASSOCIATION_FILE_EXTENSION))
    }

    fn read_association(path: &Path) -> Option<Association> {
        let contents = fs::read_to_string(path).ok()?;

        match Association::deserialize(&contents) {
            Ok(association) => Some(association),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unusable association record");
                None
            }
        }
    }

    fn record_files(&self) -> impl Iterator<Item = PathBuf> {
        WalkDir::new(&self.directory)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .flatten()
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(ASSOCIATION_FILE_EXTENSION))
            .map(walkdir::DirEntry::into_path)
    }
}

impl AssociationStore for FileStore {
    fn store_association(&mut self, server_url: &str, association: &Association) -> Result<()> {
        let record = association.serialize()?;
        let path = self.association_path(server_url, association.handle());

        let mut suffix = [0u8; 8];
        SysRng.try_fill_bytes(&mut suffix).map_err(|e| anyhow!("rng failed: {e}"))?;
        let temp_path = self.directory.join(format!(".tmp-{}", hex::encode(suffix)));

        fs::write(&temp_path, record).with_context(|| format!("failed to write association record: {}", temp_path.display()))?;
        fs::rename(&temp_path, &path).with_context(|| format!("failed to publish association record: {}", path.display()))?;

        Ok(())
    }

    fn get_association(&self, server_url: &str, handle: Option<&str>) -> Result<Option<Association>> {
        let found = match handle {
            Some(handle) => Self::read_association(&self.association_path(server_url, handle)),
            None => {
                let server_prefix = format!("{}-", Self::digest(server_url));
                self.record_files()
                    .filter(|path| path.file_name().is_some_and(|name| name.to_string_lossy().starts_with(&server_prefix)))
                    .filter_map(|path| Self::read_association(&path))
                    .max_by_key(Association::issued)
            }
        };

        Ok(found.filter(|association| !association.is_expired()))
    }

    fn remove_association(&mut self, server_url: &str, handle: &str) -> Result<bool> {
        let path = self.association_path(server_url, handle);

        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("cannot remove association record: {}", path.display())),
        }
    }

    fn cleanup_associations(&mut self) -> Result<usize> {
        let mut removed = 0;

        for path in self.record_files().collect::<Vec<_>>() {
            let usable = Self::read_association(&path).is_some_and(|association| !association.is_expired());
            if usable {
                continue;
            }

            fs::remove_file(&path).with_context(|| format!("cannot remove association record: {}", path.display()))?;
            removed += 1;
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::association::unix_now;
    use crate::secret::SecretBytes;
    use crate::types::AssociationType;

    const SERVER: &str = "http://provider.example.com/openid";

    fn live_association(handle: &str, issued_offset: u64) -> Association {
        Association::new(handle, SecretBytes::new(b"01234567890123456789"), unix_now() - issued_offset, 3600, AssociationType::HmacSha1).unwrap()
    }

    fn expired_association(handle: &str) -> Association {
        Association::new(handle, SecretBytes::new(b"01234567890123456789"), 1000, 600, AssociationType::HmacSha1).unwrap()
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path()).unwrap();

        let association = live_association("handle1", 0);
        store.store_association(SERVER, &association).unwrap();

        assert_eq!(store.get_association(SERVER, Some("handle1")).unwrap(), Some(association));
        assert_eq!(store.get_association(SERVER, Some("missing")).unwrap(), None);
        assert_eq!(store.get_association("http://other.example.com/", None).unwrap(), None);
    }

    #[test]
    fn test_get_without_handle_returns_freshest_for_server() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path()).unwrap();

        store.store_association(SERVER, &live_association("older", 600)).unwrap();
        let newer = live_association("newer", 0);
        store.store_association(SERVER, &newer).unwrap();
        store.store_association("http://other.example.com/", &live_association("elsewhere", 0)).unwrap();

        assert_eq!(store.get_association(SERVER, None).unwrap(), Some(newer));
    }

    #[test]
    fn test_expired_not_returned_but_kept_until_cleanup() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path()).unwrap();

        store.store_association(SERVER, &expired_association("stale")).unwrap();
        assert_eq!(store.get_association(SERVER, Some("stale")).unwrap(), None);
        assert_eq!(store.record_files().count(), 1);

        assert_eq!(store.cleanup_associations().unwrap(), 1);
        assert_eq!(store.record_files().count(), 0);
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path()).unwrap();

        store.store_association(SERVER, &live_association("handle1", 0)).unwrap();
        assert!(store.remove_association(SERVER, "handle1").unwrap());
        assert!(!store.remove_association(SERVER, "handle1").unwrap());
    }

    #[test]
    fn test_corrupt_record_skipped_and_cleaned() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path()).unwrap();

        let live = live_association("handle1", 0);
        store.store_association(SERVER, &live).unwrap();

        let corrupt_path = dir.path().join(format!("{}-{}{}", FileStore::digest(SERVER), FileStore::digest("corrupt"), ASSOCIATION_FILE_EXTENSION));
        fs::write(&corrupt_path, "not a record\n").unwrap();

        assert_eq!(store.get_association(SERVER, Some("corrupt")).unwrap(), None);
        assert_eq!(store.get_association(SERVER, None).unwrap(), Some(live.clone()));

        assert_eq!(store.cleanup_associations().unwrap(), 1);
        assert_eq!(store.get_association(SERVER, Some("handle1")).unwrap(), Some(live));
    }

    #[test]
    fn test_store_replaces_same_handle() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path()).unwrap();

        store.store_association(SERVER, &live_association("handle1", 600)).unwrap();
        let replacement = live_association("handle1", 0);
        store.store_association(SERVER, &replacement).unwrap();

        assert_eq!(store.get_association(SERVER, Some("handle1")).unwrap(), Some(replacement));
        assert_eq!(store.record_files().count(), 1);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let mut store = FileStore::new(dir.path()).unwrap();
        store.store_association(SERVER, &live_association("handle1", 0)).unwrap();

        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(".tmp-"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
