use anyhow::{Context, Result, ensure};
use hmac::{Hmac, Mac as _};
use sha1::Sha1;
use sha2::Sha256;

use crate::secret::SecretBytes;
use crate::types::AssociationType;

/// Keyed MAC over protocol bytes, digest selected by association type.
pub struct Mac {
    algorithm: AssociationType,
    key: SecretBytes,
}

impl Mac {
    pub fn new(algorithm: AssociationType, key: &[u8]) -> Result<Self> {
        ensure!(!key.is_empty(), "empty mac key");

        Ok(Self { algorithm, key: SecretBytes::new(key) })
    }

    pub fn compute(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self.algorithm {
            AssociationType::HmacSha1 => {
                let mut mac = Hmac::<Sha1>::new_from_slice(self.key.expose_secret()).context("create hmac-sha1")?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
            AssociationType::HmacSha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(self.key.expose_secret()).context("create hmac-sha256")?;
                mac.update(data);
                Ok(mac.finalize().into_bytes().to_vec())
            }
        }
    }
}
