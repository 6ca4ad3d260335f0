use anyhow::{Result, anyhow, ensure};
use rand::rand_core::TryRng;
use rand::rngs::SysRng;
use secrecy::{ExposeSecret, SecretBox};
use subtle::ConstantTimeEq;

/// Association shared secret.
///
/// Wraps the raw key material so it is zeroized on drop, redacted from
/// `Debug` output, and only compared in constant time.
pub struct SecretBytes {
    inner: SecretBox<Vec<u8>>,
}

impl SecretBytes {
    #[must_use]
    pub fn new(data: &[u8]) -> Self {
        Self { inner: SecretBox::new(Box::new(data.to_vec())) }
    }

    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { inner: SecretBox::new(Box::new(data)) }
    }

    /// Draws a fresh secret of the given size from the operating system RNG.
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is zero or the system RNG fails.
    pub fn generate(size: usize) -> Result<Self> {
        ensure!(size > 0, "secret size cannot be zero");

        let mut bytes = vec![0u8; size];
        SysRng.try_fill_bytes(&mut bytes).map_err(|e| anyhow!("rng failed: {e}"))?;

        Ok(Self::from_vec(bytes))
    }

    #[must_use]
    pub fn expose_secret(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for SecretBytes {
    fn clone(&self) -> Self {
        Self::new(self.expose_secret())
    }
}

impl PartialEq for SecretBytes {
    fn eq(&self, other: &Self) -> bool {
        bool::from(self.expose_secret().ct_eq(other.expose_secret()))
    }
}

impl Eq for SecretBytes {}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([... {} bytes ...])", self.len())
    }
}
