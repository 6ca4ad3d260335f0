//! Association lifecycle, signing, and verification.
//!
//! An association couples an opaque handle with a shared MAC secret and
//! expiry metadata. It is an immutable value object: every operation is a
//! pure function of the fields fixed at construction, so instances may be
//! shared freely between threads.
//!
//! # Security Properties
//!
//! - Signature input is canonical strict key-value form; a field that
//!   cannot be encoded aborts signing instead of changing the signed bytes
//! - Signature acceptance uses constant-time comparison
//! - An expired association must not sign new messages; verification of
//!   previously issued signatures remains valid until the record is purged

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow, bail, ensure};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use subtle::ConstantTimeEq;

use crate::config::{ASSOCIATION_FIELDS, ASSOCIATION_VERSION, OPENID2_NS, OPENID_PREFIX};
use crate::kvform;
use crate::mac::Mac;
use crate::message::Message;
use crate::secret::SecretBytes;
use crate::types::AssociationType;

/// Seconds since the Unix epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_secs())
}

/// A shared-secret agreement between a relying party and a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    handle: String,
    secret: SecretBytes,
    issued: u64,
    lifetime: u64,
    assoc_type: AssociationType,
}

impl Association {
    /// Creates an association from its five fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is empty or the secret length does
    /// not match the algorithm's required size.
    pub fn new(handle: &str, secret: SecretBytes, issued: u64, lifetime: u64, assoc_type: AssociationType) -> Result<Self> {
        ensure!(!handle.is_empty(), "association handle cannot be empty");
        ensure!(
            secret.len() == assoc_type.secret_size(),
            "invalid secret length for {assoc_type}: expected {}, got {}",
            assoc_type.secret_size(),
            secret.len()
        );

        Ok(Self { handle: handle.to_string(), secret, issued, lifetime, assoc_type })
    }

    /// Creates an association issued now from a wire `expires_in` value.
    ///
    /// This is the consumer-side constructor: the provider reports how
    /// long the association will live, not when it was issued.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Association::new`].
    pub fn from_expires_in(expires_in: u64, handle: &str, secret: SecretBytes, assoc_type: AssociationType) -> Result<Self> {
        Self::new(handle, secret, unix_now(), expires_in, assoc_type)
    }

    #[inline]
    #[must_use]
    pub fn handle(&self) -> &str {
        &self.handle
    }

    #[inline]
    #[must_use]
    pub fn secret(&self) -> &[u8] {
        self.secret.expose_secret()
    }

    #[inline]
    #[must_use]
    pub const fn issued(&self) -> u64 {
        self.issued
    }

    #[inline]
    #[must_use]
    pub const fn lifetime(&self) -> u64 {
        self.lifetime
    }

    #[inline]
    #[must_use]
    pub const fn assoc_type(&self) -> AssociationType {
        self.assoc_type
    }

    /// Seconds of validity remaining at time `now`; 0 once expired.
    #[inline]
    #[must_use]
    pub const fn expires_in_at(&self, now: u64) -> u64 {
        self.issued.saturating_add(self.lifetime).saturating_sub(now)
    }

    /// Seconds of validity remaining; 0 once expired.
    #[must_use]
    pub fn expires_in(&self) -> u64 {
        self.expires_in_at(unix_now())
    }

    /// Reports whether the association has expired.
    ///
    /// An expired association must not sign new messages. It may still be
    /// used to check signatures it issued while valid.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_in() == 0
    }

    /// Serializes to the canonical six-line key-value record.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle cannot be encoded, e.g. it contains
    /// a newline.
    pub fn serialize(&self) -> Result<String> {
        let assoc_type: &'static str = self.assoc_type.into();
        let pairs = [
            ("version", ASSOCIATION_VERSION.to_string()),
            ("handle", self.handle.clone()),
            ("secret", BASE64.encode(self.secret.expose_secret())),
            ("issued", self.issued.to_string()),
            ("lifetime", self.lifetime.to_string()),
            ("assoc_type", assoc_type.to_string()),
        ];

        kvform::encode(&pairs, true).context("cannot serialize association")
    }

    /// Reconstructs an association from its serialized record.
    ///
    /// The record must carry exactly the six canonical keys in canonical
    /// order, with version `2`; anything else marks the record unusable.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed key-value form, wrong or reordered
    /// keys, an unsupported version, an undecodable secret, non-integer
    /// timestamps, or an unknown association type.
    pub fn deserialize(input: &str) -> Result<Self> {
        let pairs = kvform::decode(input, true).context("malformed association record")?;

        let keys: Vec<&str> = pairs.iter().map(|(key, _)| key.as_str()).collect();
        ensure!(keys == ASSOCIATION_FIELDS, "unexpected association fields: {keys:?}");

        let mut values = pairs.into_iter().map(|(_, value)| value);
        let (Some(version), Some(handle), Some(secret), Some(issued), Some(lifetime), Some(assoc_type)) =
            (values.next(), values.next(), values.next(), values.next(), values.next(), values.next())
        else {
            bail!("truncated association record");
        };

        ensure!(version == ASSOCIATION_VERSION, "unsupported association version: {version:?}");

        let secret = BASE64.decode(&secret).context("invalid base64 secret")?;
        let issued: u64 = issued.parse().with_context(|| format!("invalid issued timestamp: {issued:?}"))?;
        let lifetime: u64 = lifetime.parse().with_context(|| format!("invalid lifetime: {lifetime:?}"))?;
        let assoc_type: AssociationType = assoc_type.parse().map_err(|_| anyhow!("unknown association type: {assoc_type:?}"))?;

        Self::new(&handle, SecretBytes::from_vec(secret), issued, lifetime, assoc_type)
    }

    /// Computes the raw MAC over an ordered field list.
    ///
    /// The pairs are rendered to strict key-value form and the result is
    /// MAC'd with this association's secret. Both parties must produce
    /// byte-identical input, so an encoding failure aborts the signature
    /// instead of altering the signed bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if a pair cannot be encoded strictly.
    pub fn sign(&self, pairs: &[(String, String)]) -> Result<Vec<u8>> {
        let kv = kvform::encode(pairs, true).context("cannot build signature input")?;

        Mac::new(self.assoc_type, self.secret.expose_secret())?.compute(kv.as_bytes())
    }

    /// Computes the base64 signature over a message's declared signed fields.
    ///
    /// A field named in the signed list but absent from the message
    /// contributes an empty value rather than an error, matching deployed
    /// provider behavior.
    ///
    /// # Errors
    ///
    /// Returns an error if the message has no signed list.
    pub fn message_signature(&self, message: &Message) -> Result<String> {
        let pairs = self.make_pairs(message)?;

        Ok(BASE64.encode(self.sign(&pairs)?))
    }

    /// Returns a signed copy of `message`.
    ///
    /// The copy carries this association's handle, a sorted signed-field
    /// list covering every field present (plus `signed` itself), and the
    /// resulting signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the message already carries a `sig` or `signed`
    /// field, or an `assoc_handle` naming a different association.
    pub fn sign_message(&self, message: &Message) -> Result<Message> {
        if message.has_key(OPENID2_NS, "sig") || message.has_key(OPENID2_NS, "signed") {
            bail!("message already has a signed list or signature");
        }

        if let Some(extant) = message.get_arg(OPENID2_NS, "assoc_handle")
            && extant != self.handle
        {
            bail!("message association handle {extant:?} does not match {:?}", self.handle);
        }

        let mut signed_message = message.clone();
        signed_message.set_arg(OPENID2_NS, "assoc_handle", &self.handle)?;

        let post_args = signed_message.to_post_args();
        let mut signed_list: Vec<&str> = post_args.keys().filter_map(|key| key.strip_prefix(OPENID_PREFIX)).collect();
        signed_list.push("signed");
        signed_list.sort_unstable();

        signed_message.set_arg(OPENID2_NS, "signed", &signed_list.join(","))?;

        let sig = self.message_signature(&signed_message)?;
        signed_message.set_arg(OPENID2_NS, "sig", &sig)?;

        Ok(signed_message)
    }

    /// Checks a message's signature against this association's secret.
    ///
    /// A missing or empty `sig` field is an error: "nothing to check"
    /// must never be confused with "checked and rejected". A present but
    /// wrong signature is the `Ok(false)` rejection path. Comparison is
    /// constant-time.
    ///
    /// # Errors
    ///
    /// Returns an error if the message has no signature or no signed list.
    pub fn check_message_signature(&self, message: &Message) -> Result<bool> {
        let message_sig = message
            .get_arg(OPENID2_NS, "sig")
            .filter(|sig| !sig.is_empty())
            .ok_or_else(|| anyhow!("message has no signature to check"))?;

        let calculated_sig = self.message_signature(message)?;

        Ok(bool::from(calculated_sig.as_bytes().ct_eq(message_sig.as_bytes())))
    }

    /// Builds the ordered signature pairs from a message's signed list.
    fn make_pairs(&self, message: &Message) -> Result<Vec<(String, String)>> {
        let signed = message
            .get_arg(OPENID2_NS, "signed")
            .filter(|signed| !signed.is_empty())
            .ok_or_else(|| anyhow!("message has no signed list"))?;

        let post_args = message.to_post_args();
        let pairs = signed
            .split(',')
            .map(|field| {
                let value = post_args.get(&format!("{OPENID_PREFIX}{field}")).cloned().unwrap_or_default();
                (field.to_string(), value)
            })
            .collect();

        Ok(pairs)
    }
}
