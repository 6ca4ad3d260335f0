//! Protocol constants.
//!
//! This module collects the fixed parameters of the OpenID 2.0 association
//! protocol: namespace identifiers, the serialized-record layout, and the
//! per-algorithm key and digest sizes. Everything here is dictated by the
//! protocol; none of it is tunable.

/// Namespace URI identifying OpenID 2.0 protocol messages.
///
/// Every message argument handled by this crate lives under this namespace.
/// Extension namespaces are negotiated by the surrounding consumer/server
/// code and never reach the association layer.
pub const OPENID2_NS: &str = "http://specs.openid.net/auth/2.0";

/// Prefix applied to protocol fields in flattened POST-argument form.
///
/// A message field `mode` appears as `openid.mode` on the wire. Signature
/// input is built from the unprefixed names, but field lookup during
/// verification goes through the prefixed form.
pub const OPENID_PREFIX: &str = "openid.";

// === Association serialization ===
// The stored form of an association is a fixed sequence of key-value lines.
// Both the version literal and the field order are part of the format: a
// record with a different version or a reordered field set is rejected.

/// Version literal carried in the first line of a serialized association.
pub const ASSOCIATION_VERSION: &str = "2";

/// Canonical field order of a serialized association record.
///
/// `deserialize` requires exactly these keys in exactly this order.
pub const ASSOCIATION_FIELDS: [&str; 6] = ["version", "handle", "secret", "issued", "lifetime", "assoc_type"];

// === Algorithm parameters ===
// Secret and digest sizes are fixed by the HMAC construction: the shared
// secret is exactly one digest of keying material, and the MAC output is
// the full digest.

/// Shared-secret and digest size for HMAC-SHA1 associations, in bytes.
pub const SHA1_SECRET_SIZE: usize = 20;

/// Shared-secret and digest size for HMAC-SHA256 associations, in bytes.
pub const SHA256_SECRET_SIZE: usize = 32;

// === Storage ===

/// File extension for association records written by the file store.
pub const ASSOCIATION_FILE_EXTENSION: &str = ".assoc";

/// Hex digits of the URL/handle digest kept in a store filename.
///
/// Half of a SHA-256 digest; enough that collisions are not a practical
/// concern while keeping combined filenames well under common path limits.
pub const STORE_DIGEST_LEN: usize = 32;
