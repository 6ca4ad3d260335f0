//! Association and session type identifiers.
//!
//! The protocol names its MAC algorithms and key-exchange sessions with
//! fixed strings; both sets are closed. The compatibility table between
//! them lives here as [`AssociationType::session_types`] so that every
//! policy check in the crate consults the same data.

use strum::{Display, EnumString, IntoStaticStr};

use crate::config::{SHA1_SECRET_SIZE, SHA256_SECRET_SIZE};

/// MAC algorithm negotiated for an association.
///
/// The wire string doubles as the `assoc_type` field of a serialized
/// association, so the `strum` attributes are part of the storage format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum AssociationType {
    /// HMAC keyed with a 20-byte secret over SHA-1.
    #[strum(serialize = "HMAC-SHA1")]
    HmacSha1,

    /// HMAC keyed with a 32-byte secret over SHA-256.
    #[strum(serialize = "HMAC-SHA256")]
    HmacSha256,
}

impl AssociationType {
    /// All supported association types, in preference order.
    pub const ALL: &'static [Self] = &[Self::HmacSha1, Self::HmacSha256];

    /// Required shared-secret length in bytes.
    #[inline]
    #[must_use]
    pub const fn secret_size(self) -> usize {
        match self {
            Self::HmacSha1 => SHA1_SECRET_SIZE,
            Self::HmacSha256 => SHA256_SECRET_SIZE,
        }
    }

    /// MAC output length in bytes.
    #[inline]
    #[must_use]
    pub const fn mac_size(self) -> usize {
        // Output digest size equals the secret size for both algorithms.
        self.secret_size()
    }

    /// Session types valid for this association type, in table order.
    ///
    /// This is the protocol's fixed compatibility table: a Diffie-Hellman
    /// session must use the same digest as the association it establishes,
    /// and `no-encryption` is acceptable for either algorithm.
    #[must_use]
    pub const fn session_types(self) -> &'static [SessionType] {
        match self {
            Self::HmacSha1 => &[SessionType::DhSha1, SessionType::NoEncryption],
            Self::HmacSha256 => &[SessionType::DhSha256, SessionType::NoEncryption],
        }
    }
}

/// Key-exchange session used to establish an association secret.
///
/// The exchange itself happens in the consumer/server layer; this crate
/// only carries the identifier for negotiation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum SessionType {
    /// Diffie-Hellman exchange digested with SHA-1.
    #[strum(serialize = "DH-SHA1")]
    DhSha1,

    /// Diffie-Hellman exchange digested with SHA-256.
    #[strum(serialize = "DH-SHA256")]
    DhSha256,

    /// Secret transmitted in the clear; requires transport security.
    #[strum(serialize = "no-encryption")]
    NoEncryption,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_strings_round_trip() {
        for &assoc_type in AssociationType::ALL {
            let wire: &'static str = assoc_type.into();
            assert_eq!(wire.parse::<AssociationType>().unwrap(), assoc_type);
        }

        for session_type in [SessionType::DhSha1, SessionType::DhSha256, SessionType::NoEncryption] {
            let wire: &'static str = session_type.into();
            assert_eq!(wire.parse::<SessionType>().unwrap(), session_type);
        }
    }

    #[test]
    fn test_wire_string_values() {
        assert_eq!(AssociationType::HmacSha1.to_string(), "HMAC-SHA1");
        assert_eq!(AssociationType::HmacSha256.to_string(), "HMAC-SHA256");
        assert_eq!(SessionType::NoEncryption.to_string(), "no-encryption");
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!("HMAC-MD5".parse::<AssociationType>().is_err());
        assert!("".parse::<AssociationType>().is_err());
        assert!("DH-SHA512".parse::<SessionType>().is_err());
    }

    #[test]
    fn test_compatibility_table() {
        assert_eq!(AssociationType::HmacSha1.session_types(), &[SessionType::DhSha1, SessionType::NoEncryption]);
        assert_eq!(AssociationType::HmacSha256.session_types(), &[SessionType::DhSha256, SessionType::NoEncryption]);
    }

    #[test]
    fn test_secret_sizes() {
        assert_eq!(AssociationType::HmacSha1.secret_size(), 20);
        assert_eq!(AssociationType::HmacSha256.secret_size(), 32);
    }
}
