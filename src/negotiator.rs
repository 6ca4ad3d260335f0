//! Association negotiation policy.
//!
//! A [`SessionNegotiator`] holds an ordered list of acceptable
//! (association type, session type) pairs, where earlier means more preferred.
//! Both roles consult it: the consumer asks for its most-preferred pair
//! when requesting an association, the provider checks whether a requested
//! pairing is acceptable before granting one.
//!
//! Two preconfigured instances are exported as process-wide immutable
//! statics; clone one to get a mutable working copy.

use std::sync::LazyLock;

use anyhow::{Result, ensure};

use crate::types::{AssociationType, SessionType};

/// Ordered policy over allowed association/session pairings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionNegotiator {
    allowed_types: Vec<(AssociationType, SessionType)>,
}

impl SessionNegotiator {
    /// Creates a negotiator from a preference-ordered pair list.
    ///
    /// # Errors
    ///
    /// Returns an error if any pair violates the compatibility table.
    pub fn new(allowed_types: Vec<(AssociationType, SessionType)>) -> Result<Self> {
        let mut negotiator = Self::default();
        negotiator.set_allowed_types(allowed_types)?;
        Ok(negotiator)
    }

    /// Replaces the full allowed list.
    ///
    /// All-or-nothing: if any pair is invalid the current list is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if any pair violates the compatibility table.
    pub fn set_allowed_types(&mut self, allowed_types: Vec<(AssociationType, SessionType)>) -> Result<()> {
        for &(assoc_type, session_type) in &allowed_types {
            ensure!(
                assoc_type.session_types().contains(&session_type),
                "session type {session_type} is not valid for association type {assoc_type}"
            );
        }

        self.allowed_types = allowed_types;
        Ok(())
    }

    /// Appends a pairing at the end of the preference order.
    ///
    /// With no session type given, every session type valid for
    /// `assoc_type` is appended in table order, so one call may add
    /// several pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the pairing violates the compatibility table.
    pub fn add_allowed_type(&mut self, assoc_type: AssociationType, session_type: Option<SessionType>) -> Result<()> {
        match session_type {
            None => {
                for &session_type in assoc_type.session_types() {
                    self.add_allowed_type(assoc_type, Some(session_type))?;
                }
            }
            Some(session_type) => {
                ensure!(
                    assoc_type.session_types().contains(&session_type),
                    "session type {session_type} is not valid for association type {assoc_type}"
                );
                self.allowed_types.push((assoc_type, session_type));
            }
        }

        Ok(())
    }

    /// Reports whether a pairing is acceptable.
    ///
    /// The pair must be in the configured list and valid per the static
    /// table; an entry that reached the list without validation still
    /// cannot approve an incompatible pairing.
    #[must_use]
    pub fn is_allowed(&self, assoc_type: AssociationType, session_type: SessionType) -> bool {
        self.allowed_types.contains(&(assoc_type, session_type)) && assoc_type.session_types().contains(&session_type)
    }

    /// Returns the most-preferred pairing, if any.
    #[must_use]
    pub fn allowed_type(&self) -> Option<(AssociationType, SessionType)> {
        self.allowed_types.first().copied()
    }
}

/// Default policy: every valid pairing, unencrypted sessions included.
///
/// Suitable when the transport already provides confidentiality.
pub static DEFAULT_NEGOTIATOR: LazyLock<SessionNegotiator> = LazyLock::new(|| SessionNegotiator {
    allowed_types: vec![
        (AssociationType::HmacSha1, SessionType::DhSha1),
        (AssociationType::HmacSha1, SessionType::NoEncryption),
        (AssociationType::HmacSha256, SessionType::DhSha256),
        (AssociationType::HmacSha256, SessionType::NoEncryption),
    ],
});

/// Encrypted-only policy: refuses `no-encryption` sessions entirely.
///
/// For channels without independent transport security.
pub static ENCRYPTED_NEGOTIATOR: LazyLock<SessionNegotiator> = LazyLock::new(|| SessionNegotiator {
    allowed_types: vec![(AssociationType::HmacSha1, SessionType::DhSha1), (AssociationType::HmacSha256, SessionType::DhSha256)],
});
