//! Association management and assertion verification for OpenID 2.0.
//!
//! The protocol core a relying party and provider share:
//! - HMAC-SHA1 / HMAC-SHA256 associations with handle, secret, and expiry
//! - Canonical key-value form encoding for storage and signature input
//! - Message signing and constant-time signature verification
//! - Session negotiation policy over allowed algorithm/session pairings
//! - In-memory and on-disk association stores
//!
//! Discovery, key exchange, and the HTTP surfaces sit above this crate.

pub mod association;
pub mod config;
pub mod kvform;
pub mod mac;
pub mod message;
pub mod negotiator;
pub mod secret;
pub mod store;
pub mod types;

pub use association::Association;
pub use message::Message;
pub use negotiator::{DEFAULT_NEGOTIATOR, ENCRYPTED_NEGOTIATOR, SessionNegotiator};
pub use secret::SecretBytes;
pub use store::{AssociationStore, FileStore, MemoryStore};
pub use types::{AssociationType, SessionType};
