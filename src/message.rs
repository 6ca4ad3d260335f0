//! Protocol message container.
//!
//! A namespaced key-value view of one protocol request or response, with
//! just enough surface for the association layer to sign and verify:
//! argument get/set/has, the flattened POST-argument form used to build
//! signature input, and `Clone` for copy-on-sign. Extension-namespace handling
//! belongs to the surrounding consumer/server code.

use anyhow::{Result, ensure};
use hashbrown::HashMap;
use tracing::debug;

use crate::config::{OPENID2_NS, OPENID_PREFIX};

/// A single protocol message: a namespace plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    namespace: String,
    args: HashMap<String, String>,
}

impl Message {
    /// Creates an empty message in the OpenID 2.0 namespace.
    #[must_use]
    pub fn new() -> Self {
        Self { namespace: OPENID2_NS.to_string(), args: HashMap::new() }
    }

    /// Builds a message from flattened `openid.`-prefixed POST arguments.
    ///
    /// An `openid.ns` entry overrides the message namespace. Arguments
    /// without the protocol prefix are not part of the message and are
    /// discarded with a debug log.
    #[must_use]
    pub fn from_post_args<K: AsRef<str>, V: AsRef<str>>(post_args: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut message = Self::new();

        for (key, value) in post_args {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key.strip_prefix(OPENID_PREFIX) {
                Some("ns") => message.namespace = value.to_string(),
                Some(field) => {
                    message.args.insert(field.to_string(), value.to_string());
                }
                None => debug!(key = %key, "discarding non-protocol argument"),
            }
        }

        message
    }

    /// Returns the value of `key` in `namespace`, if present.
    #[must_use]
    pub fn get_arg(&self, namespace: &str, key: &str) -> Option<&str> {
        if namespace == self.namespace { self.args.get(key).map(String::as_str) } else { None }
    }

    /// Sets `key` to `value` in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns an error if `namespace` is not this message's namespace.
    pub fn set_arg(&mut self, namespace: &str, key: &str, value: &str) -> Result<()> {
        ensure!(namespace == self.namespace, "unknown message namespace: {namespace:?}");

        self.args.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Reports whether `key` is present in `namespace`.
    #[must_use]
    pub fn has_key(&self, namespace: &str, key: &str) -> bool {
        namespace == self.namespace && self.args.contains_key(key)
    }

    /// Returns the flattened POST-argument form: `openid.field` to value.
    #[must_use]
    pub fn to_post_args(&self) -> HashMap<String, String> {
        self.args.iter().map(|(key, value)| (format!("{OPENID_PREFIX}{key}"), value.clone())).collect()
    }

    /// The message's protocol namespace URI.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut message = Message::new();
        message.set_arg(OPENID2_NS, "mode", "id_res").unwrap();

        assert_eq!(message.get_arg(OPENID2_NS, "mode"), Some("id_res"));
        assert!(message.has_key(OPENID2_NS, "mode"));
        assert!(!message.has_key(OPENID2_NS, "identity"));
    }

    #[test]
    fn test_wrong_namespace() {
        let mut message = Message::new();
        message.set_arg(OPENID2_NS, "mode", "id_res").unwrap();

        assert_eq!(message.get_arg("http://example.com/other", "mode"), None);
        assert!(!message.has_key("http://example.com/other", "mode"));
        assert!(message.set_arg("http://example.com/other", "mode", "id_res").is_err());
    }

    #[test]
    fn test_to_post_args_prefixes() {
        let mut message = Message::new();
        message.set_arg(OPENID2_NS, "mode", "id_res").unwrap();
        message.set_arg(OPENID2_NS, "identity", "http://example.com/u").unwrap();

        let post_args = message.to_post_args();
        assert_eq!(post_args.get("openid.mode").map(String::as_str), Some("id_res"));
        assert_eq!(post_args.get("openid.identity").map(String::as_str), Some("http://example.com/u"));
        assert_eq!(post_args.len(), 2);
    }

    #[test]
    fn test_from_post_args() {
        let message = Message::from_post_args([("openid.mode", "id_res"), ("openid.identity", "http://example.com/u"), ("cachebuster", "1")]);

        assert_eq!(message.get_arg(OPENID2_NS, "mode"), Some("id_res"));
        assert_eq!(message.get_arg(OPENID2_NS, "identity"), Some("http://example.com/u"));
        assert!(!message.has_key(OPENID2_NS, "cachebuster"));
    }

    #[test]
    fn test_from_post_args_namespace_override() {
        let message = Message::from_post_args([("openid.ns", "http://example.com/custom"), ("openid.mode", "id_res")]);

        assert_eq!(message.namespace(), "http://example.com/custom");
        assert_eq!(message.get_arg("http://example.com/custom", "mode"), Some("id_res"));
        assert_eq!(message.get_arg(OPENID2_NS, "mode"), None);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut message = Message::new();
        message.set_arg(OPENID2_NS, "mode", "id_res").unwrap();

        let mut copy = message.clone();
        copy.set_arg(OPENID2_NS, "mode", "cancel").unwrap();

        assert_eq!(message.get_arg(OPENID2_NS, "mode"), Some("id_res"));
        assert_eq!(copy.get_arg(OPENID2_NS, "mode"), Some("cancel"));
    }
}
