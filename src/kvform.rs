//! Key-value form encoding.
//!
//! The protocol's line-oriented `key:value\n` format, used both for stored
//! association records and as the canonical byte sequence fed to the MAC.
//! Strict mode rejects anything that would not round-trip: a delimiter
//! inside a key or value must abort signing rather than silently change
//! the signed bytes. Non-strict mode tolerates and logs, and exists only
//! for informal serialization.

use anyhow::{Result, bail};
use tracing::warn;

fn violation(strict: bool, message: String) -> Result<()> {
    if strict {
        bail!(message);
    }

    warn!("{message}");
    Ok(())
}

/// Encodes an ordered pair sequence as `key:value\n` lines.
///
/// Order is preserved exactly; the output of this function is signature
/// input, so two calls with the same pairs yield identical bytes.
///
/// # Errors
///
/// In strict mode, returns an error if a key contains a colon, a key or
/// value contains a newline, or a key or value carries leading/trailing
/// whitespace.
pub fn encode<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)], strict: bool) -> Result<String> {
    let mut output = String::new();

    for (key, value) in pairs {
        let (key, value) = (key.as_ref(), value.as_ref());

        if key.contains('\n') {
            violation(strict, format!("key contains newline: {key:?}"))?;
        }
        if key.contains(':') {
            violation(strict, format!("key contains colon: {key:?}"))?;
        }
        if key.trim() != key {
            violation(strict, format!("key has leading or trailing whitespace: {key:?}"))?;
        }
        if value.contains('\n') {
            violation(strict, format!("value contains newline: {value:?}"))?;
        }
        if value.trim() != value {
            violation(strict, format!("value has leading or trailing whitespace: {value:?}"))?;
        }

        output.push_str(key);
        output.push(':');
        output.push_str(value);
        output.push('\n');
    }

    Ok(output)
}

/// Decodes `key:value\n` lines into an ordered pair sequence.
///
/// Each line is split on its first colon, so values may contain colons.
/// Blank lines are ignored. Non-strict mode strips stray whitespace around
/// keys and values and skips lines with no colon; strict mode rejects
/// both, as well as input not ending in a newline.
///
/// # Errors
///
/// In strict mode, returns an error on a missing trailing newline, a line
/// without a colon, or whitespace-padded keys/values.
pub fn decode(input: &str, strict: bool) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();

    if input.is_empty() {
        return Ok(pairs);
    }

    let mut lines: Vec<&str> = input.split('\n').collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    } else {
        violation(strict, "input does not end in a newline".to_string())?;
    }

    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            violation(strict, format!("line {} has no colon: {line:?}", index + 1))?;
            continue;
        };

        if key.trim() != key {
            violation(strict, format!("line {}: key has surrounding whitespace: {key:?}", index + 1))?;
        }
        if value.trim() != value {
            violation(strict, format!("line {}: value has surrounding whitespace: {value:?}", index + 1))?;
        }

        pairs.push((key.trim().to_string(), value.trim().to_string()));
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_basic() {
        let pairs = [("mode", "id_res"), ("signed", "mode")];
        assert_eq!(encode(&pairs, true).unwrap(), "mode:id_res\nsigned:mode\n");
    }

    #[test]
    fn test_decode_preserves_order() {
        let pairs = decode("mode:id_res\nsigned:mode\n", true).unwrap();
        assert_eq!(pairs, vec![("mode".to_string(), "id_res".to_string()), ("signed".to_string(), "mode".to_string())]);
    }

    #[test]
    fn test_round_trip() {
        let pairs = [("z", "last"), ("a", "first"), ("m", "middle")];
        let encoded = encode(&pairs, true).unwrap();
        let decoded = decode(&encoded, true).unwrap();
        let expected: Vec<(String, String)> = pairs.iter().map(|&(k, v)| (k.to_string(), v.to_string())).collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_value_may_contain_colon() {
        let pairs = decode("claimed_id:http://example.com/\n", true).unwrap();
        assert_eq!(pairs, vec![("claimed_id".to_string(), "http://example.com/".to_string())]);
    }

    #[test]
    fn test_encode_strict_rejects_colon_in_key() {
        assert!(encode(&[("bad:key", "value")], true).is_err());
    }

    #[test]
    fn test_encode_strict_rejects_newline() {
        assert!(encode(&[("key", "two\nlines")], true).is_err());
        assert!(encode(&[("two\nkeys", "value")], true).is_err());
    }

    #[test]
    fn test_encode_strict_rejects_padded_key() {
        assert!(encode(&[(" key", "value")], true).is_err());
        assert!(encode(&[("key", "value ")], true).is_err());
    }

    #[test]
    fn test_encode_tolerant_keeps_going() {
        let encoded = encode(&[("key", "value ")], false).unwrap();
        assert_eq!(encoded, "key:value \n");
    }

    #[test]
    fn test_decode_strict_rejects_missing_trailing_newline() {
        assert!(decode("mode:id_res", true).is_err());
        assert!(decode("mode:id_res", false).is_ok());
    }

    #[test]
    fn test_decode_strict_rejects_colonless_line() {
        assert!(decode("no colon here\n", true).is_err());
    }

    #[test]
    fn test_decode_tolerant_skips_colonless_line() {
        let pairs = decode("no colon here\nmode:id_res\n", false).unwrap();
        assert_eq!(pairs, vec![("mode".to_string(), "id_res".to_string())]);
    }

    #[test]
    fn test_decode_tolerant_strips_whitespace() {
        let pairs = decode(" mode : id_res \n", false).unwrap();
        assert_eq!(pairs, vec![("mode".to_string(), "id_res".to_string())]);
    }

    #[test]
    fn test_decode_ignores_blank_lines() {
        let pairs = decode("mode:id_res\n\nsigned:mode\n", false).unwrap();
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(decode("", true).unwrap().is_empty());
    }

    #[test]
    fn test_encode_empty_value() {
        assert_eq!(encode(&[("identity", "")], true).unwrap(), "identity:\n");
    }
}
