//! Stable event identifiers derived from the feed.
//!
//! Google only accepts event ids made of the base32hex alphabet (`a-v`,
//! `0-9`) with a length between 5 and 1024 characters.

use sha2::{Digest, Sha256};

const ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

pub const MIN_ID_LEN: usize = 5;
pub const MAX_ID_LEN: usize = 1024;

/// Derive the remote identifier for a `(uid, recurrence_id, sequence)` tuple.
///
/// Absent parts contribute nothing to the key, so bumping the sequence of an
/// event yields a new identity.
pub fn generate_id(uid: &str, recurrence_id: Option<&str>, sequence: Option<i64>) -> String {
    let sequence = sequence.map(|s| s.to_string()).unwrap_or_default();
    let key = format!("{}{}{}", uid, recurrence_id.unwrap_or_default(), sequence);

    let id = base32hex(key.as_bytes());
    if (MIN_ID_LEN..=MAX_ID_LEN).contains(&id.len()) {
        id
    } else {
        base32hex(&Sha256::digest(key.as_bytes()))
    }
}

/// RFC 4648 base32hex, lowercase, unpadded.
fn base32hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(5) * 8);
    let mut buffer: u16 = 0;
    let mut bits = 0;

    for &byte in bytes {
        buffer = (buffer << 8) | u16::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[usize::from((buffer >> bits) & 0x1f)] as char);
        }
        buffer &= (1 << bits) - 1;
    }

    if bits > 0 {
        out.push(ALPHABET[usize::from((buffer << (5 - bits)) & 0x1f)] as char);
    }

    out
}

/// Whether the remote service would accept `id` as an event identifier.
pub fn is_valid_id(id: &str) -> bool {
    (MIN_ID_LEN..=MAX_ID_LEN).contains(&id.len())
        && id.bytes().all(|b| ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base32hex_matches_rfc4648_vectors() {
        assert_eq!(base32hex(b""), "");
        assert_eq!(base32hex(b"f"), "co");
        assert_eq!(base32hex(b"fo"), "cpng");
        assert_eq!(base32hex(b"foo"), "cpnmu");
        assert_eq!(base32hex(b"foob"), "cpnmuog");
        assert_eq!(base32hex(b"fooba"), "cpnmuoj1");
        assert_eq!(base32hex(b"foobar"), "cpnmuoj1e8");
    }

    #[test]
    fn test_generate_id_is_deterministic() {
        let a = generate_id("event-1@example.com", Some("20240108T100000Z"), Some(2));
        let b = generate_id("event-1@example.com", Some("20240108T100000Z"), Some(2));
        assert_eq!(a, b);
        assert!(is_valid_id(&a));
    }

    #[test]
    fn test_sequence_bump_changes_identity() {
        assert_ne!(
            generate_id("abc", None, Some(0)),
            generate_id("abc", None, Some(1))
        );
        assert_ne!(generate_id("abc", None, None), generate_id("abc", None, Some(0)));
    }

    #[test]
    fn test_recurrence_instances_get_distinct_ids() {
        let first = generate_id("weekly@example.com", Some("20240108T100000Z"), None);
        let second = generate_id("weekly@example.com", Some("20240115T100000Z"), None);
        assert_ne!(first, second);
    }

    #[test]
    fn test_short_and_long_keys_stay_in_bounds() {
        let short = generate_id("a", None, None);
        assert!(is_valid_id(&short), "{short}");

        let long_uid = "x".repeat(2000);
        let long = generate_id(&long_uid, None, Some(3));
        assert!(is_valid_id(&long), "{long}");
        assert_eq!(long.len(), 52);
        assert_ne!(long, generate_id(&long_uid, None, Some(4)));
    }

    #[test]
    fn test_is_valid_id_rejects_foreign_characters() {
        assert!(!is_valid_id("abcdw"));
        assert!(!is_valid_id("ABCDE"));
        assert!(!is_valid_id("abcd"));
        assert!(is_valid_id("0123v"));
    }
}
