//! Percent-encoding for geocoding request URLs.

use std::fmt::Write as _;

/// Encodes a string for use as a URL query value.
///
/// Matches JavaScript's `encodeURIComponent` with the additional escaping
/// of `!'()*`, so exactly the RFC 3986 unreserved characters
/// (`A-Z a-z 0-9 - _ . ~`) survive unescaped. Non-ASCII characters are
/// encoded byte-wise as UTF-8.
pub(crate) fn encode_uri_component(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                let _ = write!(encoded, "%{:02X}", byte);
            }
        }
    }
    encoded
}
