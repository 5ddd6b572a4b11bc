//! Canonical request construction for AWS Signature Version 4.
//!
//! The canonical request is the exact text the storage service rebuilds on its
//! side and hashes before comparing signatures:
//!
//! ```text
//! HTTPRequestMethod\n
//! CanonicalURI\n
//! CanonicalQueryString\n
//! CanonicalHeaders\n
//! SignedHeaders\n
//! HashedPayload
//! ```
//!
//! `CanonicalHeaders` is a sequence of `name:value\n` entries, so a request with
//! headers ends that block with a blank line, and a request without headers
//! still contributes an empty line for it.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters that must be percent-encoded in URI segments and query components.
///
/// Everything except the RFC 3986 unreserved characters
/// (A-Z, a-z, 0-9, `-`, `_`, `.`, `~`) is encoded.
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the full canonical request string from its components.
///
/// `canonical_uri` and `canonical_query` are used verbatim; callers encode them
/// beforehand (see [`encode_object_key`] and [`build_canonical_query_string`]).
/// `signed_headers` is the already sorted, semicolon-joined list.
///
/// # Examples
///
/// ```
/// use s3link_sigv4::canonical::build_canonical_request;
///
/// let canonical = build_canonical_request("PUT", "/object", "a=b", &[], "", "hash123");
/// assert_eq!(canonical, "PUT\n/object\na=b\n\n\nhash123");
/// ```
#[must_use]
pub fn build_canonical_request(
    method: &str,
    canonical_uri: &str,
    canonical_query: &str,
    headers: &[(&str, &str)],
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    let canonical_headers = build_canonical_headers(headers);

    format!(
        "{method}\n{canonical_uri}\n{canonical_query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
    )
}

/// Build the canonical headers block.
///
/// Header names are lowercased, values are trimmed and inner runs of whitespace
/// collapse to a single space. Entries are sorted by name and each one is
/// terminated by `\n`. Repeated names are joined with commas in input order.
///
/// # Examples
///
/// ```
/// use s3link_sigv4::canonical::build_canonical_headers;
///
/// let block = build_canonical_headers(&[
///     ("X-Amz-Date", " 20130524T000000Z "),
///     ("Host", "example.com"),
/// ]);
/// assert_eq!(block, "host:example.com\nx-amz-date:20130524T000000Z\n");
/// ```
#[must_use]
pub fn build_canonical_headers(headers: &[(&str, &str)]) -> String {
    let mut header_map: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let lower_name = name.to_lowercase();
        let trimmed_value = collapse_whitespace(value.trim());
        header_map
            .entry(lower_name)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&trimmed_value);
            })
            .or_insert(trimmed_value);
    }

    header_map
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect()
}

/// Build the signed headers string as a semicolon-separated list of lowercase header names.
///
/// # Examples
///
/// ```
/// use s3link_sigv4::canonical::build_signed_headers_string;
///
/// assert_eq!(
///     build_signed_headers_string(&["x-amz-date", "Host"]),
///     "host;x-amz-date"
/// );
/// ```
#[must_use]
pub fn build_signed_headers_string(signed_headers: &[&str]) -> String {
    let mut sorted: Vec<String> = signed_headers.iter().map(|h| h.to_lowercase()).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.join(";")
}

/// Build a canonical query string from raw (unencoded) parameters.
///
/// Keys and values are percent-encoded, then the pairs are sorted by encoded
/// key (and value, for repeated keys) and joined with `&`.
///
/// # Examples
///
/// ```
/// use s3link_sigv4::canonical::build_canonical_query_string;
///
/// assert_eq!(
///     build_canonical_query_string(&[("b", "2"), ("a", "x/y")]),
///     "a=x%2Fy&b=2"
/// );
/// ```
#[must_use]
pub fn build_canonical_query_string(params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();

    encoded.sort_unstable();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical URI for an object key.
///
/// Each `/`-separated segment is percent-encoded on its own so that slashes in
/// the key survive as path separators. The key is not percent-decoded first.
///
/// # Examples
///
/// ```
/// use s3link_sigv4::canonical::encode_object_key;
///
/// assert_eq!(encode_object_key("test.txt"), "/test.txt");
/// assert_eq!(encode_object_key("dir/my file.txt"), "/dir/my%20file.txt");
/// ```
#[must_use]
pub fn encode_object_key(key: &str) -> String {
    let encoded = key.split('/').map(uri_encode).collect::<Vec<_>>().join("/");
    format!("/{encoded}")
}

/// Percent-encode a single URI component using the SigV4 encoding rules.
#[must_use]
pub fn uri_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_ENCODE_SET).to_string()
}

/// Collapse consecutive whitespace characters in a string to a single space.
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_was_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(ch);
            prev_was_space = false;
        }
    }
    result
}
