//! Hash primitives used by the signing chain.
//!
//! Both functions are total over arbitrary byte input and produce 32-byte
//! SHA-256 sized digests.

use hmac::{Hmac, KeyInit, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Compute the SHA-256 hash of the given payload and return it as a lowercase hex string.
///
/// Used both for the `x-amz-content-sha256` header value and for hashing the
/// canonical request into the string to sign.
///
/// # Examples
///
/// ```
/// use s3link_sigv4::crypto::hash_payload;
///
/// assert_eq!(
///     hash_payload(b""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
#[must_use]
pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Compute HMAC-SHA256 and return the raw bytes.
#[must_use]
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can accept keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
