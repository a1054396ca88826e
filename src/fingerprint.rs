//! URL fingerprinting.
//!
//! The fingerprint is the MD5 digest of the URL text. It is a cache key, not
//! a security boundary: identical text always maps to the same key and
//! distinct text collides only with negligible probability. Two URLs that
//! serve the same bytes are distinct keys.

use md5::{Digest, Md5};

use crate::model::Fingerprint;

/// Digest a URL string into a 128-bit key.
pub fn fingerprint(url: &str) -> Fingerprint {
    let digest = Md5::digest(url.as_bytes());
    let mut key = [0u8; 16];
    key.copy_from_slice(&digest);
    Fingerprint(key)
}
