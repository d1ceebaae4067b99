//! Content digests for change detection.
//!
//! Both the scanner and the apply task hash the raw blueprint bytes with
//! SHA-512. The two digests must agree for an unchanged file, which is what
//! makes re-applying a no-op upstream.

use sha2::{Digest, Sha512};

/// Length of a hex-encoded digest (512 bits).
pub const DIGEST_HEX_LEN: usize = 128;

/// Compute the lowercase hex SHA-512 digest of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha512::digest(bytes))
}
