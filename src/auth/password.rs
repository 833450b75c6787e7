use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::app::{QuireError, Result};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const OUTPUT_LEN: usize = 32;

/// OWASP 2023 recommendation for PBKDF2-HMAC-SHA256.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

/// One-way credential hashing.
///
/// Digests are self-describing strings of the form
/// `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`, so the iteration count
/// can be raised later without invalidating stored credentials.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::with_iterations(DEFAULT_ITERATIONS)
    }

    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let mut salt = [0u8; SALT_LEN];
        rand::rngs::OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| QuireError::Hash(e.to_string()))?;

        let out = derive(plaintext.as_bytes(), &salt, self.iterations);
        Ok(format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            hex::encode(salt),
            hex::encode(out)
        ))
    }

    /// Returns `false` on mismatch and on any malformed digest.
    pub fn verify(&self, digest: &str, plaintext: &str) -> bool {
        let Some((iterations, salt, expected)) = split_digest(digest) else {
            return false;
        };
        if expected.len() != OUTPUT_LEN {
            return false;
        }

        let out = derive(plaintext.as_bytes(), &salt, iterations);
        out.as_slice().ct_eq(expected.as_slice()).into()
    }

    /// Spends the same effort as verifying against a digest produced by this
    /// hasher, then fails. Used when no stored digest exists.
    pub fn verify_missing(&self, plaintext: &str) -> bool {
        let salt = [0u8; SALT_LEN];
        std::hint::black_box(derive(plaintext.as_bytes(), &salt, self.iterations));
        false
    }
}

fn derive(secret: &[u8], salt: &[u8], iterations: u32) -> [u8; OUTPUT_LEN] {
    let mut out = [0u8; OUTPUT_LEN];
    pbkdf2_hmac::<Sha256>(secret, salt, iterations, &mut out);
    out
}

fn split_digest(digest: &str) -> Option<(u32, Vec<u8>, Vec<u8>)> {
    let mut parts = digest.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let iterations = parts.next()?.parse::<u32>().ok().filter(|i| *i > 0)?;
    let salt = hex::decode(parts.next()?).ok()?;
    let hash = hex::decode(parts.next()?).ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((iterations, salt, hash))
}
