use anyhow::Context;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::warn;

/// Plaintext behind the decoy hash compared against when a login names no
/// account. The decoy is never attached to a user record.
const DECOY_SECRET: &str = "geowise-no-such-user";

/// Stored credentials are always Argon2id v1.3 with the crate's default cost.
fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Returns the PHC string (`$argon2id$v=19$...`) for `plain` under a fresh salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    hasher()
        .hash_password(plain.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| anyhow::anyhow!("argon2 hashing failed: {e}"))
}

/// A valid hash of a secret no account uses, so unknown-user logins cost the
/// same as wrong-password ones.
pub fn decoy_hash() -> anyhow::Result<String> {
    hash_password(DECOY_SECRET).context("building decoy password hash")
}

/// `Ok(false)` on a mismatch. A stored value that is not a usable PHC string
/// is an error, never a silent rejection.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let phc = PasswordHash::new(stored).map_err(|e| {
        warn!(error = %e, "stored password hash does not parse");
        anyhow::anyhow!("stored password hash is malformed")
    })?;
    match hasher().verify_password(plain.as_bytes(), &phc) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("argon2 verification failed: {e}")),
    }
}
