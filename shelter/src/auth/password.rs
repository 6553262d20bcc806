//! Argon2id hashes for account passwords.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...`), the same format configured accounts
//! carry in `auth.users[].hashed_password`.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::errors::Error;

/// Cost settings used when minting a new hash.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    fn hasher(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("build argon2 cost settings: {e}"),
        })?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    // 19 MiB, two passes, one lane
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Hash `password` under a fresh random salt with explicit cost settings.
///
/// Tests pass cheap settings here; startup hashing of the bootstrap account goes through
/// [`hash_password`].
pub fn hash_with(password: &str, params: Argon2Params) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    params
        .hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal {
            operation: format!("hash password: {e}"),
        })
}

pub fn hash_password(password: &str) -> Result<String, Error> {
    hash_with(password, Argon2Params::default())
}

/// Check `password` against a stored PHC string. The cost settings come from the string,
/// so accounts hashed under older settings keep working.
///
/// A wrong password is `Ok(false)`. Only an unparseable hash is an error.
pub fn verify_password(password: &str, phc: &str) -> Result<bool, Error> {
    let stored = PasswordHash::new(phc).map_err(|e| Error::Internal {
        operation: format!("parse stored password hash: {e}"),
    })?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &stored).is_ok())
}
