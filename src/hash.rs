use argon2rs::{verifier::constant_eq, Argon2, Variant};
use failure::Fail;
use ring::rand::{SecureRandom, SystemRandom};

pub const SALT_LEN: usize = 32;
pub const HASH_LEN: usize = 32;

#[derive(Debug, Fail, PartialEq)]
pub enum HashError {
    #[fail(display = "system random number generator failed")]
    Rng,
    #[fail(display = "stored salt or hash could not be decoded")]
    Corrupt,
}

/// Generate a random 32-byte salt value.
fn random_salt(rng: &SystemRandom) -> Result<[u8; SALT_LEN], HashError> {
    let mut salt = [0; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| HashError::Rng)?;
    Ok(salt)
}

/// Raw argon2i output. The pepper is the argon2 secret key and never ends up
/// in the result.
fn argon2_session(salt: &[u8], pepper: &[u8], password: &str) -> [u8; HASH_LEN] {
    let mut out = [0; HASH_LEN];
    Argon2::default(Variant::Argon2i).hash(&mut out, password.as_bytes(), salt, pepper, b"");
    out
}

pub struct SaltedHash {
    salt: [u8; SALT_LEN],
    hash: [u8; HASH_LEN],
}

impl SaltedHash {
    /// Generate a random salt, then salt and pepper the password
    pub fn from_password(
        rng: &SystemRandom,
        pepper: &[u8],
        password: &str,
    ) -> Result<SaltedHash, HashError> {
        let salt = random_salt(rng)?;
        let hash = argon2_session(&salt, pepper, password);

        Ok(SaltedHash { salt, hash })
    }

    pub fn salt_base64(&self) -> String {
        base64::encode(&self.salt)
    }

    pub fn hash_base64(&self) -> String {
        base64::encode(&self.hash)
    }
}

/// Recompute the hash of `password` with the stored salt and compare it to
/// the stored hash in constant time.
pub fn verify(
    salt_base64: &str,
    hash_base64: &str,
    pepper: &[u8],
    password: &str,
) -> Result<bool, HashError> {
    let salt = base64::decode(salt_base64).map_err(|_| HashError::Corrupt)?;
    let expected = base64::decode(hash_base64).map_err(|_| HashError::Corrupt)?;
    if salt.len() != SALT_LEN || expected.len() != HASH_LEN {
        return Err(HashError::Corrupt);
    }

    let actual = argon2_session(&salt, pepper, password);
    Ok(constant_eq(&actual, &expected))
}
