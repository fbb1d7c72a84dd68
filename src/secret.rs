use failure::Fail;
use log::warn;
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// argon2rs accepts at most 32 bytes of secret key.
pub const PEPPER_LEN: usize = 32;

#[derive(Debug, Fail)]
#[fail(display = "Failed to read {}: {}", path, cause)]
pub struct SecretError {
    path: String,
    #[cause]
    cause: std::io::Error,
}

fn secret_path<S>(dir: &Path, name: S) -> PathBuf
where
    S: AsRef<str>,
{
    dir.join(name.as_ref())
}

/// Read a Docker secret from `dir`, `Ok(None)` if it was never created.
pub fn secret<S>(dir: &Path, name: S) -> Result<Option<Vec<u8>>, SecretError>
where
    S: AsRef<str>,
{
    let path = secret_path(dir, name);
    match fs::read(&path) {
        Ok(data) => Ok(Some(data)),
        Err(ref e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(cause) => Err(SecretError {
            path: path.display().to_string(),
            cause,
        }),
    }
}

/// Pick the pepper: the environment value wins over the secret file. With
/// neither, hashes are salted only.
pub fn pepper(from_env: Option<String>, from_file: Option<Vec<u8>>) -> Vec<u8> {
    let mut pepper = match (from_env, from_file) {
        (Some(v), _) => v.into_bytes(),
        (None, Some(data)) => data,
        (None, None) => {
            warn!(
                "no pepper configured. Create the 'accounts_pepper' secret with \
                 'docker secret create' or set ACCOUNTS_PEPPER."
            );
            Vec::new()
        }
    };
    pepper.truncate(PEPPER_LEN);
    pepper
}
