use crate::secret;
use failure::Fail;
use std::path::Path;

static BIND_ADDRESS: &'static str = "BIND_ADDRESS";
static WORKERS: &'static str = "WORKERS";
static JSON_LIMIT: &'static str = "JSON_LIMIT";
static PEPPER: &'static str = "ACCOUNTS_PEPPER";

static PEPPER_SECRET: &'static str = "accounts_pepper";
static SECRETS_DIR: &'static str = "/run/secrets";

#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "{}: expected a positive integer, got {:?}", var, value)]
    NotANumber { var: &'static str, value: String },
    #[fail(display = "{}", _0)]
    Secret(#[cause] secret::SecretError),
}

#[derive(Debug)]
pub struct Config {
    pub bind_address: String,
    pub workers: usize,
    pub json_limit: usize,
    pub pepper: Vec<u8>,
}

fn number<F>(lookup: &F, var: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::NotANumber { var, value }),
        },
    }
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|var| std::env::var(var).ok(), Path::new(SECRETS_DIR))
    }

    pub fn from_lookup<F>(lookup: F, secrets_dir: &Path) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address = lookup(BIND_ADDRESS).unwrap_or_else(|| "localhost:3002".to_string());
        let workers = number(&lookup, WORKERS, 1)?;
        let json_limit = number(&lookup, JSON_LIMIT, 4096)?;

        let from_env = lookup(PEPPER);
        let from_file = match from_env {
            Some(_) => None,
            None => secret::secret(secrets_dir, PEPPER_SECRET).map_err(ConfigError::Secret)?,
        };

        Ok(Config {
            bind_address,
            workers,
            json_limit,
            pepper: secret::pepper(from_env, from_file),
        })
    }
}
