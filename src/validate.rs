//! Field rules for registration payloads.
//!
//! Fields are checked in the order username, email, type, password and only
//! the first failure is reported.

use crate::models::{NewAccount, Role};
use failure::Fail;
use lazy_static::lazy_static;
use regex::Regex;

pub const USERNAME_LEN: (usize, usize) = (3, 24);
pub const PASSWORD_LEN: (usize, usize) = (5, 24);
pub const SPECIAL_CHARS: &str = "!@#$%^&*";

lazy_static! {
    static ref ALPHANUM: Regex = Regex::new(r"^[A-Za-z0-9]+$").unwrap();
    static ref EMAIL_LOCAL: Regex =
        Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*$")
            .unwrap();
    static ref EMAIL_DOMAIN: Regex = Regex::new(
        r"^([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$"
    )
    .unwrap();
}

#[derive(Debug, Fail, PartialEq)]
pub enum ValidationError {
    #[fail(display = "\"{}\" is required", _0)]
    Missing(&'static str),
    #[fail(display = "\"{}\" is not allowed to be empty", _0)]
    Empty(&'static str),
    #[fail(display = "\"{}\" must only contain alpha-numeric characters", _0)]
    NotAlphanumeric(&'static str),
    #[fail(display = "\"{}\" length must be at least {} characters long", field, min)]
    TooShort { field: &'static str, min: usize },
    #[fail(
        display = "\"{}\" length must be less than or equal to {} characters long",
        field, max
    )]
    TooLong { field: &'static str, max: usize },
    #[fail(display = "\"email\" must be a valid email")]
    InvalidEmail,
    #[fail(display = "\"type\" must be one of [user, admin]")]
    InvalidRole,
    #[fail(
        display = "\"password\" must contain a lowercase letter, an uppercase letter and one of {}",
        _0
    )]
    WeakPassword(&'static str),
}

/// A registration request that passed every field rule.
#[derive(Debug)]
pub struct ValidAccount {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password: String,
}

fn required<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    match value.as_ref().map(String::as_str) {
        None => Err(ValidationError::Missing(field)),
        Some("") => Err(ValidationError::Empty(field)),
        Some(v) => Ok(v),
    }
}

fn length(field: &'static str, value: &str, (min, max): (usize, usize)) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        Err(ValidationError::TooShort { field, min })
    } else if len > max {
        Err(ValidationError::TooLong { field, max })
    } else {
        Ok(())
    }
}

pub fn username(value: &str) -> Result<(), ValidationError> {
    if !ALPHANUM.is_match(value) {
        return Err(ValidationError::NotAlphanumeric("username"));
    }
    length("username", value, USERNAME_LEN)
}

pub fn email(value: &str) -> Result<(), ValidationError> {
    let mut parts = value.rsplitn(2, '@');
    let (domain, local) = match (parts.next(), parts.next()) {
        (Some(domain), Some(local)) => (domain, local),
        _ => return Err(ValidationError::InvalidEmail),
    };

    if local.len() > 64
        || domain.len() > 255
        || !EMAIL_LOCAL.is_match(local)
        || !EMAIL_DOMAIN.is_match(domain)
    {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn role(value: &str) -> Result<Role, ValidationError> {
    value.parse().map_err(|_| ValidationError::InvalidRole)
}

pub fn password(value: &str) -> Result<(), ValidationError> {
    length("password", value, PASSWORD_LEN)?;

    let lower = value.chars().any(|c| c.is_ascii_lowercase());
    let upper = value.chars().any(|c| c.is_ascii_uppercase());
    let special = value.chars().any(|c| SPECIAL_CHARS.contains(c));
    if lower && upper && special {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword(SPECIAL_CHARS))
    }
}

pub fn account(candidate: &NewAccount) -> Result<ValidAccount, ValidationError> {
    let name = required("username", &candidate.username)?;
    username(name)?;

    let address = required("email", &candidate.email)?;
    email(address)?;

    let role = role(required("type", &candidate.role)?)?;

    let secret = required("password", &candidate.password)?;
    password(secret)?;

    Ok(ValidAccount {
        username: name.to_string(),
        email: address.to_string(),
        role,
        password: secret.to_string(),
    })
}
