use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Role, ()> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Admin => f.write_str("admin"),
        }
    }
}

/// A stored account, keyed by `username`.
#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub salt_base64: String,
    /// Base64 of the raw argon2i output. The pepper is never stored.
    pub hash_base64: String,
}

impl Account {
    pub fn view(&self) -> AccountView {
        AccountView {
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// What callers get to see of an account.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AccountView {
    pub email: String,
    #[serde(rename = "type")]
    pub role: Role,
}

/// A registration request as received, before validation.
#[derive(Clone, Debug, Default)]
pub struct NewAccount {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_role_round_trips_through_str() {
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("Admin".parse::<Role>(), Err(()));
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_view_hides_secrets() {
        let account = Account {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            role: Role::User,
            salt_base64: "c2FsdA==".to_string(),
            hash_base64: "aGFzaA==".to_string(),
        };

        let json = serde_json::to_value(account.view()).unwrap();
        assert_eq!(json, serde_json::json!({ "email": "a@x.com", "type": "user" }));
    }
}
