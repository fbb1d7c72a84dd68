use crate::{
    hash::{self, HashError, SaltedHash},
    models::{Account, AccountView, NewAccount},
    validate::{self, ValidationError},
};
use failure::Fail;
use log::{error, info, warn};
use ring::rand::SystemRandom;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

#[derive(Debug, Fail, PartialEq)]
#[fail(display = "Conflicting user found in the database")]
pub struct Conflict;

#[derive(Debug, Fail)]
pub enum RegistrationError {
    #[fail(display = "{}", _0)]
    Invalid(#[cause] ValidationError),
    #[fail(display = "{}", _0)]
    Conflict(#[cause] Conflict),
    #[fail(display = "{}", _0)]
    Hashing(#[cause] HashError),
}

impl From<ValidationError> for RegistrationError {
    fn from(e: ValidationError) -> Self {
        RegistrationError::Invalid(e)
    }
}

impl From<Conflict> for RegistrationError {
    fn from(e: Conflict) -> Self {
        RegistrationError::Conflict(e)
    }
}

impl From<HashError> for RegistrationError {
    fn from(e: HashError) -> Self {
        RegistrationError::Hashing(e)
    }
}

#[derive(Debug, Fail, PartialEq)]
pub enum AuthError {
    #[fail(display = "Invalid credentials")]
    InvalidCredentials,
}

/// Storage for accounts. Implementations must make `insert` atomic with
/// respect to both uniqueness constraints.
pub trait AccountRepository: Send + Sync {
    fn find_by_username(&self, username: &str) -> Option<Account>;

    fn find_by_email(&self, email: &str) -> Option<Account>;

    /// Store a new account, failing if its username or email is taken.
    fn insert(&self, account: Account) -> Result<(), Conflict>;
}

/// Accounts keyed by username, kept for the lifetime of the process.
#[derive(Default)]
pub struct InMemoryAccounts {
    accounts: Mutex<HashMap<String, Account>>,
}

impl InMemoryAccounts {
    pub fn new() -> InMemoryAccounts {
        InMemoryAccounts::default()
    }

    // every write is a single HashMap::insert, so a poisoned table is intact
    fn table(&self) -> MutexGuard<HashMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.table().len()
    }
}

impl AccountRepository for InMemoryAccounts {
    fn find_by_username(&self, username: &str) -> Option<Account> {
        self.table().get(username).cloned()
    }

    fn find_by_email(&self, email: &str) -> Option<Account> {
        self.table().values().find(|a| a.email == email).cloned()
    }

    fn insert(&self, account: Account) -> Result<(), Conflict> {
        let mut table = self.table();
        if table.contains_key(&account.username) || table.values().any(|a| a.email == account.email)
        {
            return Err(Conflict);
        }
        table.insert(account.username.clone(), account);
        Ok(())
    }
}

pub struct AccountRegistry {
    repository: Arc<dyn AccountRepository>,
    rng: SystemRandom,
    pepper: Vec<u8>,
}

impl AccountRegistry {
    pub fn new(repository: Arc<dyn AccountRepository>, pepper: Vec<u8>) -> AccountRegistry {
        AccountRegistry {
            repository,
            rng: SystemRandom::new(),
            pepper,
        }
    }

    pub fn find_by_username(&self, username: &str) -> Option<Account> {
        self.repository.find_by_username(username)
    }

    pub fn find_by_email(&self, email: &str) -> Option<Account> {
        self.repository.find_by_email(email)
    }

    fn is_taken(&self, candidate: &NewAccount) -> bool {
        let by_name = candidate
            .username
            .as_ref()
            .map_or(false, |u| self.find_by_username(u).is_some());
        let by_email = candidate
            .email
            .as_ref()
            .map_or(false, |e| self.find_by_email(e).is_some());
        by_name || by_email
    }

    /// Validate and store a new account.
    ///
    /// Conflicts are reported before field errors. The table lock is not held
    /// while hashing, so `insert` repeats the uniqueness check.
    pub fn register(&self, candidate: NewAccount) -> Result<AccountView, RegistrationError> {
        if self.is_taken(&candidate) {
            warn!(
                "registration conflict for {:?}",
                candidate.username.as_ref().map(String::as_str).unwrap_or("")
            );
            return Err(Conflict.into());
        }

        let valid = validate::account(&candidate).map_err(|e| {
            warn!("rejected registration: {}", e);
            e
        })?;

        let salted = SaltedHash::from_password(&self.rng, &self.pepper, &valid.password)
            .map_err(|e| {
                error!("hashing password for {} failed: {}", valid.username, e);
                e
            })?;

        let account = Account {
            username: valid.username,
            email: valid.email,
            role: valid.role,
            salt_base64: salted.salt_base64(),
            hash_base64: salted.hash_base64(),
        };
        let view = account.view();
        let username = account.username.clone();

        self.repository.insert(account).map_err(|e| {
            warn!("registration conflict for {:?}", username);
            e
        })?;
        info!("registered {} account {}", view.role, username);

        Ok(view)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<AccountView, AuthError> {
        let account = match self.find_by_username(username) {
            Some(a) => a,
            None => {
                warn!("login for unknown user {:?}", username);
                return Err(AuthError::InvalidCredentials);
            }
        };

        match hash::verify(
            &account.salt_base64,
            &account.hash_base64,
            &self.pepper,
            password,
        ) {
            Ok(true) => Ok(account.view()),
            Ok(false) => {
                warn!("wrong password for {:?}", username);
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => {
                error!("stored hash for {} is unusable: {}", username, e);
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::{models::Role, secret};
    use rstest::rstest;

    static TEST_PEPPER: &'static [u8] = b"NAqdplo5YPcZ84UbCCvWH9OOTJOXAEzr";

    pub fn new_account(username: &str, email: &str, role: &str, password: &str) -> NewAccount {
        NewAccount {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            role: Some(role.to_string()),
            password: Some(password.to_string()),
        }
    }

    fn registry() -> (Arc<InMemoryAccounts>, AccountRegistry) {
        let accounts = Arc::new(InMemoryAccounts::new());
        let registry = AccountRegistry::new(accounts.clone(), TEST_PEPPER.to_vec());
        (accounts, registry)
    }

    #[test]
    fn test_register_then_login() {
        let (_, registry) = registry();
        let view = registry
            .register(new_account("alice", "a@x.com", "user", "Abc12!"))
            .unwrap();
        assert_eq!(view.email, "a@x.com");
        assert_eq!(view.role, Role::User);

        assert_eq!(registry.login("alice", "Abc12!"), Ok(view));
    }

    #[test]
    fn test_password_is_not_stored() {
        let (_, registry) = registry();
        registry
            .register(new_account("alice", "a@x.com", "admin", "Abc12!"))
            .unwrap();

        let stored = registry.find_by_username("alice").unwrap();
        assert!(!stored.hash_base64.contains("Abc12!"));
        assert!(!stored.salt_base64.is_empty());
        assert_eq!(stored.role, Role::Admin);
    }

    #[test]
    fn test_pepper_is_not_stored() {
        let (_, registry) = registry();
        registry
            .register(new_account("alice", "a@x.com", "user", "Abc12!"))
            .unwrap();

        let stored = registry.find_by_username("alice").unwrap();
        let record = format!("{:?}", stored);
        let pepper_base64 = base64::encode(TEST_PEPPER);
        assert!(!record.contains(&pepper_base64));
        assert!(!record.contains("NAqdplo5YPcZ84UbCCvWH9OOTJOXAEzr"));
        assert_eq!(base64::decode(&stored.salt_base64).unwrap().len(), hash::SALT_LEN);
        assert_eq!(base64::decode(&stored.hash_base64).unwrap().len(), hash::HASH_LEN);
    }

    #[test]
    fn test_login_needs_the_same_pepper() {
        let accounts = Arc::new(InMemoryAccounts::new());
        let registering = AccountRegistry::new(accounts.clone(), TEST_PEPPER.to_vec());
        registering
            .register(new_account("alice", "a@x.com", "user", "Abc12!"))
            .unwrap();

        let repeppered = AccountRegistry::new(accounts.clone(), b"another pepper".to_vec());
        assert_eq!(
            repeppered.login("alice", "Abc12!"),
            Err(AuthError::InvalidCredentials)
        );
        let unpeppered = AccountRegistry::new(accounts, Vec::new());
        assert_eq!(
            unpeppered.login("alice", "Abc12!"),
            Err(AuthError::InvalidCredentials)
        );
        assert!(registering.login("alice", "Abc12!").is_ok());
    }

    #[rstest]
    #[case::no_pepper(None)]
    #[case::short_pepper(Some("pepper".to_string()))]
    #[case::truncated_pepper(Some("p".repeat(40)))]
    fn test_login_round_trip_with_pepper(#[case] configured: Option<String>) {
        let pepper = secret::pepper(configured, None);
        assert!(pepper.len() <= secret::PEPPER_LEN);

        let registry = AccountRegistry::new(Arc::new(InMemoryAccounts::new()), pepper);
        let view = registry
            .register(new_account("alice", "a@x.com", "user", "Abc12!"))
            .unwrap();

        assert_eq!(registry.login("alice", "Abc12!"), Ok(view));
        assert_eq!(
            registry.login("alice", "Abc12?"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn test_duplicate_username_conflicts() {
        let (accounts, registry) = registry();
        registry
            .register(new_account("alice", "a@x.com", "user", "Abc12!"))
            .unwrap();
        let before = registry.find_by_username("alice").unwrap();

        let err = registry
            .register(new_account("alice", "other@x.com", "admin", "Xyz99#"))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Conflict(_)));
        assert_eq!(err.to_string(), "Conflicting user found in the database");

        assert_eq!(registry.find_by_username("alice"), Some(before));
        assert_eq!(accounts.len(), 1);
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let (accounts, registry) = registry();
        registry
            .register(new_account("alice", "a@x.com", "user", "Abc12!"))
            .unwrap();

        let err = registry
            .register(new_account("bob", "a@x.com", "user", "Abc12!"))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Conflict(_)));
        assert!(registry.find_by_username("bob").is_none());
        assert_eq!(accounts.len(), 1);
    }

    #[test]
    fn test_conflict_reported_before_validation() {
        let (_, registry) = registry();
        registry
            .register(new_account("alice", "a@x.com", "user", "Abc12!"))
            .unwrap();

        let err = registry
            .register(new_account("alice", "a@x.com", "user", "weak"))
            .unwrap_err();
        assert!(matches!(err, RegistrationError::Conflict(_)));
    }

    #[test]
    fn test_weak_password_creates_nothing() {
        let (accounts, registry) = registry();
        let err = registry
            .register(new_account("alice", "a@x.com", "user", "abc12!"))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Invalid(ValidationError::WeakPassword(_))
        ));
        assert_eq!(accounts.len(), 0);
        assert!(registry.find_by_email("a@x.com").is_none());
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let (_, registry) = registry();
        registry
            .register(new_account("alice", "a@x.com", "user", "Abc12!"))
            .unwrap();

        let wrong_password = registry.login("alice", "wrong").unwrap_err();
        let unknown_user = registry.login("mallory", "Abc12!").unwrap_err();
        assert_eq!(wrong_password, AuthError::InvalidCredentials);
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[test]
    fn test_login_with_corrupt_hash() {
        let accounts = Arc::new(InMemoryAccounts::new());
        accounts
            .insert(Account {
                username: "alice".to_string(),
                email: "a@x.com".to_string(),
                role: Role::User,
                salt_base64: String::new(),
                hash_base64: "garbage".to_string(),
            })
            .unwrap();
        let registry = AccountRegistry::new(accounts, Vec::new());

        assert_eq!(
            registry.login("alice", "Abc12!"),
            Err(AuthError::InvalidCredentials)
        );
    }

    #[test]
    fn test_insert_checks_both_keys() {
        let accounts = InMemoryAccounts::new();
        let account = Account {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            role: Role::User,
            salt_base64: String::new(),
            hash_base64: String::new(),
        };
        accounts.insert(account.clone()).unwrap();

        let same_email = Account {
            username: "bob".to_string(),
            ..account.clone()
        };
        assert_eq!(accounts.insert(same_email), Err(Conflict));
        assert_eq!(accounts.insert(account), Err(Conflict));
        assert_eq!(accounts.find_by_email("a@x.com").unwrap().username, "alice");
    }
}
