use crate::core::{Result, StoreError, ValidationError};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid");
}

/// Checks the shape of an e-mail address.
pub fn is_plausible_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Signed-up account
#[derive(Debug, Clone)]
pub struct Account {
    user_id: String,
    email: String,
    password_hash: String,
}

impl Account {
    /// Returns the stable user id
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns the login e-mail
    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Password accounts for the in-process store
///
/// E-mails are matched case-insensitively; passwords are kept as bcrypt hashes.
pub struct AccountRegistry {
    accounts: RwLock<HashMap<String, Account>>,
    cost: u32,
}

impl AccountRegistry {
    const MIN_PASSWORD_LEN: usize = 6;

    /// Creates an empty registry hashing with bcrypt's default cost
    pub fn new() -> Self {
        Self::with_cost(bcrypt::DEFAULT_COST)
    }

    /// Creates an empty registry with a custom bcrypt cost
    pub fn with_cost(cost: u32) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            cost,
        }
    }

    fn key(email: &str) -> String {
        email.trim().to_lowercase()
    }

    fn hash_password(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| StoreError::rejected(500, format!("password hashing failed: {}", e)))
    }

    fn verify_password(password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    /// Registers an account and returns its user id
    pub async fn register(&self, email: &str, password: &str) -> Result<String> {
        Self::validate_email(email)?;
        Self::validate_password(password)?;

        let key = Self::key(email);
        let mut accounts = self.accounts.write().await;

        if accounts.contains_key(&key) {
            return Err(StoreError::rejected(
                422,
                format!("User '{}' already registered", key),
            ));
        }

        let account = Account {
            user_id: Uuid::new_v4().to_string(),
            email: key.clone(),
            password_hash: self.hash_password(password)?,
        };
        let user_id = account.user_id.clone();
        accounts.insert(key, account);

        Ok(user_id)
    }

    /// Authenticates an account
    ///
    /// Unknown e-mail and wrong password are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Account> {
        let accounts = self.accounts.read().await;

        let account = accounts
            .get(&Self::key(email))
            .ok_or(StoreError::InvalidCredentials)?;

        if !Self::verify_password(password, &account.password_hash) {
            return Err(StoreError::InvalidCredentials);
        }

        Ok(account.clone())
    }

    /// Number of registered accounts
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn validate_email(email: &str) -> Result<()> {
        if email.trim().is_empty() {
            return Err(ValidationError::Required("email").into());
        }
        if !is_plausible_email(email.trim()) {
            return Err(ValidationError::Invalid {
                field: "email",
                reason: format!("'{}' is not an e-mail address", email),
            }
            .into());
        }
        Ok(())
    }

    fn validate_password(password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(ValidationError::Required("password").into());
        }
        if password.len() < Self::MIN_PASSWORD_LEN {
            return Err(ValidationError::Invalid {
                field: "password",
                reason: format!(
                    "must be at least {} characters long",
                    Self::MIN_PASSWORD_LEN
                ),
            }
            .into());
        }
        Ok(())
    }
}

impl Default for AccountRegistry {
    fn default() -> Self {
        Self::new()
    }
}
