//! In-memory session oracle: a fixed set of accounts and one current sign-in.

use crate::domain::{
    Credentials, DomainError, PasswordChange, Registration, Session, SessionStatus,
};
use crate::ports::SessionOracle;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    must_change_password: bool,
}

pub struct MemorySessionOracle {
    accounts: Mutex<HashMap<String, Account>>,
    /// Email of the signed-in account.
    current: Mutex<Option<String>>,
    reachable: AtomicBool,
}

impl MemorySessionOracle {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            current: Mutex::new(None),
            reachable: AtomicBool::new(true),
        }
    }

    /// Seed an account. Emails are matched case-insensitively.
    pub fn with_account(self, email: &str, password: &str, must_change_password: bool) -> Self {
        if let Ok(mut accounts) = self.accounts.lock() {
            accounts.insert(
                email.trim().to_lowercase(),
                Account {
                    password: password.to_string(),
                    must_change_password,
                },
            );
        }
        self
    }

    /// Simulate the oracle going away: `status` fails until reachable again.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn lock_err<T>(_: T) -> DomainError {
        DomainError::Session("session state poisoned".into())
    }
}

impl Default for MemorySessionOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionOracle for MemorySessionOracle {
    async fn status(&self) -> Result<SessionStatus, DomainError> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(DomainError::Session("session oracle unreachable".into()));
        }
        let current = self.current.lock().map_err(Self::lock_err)?.clone();
        let Some(email) = current else {
            return Ok(SessionStatus::Unauthenticated);
        };
        let accounts = self.accounts.lock().map_err(Self::lock_err)?;
        Ok(match accounts.get(&email) {
            Some(account) => SessionStatus::Authenticated(Session {
                subject_id: email,
                must_change_password: account.must_change_password,
            }),
            None => SessionStatus::Unauthenticated,
        })
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, DomainError> {
        let email = credentials.email.trim().to_lowercase();
        let account = self
            .accounts
            .lock()
            .map_err(Self::lock_err)?
            .get(&email)
            .cloned()
            .filter(|a| a.password == credentials.password)
            .ok_or_else(|| DomainError::Auth("invalid email or password".into()))?;
        *self.current.lock().map_err(Self::lock_err)? = Some(email.clone());
        info!(email = %email, "[MEMORY] signed in");
        Ok(Session {
            subject_id: email,
            must_change_password: account.must_change_password,
        })
    }

    async fn sign_out(&self) -> Result<(), DomainError> {
        self.current.lock().map_err(Self::lock_err)?.take();
        Ok(())
    }

    async fn register(&self, registration: &Registration) -> Result<(), DomainError> {
        let email = registration.email.trim().to_lowercase();
        let mut accounts = self.accounts.lock().map_err(Self::lock_err)?;
        if accounts.contains_key(&email) {
            return Err(DomainError::Validation("email already in use".into()));
        }
        accounts.insert(
            email.clone(),
            Account {
                password: registration.password.clone(),
                must_change_password: false,
            },
        );
        info!(email = %email, "[MEMORY] account registered");
        Ok(())
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<(), DomainError> {
        let email = self
            .current
            .lock()
            .map_err(Self::lock_err)?
            .clone()
            .ok_or_else(|| DomainError::Auth("not signed in".into()))?;
        let mut accounts = self.accounts.lock().map_err(Self::lock_err)?;
        let account = accounts
            .get_mut(&email)
            .ok_or_else(|| DomainError::Store("user not found".into()))?;
        if account.password != change.current_password {
            return Err(DomainError::Auth("current password is incorrect".into()));
        }
        account.password = change.new_password.clone();
        account.must_change_password = false;
        Ok(())
    }
}
