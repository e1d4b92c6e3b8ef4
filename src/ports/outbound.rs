//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{
    Credentials, DomainError, NewsDraft, NewsItem, Offering, OfferingDraft, OfferingKind,
    PasswordChange, Registration, Route, Session, SessionStatus,
};

/// Authority for "who is signed in and must they change their password".
#[async_trait::async_trait]
pub trait SessionOracle: Send + Sync {
    /// Current session. `Err` means the oracle could not be reached; callers
    /// keep the last known status (or `Pending` if there is none).
    async fn status(&self) -> Result<SessionStatus, DomainError>;

    /// Credentials sign-in. Wrong email or password is `DomainError::Auth`.
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, DomainError>;

    async fn sign_out(&self) -> Result<(), DomainError>;

    /// Create an account. An email already in use is `DomainError::Validation`.
    /// Does not sign the new account in.
    async fn register(&self, registration: &Registration) -> Result<(), DomainError>;

    /// Replace the password of the signed-in user and clear `mustChangePassword`.
    async fn change_password(&self, change: &PasswordChange) -> Result<(), DomainError>;
}

/// Imperative navigation primitive used by the gate's side effects.
///
/// Navigation only records the target; the front-end picks it up on its
/// next evaluation, so this never blocks.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);

    fn current(&self) -> Route;
}

/// Courses and masters. Lists are ordered newest-created first.
#[async_trait::async_trait]
pub trait OfferingStore: Send + Sync {
    async fn list(&self, kind: OfferingKind) -> Result<Vec<Offering>, DomainError>;

    async fn create(
        &self,
        kind: OfferingKind,
        draft: &OfferingDraft,
    ) -> Result<Offering, DomainError>;

    async fn update(
        &self,
        kind: OfferingKind,
        id: &str,
        draft: &OfferingDraft,
    ) -> Result<Offering, DomainError>;

    async fn delete(&self, kind: OfferingKind, id: &str) -> Result<(), DomainError>;
}

/// News items, newest-created first. Returns expired items too; eligibility
/// filtering happens in the catalog use case before the display sees them.
#[async_trait::async_trait]
pub trait NewsStore: Send + Sync {
    async fn list(&self) -> Result<Vec<NewsItem>, DomainError>;

    async fn create(&self, draft: &NewsDraft) -> Result<NewsItem, DomainError>;

    async fn update(&self, id: &str, draft: &NewsDraft) -> Result<NewsItem, DomainError>;

    async fn delete(&self, id: &str) -> Result<(), DomainError>;
}
