//! Inbound port. UI (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: the interactive front-end drives use cases from here.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Run the route loop (login, admin panel, public display) until the user exits.
    async fn run(&self) -> Result<(), DomainError>;
}
