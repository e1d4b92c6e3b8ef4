//! Core domain layer. No external I/O dependencies.
//!
//! Entities, the display cursors and the session gate live here as pure
//! values and transition functions. Dependencies flow inward.

pub mod carousel;
pub mod entities;
pub mod errors;
pub mod news_modal;
pub mod routes;
pub mod session_gate;
pub mod validation;

pub use carousel::Carousel;
pub use entities::{
    AuthStatus, Credentials, NewsDraft, NewsItem, Offering, OfferingDraft, OfferingKind,
    PasswordChange, Registration, Session, SessionStatus,
};
pub use errors::DomainError;
pub use news_modal::NewsModal;
pub use routes::Route;
pub use session_gate::{GateDecision, GateRender, SessionGate};
