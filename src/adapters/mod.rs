//! Infrastructure adapters. Implement outbound ports.
//!
//! Panel API over HTTP, in-memory stores for offline mode, terminal UI.
//! Map errors to DomainError.

pub mod http;
pub mod memory;
pub mod ui;
