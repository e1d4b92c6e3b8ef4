//! Cross-cutting helpers: configuration and scoped timers.

pub mod config;
pub mod timer;
