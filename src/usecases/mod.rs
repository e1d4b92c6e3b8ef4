//! Application use cases. Orchestrate domain logic via ports.

pub mod catalog_service;
pub mod display_scheduler;
pub mod session_service;

pub use catalog_service::{CatalogService, CatalogSnapshot, RefreshStats};
pub use display_scheduler::{DisplayHandle, DisplayScheduler, DisplayTimings, DisplayView, Step};
pub use session_service::SessionService;
