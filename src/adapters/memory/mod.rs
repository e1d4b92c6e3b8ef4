//! In-memory adapters. Offline demo mode and tests; nothing is persisted.

pub mod catalog;
pub mod session;

pub use catalog::{MemoryNewsStore, MemoryOfferingStore};
pub use session::MemorySessionOracle;
