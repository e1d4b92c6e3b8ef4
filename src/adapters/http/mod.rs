//! Panel API adapters. Talk to the web panel over HTTP with one shared cookie jar.

pub mod catalog;
pub mod client;
pub mod session;

pub use catalog::{HttpNewsStore, HttpOfferingStore};
pub use client::ApiClient;
pub use session::HttpSessionOracle;
