//! campus-display: admin panel and rotating public display for courses, masters and news.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
