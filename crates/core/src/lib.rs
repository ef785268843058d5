//! Core business logic for hifz-tracker.

pub mod context;
pub mod services;
pub mod streams;

pub use context::AppContext;
pub use services::*;
