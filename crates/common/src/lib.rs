//! Common utilities and shared types for hifz-tracker.
//!
//! This crate provides foundational components used across all hifz-tracker crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`], [`AuthError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Logging**: `tracing` subscriber installation via [`logging::init`]
//!
//! # Example
//!
//! ```no_run
//! use hifz_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     hifz_common::logging::init(&config.logging)?;
//!     let id = IdGenerator::new().generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod logging;

pub use config::Config;
pub use error::{AppError, AppResult, AuthError, humanize_error_text};
pub use id::IdGenerator;
