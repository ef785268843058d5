//! Document ids.
//!
//! Ids are lowercase ULIDs drawn from one process-wide monotonic generator,
//! so ids minted within the same millisecond still sort in creation order.
//! Ordering ties on equal timestamps are broken by id.

use std::sync::{LazyLock, Mutex, PoisonError};
use ulid::{Generator, Ulid};

static GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

/// Handle to the shared id generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Next id, greater than every id generated before it in this process.
    #[must_use]
    pub fn generate(&self) -> String {
        let next = GENERATOR
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate()
            // Random bits exhausted within one millisecond.
            .unwrap_or_else(|_| Ulid::new());
        next.to_string().to_lowercase()
    }
}
