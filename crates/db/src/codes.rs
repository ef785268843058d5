//! Integer codes for persisted categories.
//!
//! Attendance, performance and listener values are stored as small integers.
//! The mapping below is version [`CODE_TABLE_VERSION`]; codes are append-only,
//! never renumbered. Decoding an unknown code yields the category default
//! instead of failing, so documents written by a newer client still load.

use serde::{Deserialize, Serialize};

/// Version of the code mapping tables in this module.
pub const CODE_TABLE_VERSION: u32 = 1;

/// A category persisted as an integer code.
pub trait CodedCategory: Sized + Copy {
    /// Value used when a stored code is out of range.
    const DEFAULT: Self;

    /// Integer written to the store.
    fn code(self) -> i32;

    /// Strict lookup.
    fn from_code(code: i32) -> Option<Self>;

    /// Lenient lookup, falling back to [`Self::DEFAULT`].
    fn decode(code: i32) -> Self {
        Self::from_code(code).unwrap_or_else(|| {
            tracing::debug!(code, "Unknown category code, using default");
            Self::DEFAULT
        })
    }
}

/// Attendance status of a daily record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attendance {
    Present,
    AbsentExcused,
    AbsentUnexcused,
}

impl Attendance {
    /// Whether the student attended.
    #[must_use]
    pub const fn is_present(self) -> bool {
        matches!(self, Self::Present)
    }
}

impl CodedCategory for Attendance {
    const DEFAULT: Self = Self::Present;

    fn code(self) -> i32 {
        match self {
            Self::Present => 0,
            Self::AbsentExcused => 1,
            Self::AbsentUnexcused => 2,
        }
    }

    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Present),
            1 => Some(Self::AbsentExcused),
            2 => Some(Self::AbsentUnexcused),
            _ => None,
        }
    }
}

/// Five-level recitation rating, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    Excellent,
    VeryGood,
    Good,
    Acceptable,
    Weak,
}

impl CodedCategory for Performance {
    const DEFAULT: Self = Self::Good;

    fn code(self) -> i32 {
        match self {
            Self::Excellent => 0,
            Self::VeryGood => 1,
            Self::Good => 2,
            Self::Acceptable => 3,
            Self::Weak => 4,
        }
    }

    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Excellent),
            1 => Some(Self::VeryGood),
            2 => Some(Self::Good),
            3 => Some(Self::Acceptable),
            4 => Some(Self::Weak),
            _ => None,
        }
    }
}

/// Who listened to the recitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Listener {
    Sheikh,
    Parent,
    Peer,
}

impl CodedCategory for Listener {
    const DEFAULT: Self = Self::Sheikh;

    fn code(self) -> i32 {
        match self {
            Self::Sheikh => 0,
            Self::Parent => 1,
            Self::Peer => 2,
        }
    }

    fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Sheikh),
            1 => Some(Self::Parent),
            2 => Some(Self::Peer),
            _ => None,
        }
    }
}
