//! Repositories over the store collections.
//!
//! Reads map failures to [`AppError::Database`](hifz_common::AppError::Database),
//! writes to [`AppError::WriteFailure`](hifz_common::AppError::WriteFailure).
//! Every write publishes its change after it commits.

mod account;
mod daily_record;
mod identity;
mod join_request;
mod message;
mod student;

pub use account::AccountRepository;
pub use daily_record::DailyRecordRepository;
pub use identity::IdentityRepository;
pub use join_request::JoinRequestRepository;
pub use message::{MessageRepository, involving};
pub use student::StudentRepository;
