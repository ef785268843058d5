//! Database entities.

#![allow(missing_docs)]

pub mod account;
pub mod daily_record;
pub mod identity;
pub mod join_request;
pub mod message;
pub mod student;

pub use account::{Entity as Account, Role};
pub use daily_record::Entity as DailyRecord;
pub use identity::Entity as Identity;
pub use join_request::{Entity as JoinRequest, JoinRequestStatus};
pub use message::Entity as Message;
pub use student::Entity as Student;
