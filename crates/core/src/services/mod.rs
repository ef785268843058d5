//! Business logic services.

#![allow(missing_docs)]

pub mod credentials;
pub mod daily_record;
pub mod live_view;
pub mod messaging;
pub mod registration;
pub mod removal;
pub mod session;
pub mod student;

pub use credentials::{CredentialProvider, Credentials, Identity, LocalCredentialProvider};
pub use daily_record::{DailyRecordService, SubmitRecordInput, VerseRange, today_in};
pub use live_view::{
    Conversation, LiveViewService, ParentOverview, RosterEntry, derive_conversations,
    join_roster_with_records,
};
pub use messaging::MessagingService;
pub use registration::{
    ProfileFields, RegistrationOutcome, RegistrationService, ReviewDecision, SignUpInput,
};
pub use removal::RemovalService;
pub use session::SessionService;
pub use student::{CreateStudentInput, StudentService};
