//! Registration, approval, session and cascade workflows against an
//! in-memory store.

#![allow(clippy::unwrap_used)]

use chrono::Utc;
use hifz_common::{AppError, AuthError, Config};
use hifz_core::{
    AppContext, CreateStudentInput, Credentials, LocalCredentialProvider, RegistrationOutcome,
    ReviewDecision, SignUpInput, SubmitRecordInput,
};
use hifz_db::codes::Attendance;
use hifz_db::entities::{JoinRequestStatus, Role, account};
use hifz_db::repositories::{
    AccountRepository, DailyRecordRepository, IdentityRepository, JoinRequestRepository,
    MessageRepository, StudentRepository,
};
use hifz_db::test_utils::TestStore;
use sea_orm::Set;
use std::sync::Arc;

async fn context() -> AppContext {
    let store = TestStore::open().await.unwrap();
    let config = Config::from_toml_str("[database]\nurl = \"sqlite::memory:\"\n").unwrap();
    let credentials: Credentials = Arc::new(LocalCredentialProvider::new(
        IdentityRepository::new(store.clone()),
        config.workflow.min_password_length,
    ));
    AppContext::from_parts(store, credentials, &config).unwrap()
}

fn sign_up_input(email: &str, role: Role) -> SignUpInput {
    SignUpInput {
        email: email.to_string(),
        password: "bismillah".to_string(),
        role,
        name: email.split('@').next().unwrap().to_string(),
        phone: Some("0500000000".to_string()),
        age: (role == Role::Student).then_some(9),
    }
}

async fn sign_up(ctx: &AppContext, email: &str, role: Role) -> RegistrationOutcome {
    ctx.registration
        .sign_up(sign_up_input(email, role))
        .await
        .unwrap()
}

/// Bootstrap an admin teacher and return its account id.
async fn admin(ctx: &AppContext) -> String {
    let outcome = sign_up(ctx, "sheikh@example.com", Role::Teacher).await;
    assert!(outcome.is_admin());
    outcome.account.id
}

#[tokio::test]
async fn test_first_teacher_is_bootstrap_admin_only_once() {
    let ctx = context().await;

    let first = sign_up(&ctx, "t1@example.com", Role::Teacher).await;
    assert!(first.is_approved());
    assert!(first.is_admin());
    assert!(first.join_request.is_none());

    for email in ["t2@example.com", "t3@example.com"] {
        let later = sign_up(&ctx, email, Role::Teacher).await;
        assert!(!later.is_approved());
        assert!(!later.is_admin());
        let request = later.join_request.unwrap();
        assert_eq!(request.status, JoinRequestStatus::Pending);
        assert_eq!(request.role, Role::Teacher);
    }

    let pending = ctx.registration.list_pending_requests().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|r| r.account_id != first.account.id));
}

#[tokio::test]
async fn test_parent_registration_files_join_request() {
    let ctx = context().await;
    admin(&ctx).await;

    let outcome = sign_up(&ctx, "amina@example.com", Role::Parent).await;

    assert!(!outcome.is_approved());
    let request = outcome.join_request.unwrap();
    assert_eq!(request.account_id, outcome.account.id);
    assert_eq!(request.email, "amina@example.com");
    assert_eq!(request.phone.as_deref(), Some("0500000000"));
    assert_eq!(request.age, None);
}

#[tokio::test]
async fn test_recovery_is_idempotent() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let first = sign_up(&ctx, "amina@example.com", Role::Parent).await;

    let again = sign_up(&ctx, "amina@example.com", Role::Parent).await;
    assert!(again.recovered);
    assert_eq!(again.account.id, first.account.id);
    assert!(!again.is_approved());
    assert!(!again.account.is_rejected);
    assert!(again.join_request.is_none());

    let accounts = AccountRepository::new(ctx.store.clone());
    assert_eq!(accounts.find_by_role(Role::Parent).await.unwrap().len(), 1);
    let requests = JoinRequestRepository::new(ctx.store.clone());
    assert_eq!(
        requests.find_by_account(&first.account.id).await.unwrap().len(),
        1
    );

    let admin_again = sign_up(&ctx, "sheikh@example.com", Role::Teacher).await;
    assert!(admin_again.recovered);
    assert_eq!(admin_again.account.id, admin_id);
    assert!(admin_again.is_admin());
    assert!(admin_again.is_approved());
}

#[tokio::test]
async fn test_recovery_with_wrong_password_reports_email_in_use() {
    let ctx = context().await;
    sign_up(&ctx, "amina@example.com", Role::Parent).await;

    let mut input = sign_up_input("amina@example.com", Role::Parent);
    input.password = "different".to_string();

    assert!(matches!(
        ctx.registration.sign_up(input).await,
        Err(AppError::Auth(AuthError::EmailAlreadyInUse))
    ));
}

#[tokio::test]
async fn test_recovery_creates_missing_account() {
    let ctx = context().await;
    admin(&ctx).await;
    let identity = ctx
        .credentials
        .sign_up("omar@example.com", "bismillah")
        .await
        .unwrap();

    let outcome = sign_up(&ctx, "omar@example.com", Role::Student).await;

    assert!(outcome.recovered);
    assert_eq!(outcome.account.id, identity.id);
    assert_eq!(outcome.join_request.unwrap().age, Some(9));
}

#[tokio::test]
async fn test_student_sign_up_requires_age() {
    let ctx = context().await;
    let mut input = sign_up_input("omar@example.com", Role::Student);
    input.age = None;

    assert!(matches!(
        ctx.registration.sign_up(input).await,
        Err(AppError::Validation(_))
    ));
    assert!(ctx.credentials.current_identity().is_none());
}

#[tokio::test]
async fn test_account_write_failure_signs_out() {
    let ctx = context().await;
    TestStore::reject_writes(&ctx.store, "account", "INSERT")
        .await
        .unwrap();

    let result = ctx
        .registration
        .sign_up(sign_up_input("amina@example.com", Role::Parent))
        .await;

    assert!(matches!(result, Err(AppError::WriteFailure(_))));
    assert!(ctx.credentials.current_identity().is_none());
}

#[tokio::test]
async fn test_join_request_failure_is_not_fatal() {
    let ctx = context().await;
    admin(&ctx).await;
    TestStore::reject_writes(&ctx.store, "join_request", "INSERT")
        .await
        .unwrap();

    let outcome = sign_up(&ctx, "amina@example.com", Role::Parent).await;

    assert!(outcome.join_request.is_none());
    assert!(!outcome.is_approved());
    assert!(
        AccountRepository::new(ctx.store.clone())
            .find_by_id(&outcome.account.id)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_accepting_student_creates_one_student() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let applicant = sign_up(&ctx, "omar@example.com", Role::Student).await;
    let request = applicant.join_request.unwrap();

    let reviewed = ctx
        .registration
        .review_join_request(&admin_id, &request.id, ReviewDecision::Accept)
        .await
        .unwrap();
    assert_eq!(reviewed.status, JoinRequestStatus::Accepted);
    assert_eq!(reviewed.reviewed_by.as_deref(), Some(admin_id.as_str()));

    let second = ctx
        .registration
        .review_join_request(&admin_id, &request.id, ReviewDecision::Accept)
        .await;
    assert!(matches!(second, Err(AppError::Conflict(_))));

    let students = StudentRepository::new(ctx.store.clone()).find_all().await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].teacher_id.as_deref(), Some(admin_id.as_str()));
    assert_eq!(students[0].name, "omar");
    assert_eq!(students[0].age, 9);
    assert_eq!(
        students[0].account_id.as_deref(),
        Some(applicant.account.id.as_str())
    );

    let account = AccountRepository::new(ctx.store.clone())
        .get_by_id(&applicant.account.id)
        .await
        .unwrap();
    assert!(account.is_approved);
    assert!(!account.is_rejected);
    assert!(ctx.registration.list_pending_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejecting_never_creates_student() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let applicant = sign_up(&ctx, "omar@example.com", Role::Student).await;

    ctx.registration
        .review_join_request(
            &admin_id,
            &applicant.join_request.unwrap().id,
            ReviewDecision::Reject,
        )
        .await
        .unwrap();

    assert!(
        StudentRepository::new(ctx.store.clone())
            .find_all()
            .await
            .unwrap()
            .is_empty()
    );
    let account = AccountRepository::new(ctx.store.clone())
        .get_by_id(&applicant.account.id)
        .await
        .unwrap();
    assert!(account.is_rejected);
    assert!(!account.is_approved);
}

#[tokio::test]
async fn test_reviewer_authorization() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let teacher = sign_up(&ctx, "yusuf@example.com", Role::Teacher).await;
    let parent = sign_up(&ctx, "amina@example.com", Role::Parent).await;
    let second_teacher = sign_up(&ctx, "khadija@example.com", Role::Teacher).await;
    let parent_request = parent.join_request.unwrap().id;

    // Pending teachers cannot review.
    assert!(matches!(
        ctx.registration
            .review_join_request(&teacher.account.id, &parent_request, ReviewDecision::Accept)
            .await,
        Err(AppError::Forbidden(_))
    ));

    ctx.registration
        .review_join_request(
            &admin_id,
            &teacher.join_request.unwrap().id,
            ReviewDecision::Accept,
        )
        .await
        .unwrap();

    // Approved, but not an admin.
    assert!(matches!(
        ctx.registration
            .review_join_request(
                &teacher.account.id,
                &second_teacher.join_request.unwrap().id,
                ReviewDecision::Accept,
            )
            .await,
        Err(AppError::Forbidden(_))
    ));

    ctx.registration
        .review_join_request(&teacher.account.id, &parent_request, ReviewDecision::Accept)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_portal_sign_in_outcomes() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let parent = sign_up(&ctx, "amina@example.com", Role::Parent).await;

    let account = ctx
        .session
        .sign_in_to_portal("sheikh@example.com", "bismillah", Role::Teacher)
        .await
        .unwrap();
    assert_eq!(account.id, admin_id);
    assert_eq!(
        ctx.session.current_account().await.unwrap().map(|a| a.id),
        Some(admin_id.clone())
    );

    let mismatch = ctx
        .session
        .sign_in_to_portal("sheikh@example.com", "bismillah", Role::Parent)
        .await;
    assert!(matches!(mismatch, Err(AppError::RoleMismatch { .. })));
    assert!(ctx.credentials.current_identity().is_none());

    let pending = ctx
        .session
        .sign_in_to_portal("amina@example.com", "bismillah", Role::Parent)
        .await;
    assert!(matches!(pending, Err(AppError::AccountPending)));
    assert!(ctx.credentials.current_identity().is_none());

    ctx.registration
        .review_join_request(
            &admin_id,
            &parent.join_request.unwrap().id,
            ReviewDecision::Accept,
        )
        .await
        .unwrap();
    ctx.session
        .sign_in_to_portal("amina@example.com", "bismillah", Role::Parent)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rejected_account_is_purged_on_sign_in() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let parent = sign_up(&ctx, "amina@example.com", Role::Parent).await;
    ctx.registration
        .review_join_request(
            &admin_id,
            &parent.join_request.unwrap().id,
            ReviewDecision::Reject,
        )
        .await
        .unwrap();

    let result = ctx
        .session
        .sign_in_to_portal("amina@example.com", "bismillah", Role::Parent)
        .await;

    assert!(matches!(result, Err(AppError::AccountRejected)));
    assert!(ctx.credentials.current_identity().is_none());
    assert!(
        AccountRepository::new(ctx.store.clone())
            .find_by_id(&parent.account.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        JoinRequestRepository::new(ctx.store.clone())
            .find_by_account(&parent.account.id)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(matches!(
        ctx.credentials.sign_in("amina@example.com", "bismillah").await,
        Err(AuthError::UserNotFound)
    ));

    // The email is free again.
    let fresh = sign_up(&ctx, "amina@example.com", Role::Parent).await;
    assert!(!fresh.recovered);
}

#[tokio::test]
async fn test_missing_profile_signs_out() {
    let ctx = context().await;
    ctx.credentials
        .sign_up("ghost@example.com", "bismillah")
        .await
        .unwrap();

    let result = ctx
        .session
        .sign_in_to_portal("ghost@example.com", "bismillah", Role::Parent)
        .await;

    assert!(matches!(result, Err(AppError::ProfileMissing(_))));
    assert!(ctx.credentials.current_identity().is_none());
}

async fn approved_parent(ctx: &AppContext, admin_id: &str, email: &str) -> String {
    let parent = sign_up(ctx, email, Role::Parent).await;
    ctx.registration
        .review_join_request(
            admin_id,
            &parent.join_request.unwrap().id,
            ReviewDecision::Accept,
        )
        .await
        .unwrap();
    parent.account.id
}

fn new_student(name: &str, parent_id: Option<&str>) -> CreateStudentInput {
    CreateStudentInput {
        name: name.to_string(),
        age: 10,
        parent_id: parent_id.map(String::from),
        juz_number: 30,
        surah_name: "An-Naba".to_string(),
        verse_number: 1,
        notes: None,
    }
}

#[tokio::test]
async fn test_removing_parent_unlinks_children() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let parent_id = approved_parent(&ctx, &admin_id, "amina@example.com").await;
    let student = ctx
        .students
        .create_student(&admin_id, new_student("Omar", Some(&parent_id)))
        .await
        .unwrap();
    ctx.messaging
        .send_message(&parent_id, &admin_id, "Salam", Some(&student.id))
        .await
        .unwrap();
    ctx.messaging
        .send_message(&admin_id, &parent_id, "Wa alaikum salam", None)
        .await
        .unwrap();

    ctx.removal
        .remove_account_and_dependents(&parent_id, Role::Parent)
        .await
        .unwrap();

    let student = ctx.students.get(&student.id).await.unwrap();
    assert_eq!(student.parent_id, None);
    assert_eq!(student.teacher_id.as_deref(), Some(admin_id.as_str()));
    assert!(
        MessageRepository::new(ctx.store.clone())
            .find_involving(&admin_id)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        AccountRepository::new(ctx.store.clone())
            .find_by_id(&parent_id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_removing_teacher_unlinks_roster() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let student = ctx
        .students
        .create_student(&admin_id, new_student("Omar", None))
        .await
        .unwrap();

    ctx.removal
        .remove_account_and_dependents(&admin_id, Role::Teacher)
        .await
        .unwrap();

    let student = ctx.students.get(&student.id).await.unwrap();
    assert_eq!(student.teacher_id, None);
}

#[tokio::test]
async fn test_remove_student_deletes_records() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let student = ctx
        .students
        .create_student(&admin_id, new_student("Omar", None))
        .await
        .unwrap();
    let today = ctx.records.today();
    for date in [today, today.pred_opt().unwrap()] {
        let mut input = SubmitRecordInput::present(&student.id);
        input.record_date = Some(date);
        ctx.records.submit_record(&admin_id, input).await.unwrap();
    }

    ctx.removal.remove_student(&student.id).await.unwrap();

    assert!(
        ctx.records
            .records_for_student(&student.id)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(matches!(
        ctx.students.get(&student.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        ctx.removal.remove_student(&student.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_failed_student_removal_keeps_records() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let student = ctx
        .students
        .create_student(&admin_id, new_student("Omar", None))
        .await
        .unwrap();
    for date in [ctx.records.today(), ctx.records.today().pred_opt().unwrap()] {
        let mut input = SubmitRecordInput::absent(&student.id, Attendance::AbsentExcused);
        input.record_date = Some(date);
        ctx.records.submit_record(&admin_id, input).await.unwrap();
    }
    TestStore::reject_writes(&ctx.store, "student", "DELETE")
        .await
        .unwrap();

    let result = ctx.removal.remove_student(&student.id).await;

    assert!(matches!(result, Err(AppError::WriteFailure(_))));
    assert!(ctx.students.get(&student.id).await.is_ok());
    assert_eq!(
        DailyRecordRepository::new(ctx.store.clone())
            .find_by_student(&student.id)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_bad_timezone_fails_wiring() {
    let store = TestStore::open().await.unwrap();
    let config = Config::from_toml_str(
        "[database]\nurl = \"sqlite::memory:\"\n[workflow]\ntimezone = \"Mars/Olympus\"\n",
    )
    .unwrap();
    let credentials: Credentials = Arc::new(LocalCredentialProvider::new(
        IdentityRepository::new(store.clone()),
        6,
    ));

    assert!(matches!(
        AppContext::from_parts(store, credentials, &config),
        Err(AppError::Config(_))
    ));
}

#[tokio::test]
async fn test_one_record_per_student_per_day() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let student = ctx
        .students
        .create_student(&admin_id, new_student("Omar", None))
        .await
        .unwrap();
    assert!(ctx.records.today_record(&student.id).await.unwrap().is_none());

    let saved = ctx
        .records
        .submit_record(&admin_id, SubmitRecordInput::present(&student.id))
        .await
        .unwrap();
    assert_eq!(saved.record_date, ctx.records.today());
    assert_eq!(saved.created_by.as_deref(), Some(admin_id.as_str()));

    let duplicate = ctx
        .records
        .submit_record(
            &admin_id,
            SubmitRecordInput::absent(&student.id, Attendance::AbsentUnexcused),
        )
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    assert_eq!(
        ctx.records.today_record(&student.id).await.unwrap().map(|r| r.id),
        Some(saved.id)
    );
}

#[tokio::test]
async fn test_messaging_rules() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let parent_id = approved_parent(&ctx, &admin_id, "amina@example.com").await;

    assert!(matches!(
        ctx.messaging.send_message(&admin_id, &parent_id, "   ", None).await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        ctx.messaging.send_message(&admin_id, &admin_id, "Salam", None).await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        ctx.messaging.send_message(&admin_id, "nobody", "Salam", None).await,
        Err(AppError::NotFound(_))
    ));

    let sent = ctx
        .messaging
        .send_message(&parent_id, &admin_id, "  Salam  ", None)
        .await
        .unwrap();
    assert_eq!(sent.content, "Salam");
    ctx.messaging
        .send_message(&parent_id, &admin_id, "How is Omar?", None)
        .await
        .unwrap();
    assert_eq!(ctx.messaging.unread_count(&admin_id).await.unwrap(), 2);
    assert_eq!(ctx.messaging.unread_count(&parent_id).await.unwrap(), 0);

    assert_eq!(
        ctx.messaging
            .mark_conversation_read(&admin_id, &parent_id)
            .await
            .unwrap(),
        2
    );
    assert_eq!(ctx.messaging.unread_count(&admin_id).await.unwrap(), 0);
    assert_eq!(
        ctx.messaging
            .conversation(&admin_id, &parent_id)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_student_progress_and_parent_links() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let parent_id = approved_parent(&ctx, &admin_id, "amina@example.com").await;
    let student = ctx
        .students
        .create_student(&admin_id, new_student("Omar", None))
        .await
        .unwrap();

    assert!(matches!(
        ctx.students.update_progress(&student.id, 31, "Al-Baqarah", 1).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        ctx.students.update_progress(&student.id, 29, "Al-Mulk", 0).await,
        Err(AppError::Validation(_))
    ));
    let moved = ctx
        .students
        .update_progress(&student.id, 29, " Al-Mulk ", 12)
        .await
        .unwrap();
    assert_eq!(
        (moved.juz_number, moved.surah_name.as_str(), moved.verse_number),
        (29, "Al-Mulk", 12)
    );

    let noted = ctx.students.update_notes(&student.id, Some("  ")).await.unwrap();
    assert_eq!(noted.notes, None);

    // Only parent accounts can be linked.
    assert!(matches!(
        ctx.students.assign_parent(&student.id, &admin_id).await,
        Err(AppError::BadRequest(_))
    ));
    ctx.students.assign_parent(&student.id, &parent_id).await.unwrap();
    let children = ctx.students.list_for_parent(&parent_id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, student.id);
}

#[tokio::test]
async fn test_records_between_checks_range() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let student = ctx
        .students
        .create_student(&admin_id, new_student("Omar", None))
        .await
        .unwrap();
    let today = ctx.records.today();
    let yesterday = today.pred_opt().unwrap();
    for date in [today, yesterday] {
        let mut input = SubmitRecordInput::present(&student.id);
        input.record_date = Some(date);
        ctx.records.submit_record(&admin_id, input).await.unwrap();
    }

    assert!(matches!(
        ctx.records.records_between(today, yesterday, None).await,
        Err(AppError::BadRequest(_))
    ));
    let both = ctx
        .records
        .records_between(yesterday, today, Some(&student.id))
        .await
        .unwrap();
    assert_eq!(both.len(), 2);
    let history = ctx.records.records_for_student(&student.id).await.unwrap();
    assert_eq!(history[0].record_date, today);
}

#[tokio::test]
async fn test_auth_state_follows_session() {
    use futures::StreamExt;

    let ctx = context().await;
    let mut auth = ctx.session.watch_auth_state();
    assert_eq!(auth.next().await.unwrap(), None);

    let admin_id = admin(&ctx).await;
    assert_eq!(auth.next().await.unwrap().map(|i| i.id), Some(admin_id));

    ctx.session.sign_out().await.unwrap();
    assert_eq!(auth.next().await.unwrap(), None);
    assert!(ctx.session.current_account().await.unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_first_teachers_yield_one_admin() {
    let ctx = context().await;

    let (first, second) = tokio::join!(
        ctx.registration
            .sign_up(sign_up_input("t1@example.com", Role::Teacher)),
        ctx.registration
            .sign_up(sign_up_input("t2@example.com", Role::Teacher)),
    );
    let outcomes = [first.unwrap(), second.unwrap()];

    assert_eq!(outcomes.iter().filter(|o| o.is_admin()).count(), 1);
    let other = outcomes.iter().find(|o| !o.is_admin()).unwrap();
    assert!(!other.is_approved());
    assert!(other.join_request.is_some());

    let teachers = AccountRepository::new(ctx.store.clone())
        .find_by_role(Role::Teacher)
        .await
        .unwrap();
    assert_eq!(teachers.len(), 2);
    assert_eq!(teachers.iter().filter(|t| t.is_admin).count(), 1);
}

#[tokio::test]
async fn test_taken_admin_slot_files_join_request() {
    let ctx = context().await;
    // An admin row the teacher check does not see, as if another bootstrap
    // committed between the check and the insert.
    AccountRepository::new(ctx.store.clone())
        .create(account::ActiveModel {
            id: Set("early-admin".to_string()),
            role: Set(Role::Parent),
            name: Set("Early".to_string()),
            email: Set("early@example.com".to_string()),
            phone: Set(None),
            is_approved: Set(true),
            is_rejected: Set(false),
            is_admin: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        })
        .await
        .unwrap();

    let outcome = sign_up(&ctx, "t1@example.com", Role::Teacher).await;

    assert!(!outcome.is_admin());
    assert!(!outcome.is_approved());
    let request = outcome.join_request.unwrap();
    assert_eq!(request.role, Role::Teacher);
    assert!(ctx.credentials.current_identity().is_some());
}

#[tokio::test]
async fn test_concurrent_submissions_keep_one_record() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let student = ctx
        .students
        .create_student(&admin_id, new_student("Omar", None))
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        ctx.records
            .submit_record(&admin_id, SubmitRecordInput::present(&student.id)),
        ctx.records
            .submit_record(&admin_id, SubmitRecordInput::present(&student.id)),
    );

    assert_eq!(usize::from(a.is_ok()) + usize::from(b.is_ok()), 1);
    assert!(
        [a, b]
            .into_iter()
            .any(|r| matches!(r, Err(AppError::Conflict(_))))
    );
    assert_eq!(
        ctx.records
            .records_for_student(&student.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_failed_account_removal_changes_nothing() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let parent_id = approved_parent(&ctx, &admin_id, "amina@example.com").await;
    let student = ctx
        .students
        .create_student(&admin_id, new_student("Omar", Some(&parent_id)))
        .await
        .unwrap();
    ctx.messaging
        .send_message(&parent_id, &admin_id, "Salam", None)
        .await
        .unwrap();
    TestStore::reject_writes(&ctx.store, "account", "DELETE")
        .await
        .unwrap();

    let result = ctx
        .removal
        .remove_account_and_dependents(&parent_id, Role::Parent)
        .await;

    assert!(matches!(result, Err(AppError::WriteFailure(_))));
    let student = ctx.students.get(&student.id).await.unwrap();
    assert_eq!(student.parent_id.as_deref(), Some(parent_id.as_str()));
    assert_eq!(
        MessageRepository::new(ctx.store.clone())
            .find_involving(&parent_id)
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(
        AccountRepository::new(ctx.store.clone())
            .find_by_id(&parent_id)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn test_failed_review_leaves_request_pending() {
    let ctx = context().await;
    let admin_id = admin(&ctx).await;
    let applicant = sign_up(&ctx, "omar@example.com", Role::Student).await;
    let request = applicant.join_request.unwrap();
    TestStore::reject_writes(&ctx.store, "student", "INSERT")
        .await
        .unwrap();

    let result = ctx
        .registration
        .review_join_request(&admin_id, &request.id, ReviewDecision::Accept)
        .await;

    assert!(matches!(result, Err(AppError::WriteFailure(_))));
    let account = AccountRepository::new(ctx.store.clone())
        .get_by_id(&applicant.account.id)
        .await
        .unwrap();
    assert!(!account.is_approved);
    assert!(!account.is_rejected);
    let pending = ctx.registration.list_pending_requests().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, request.id);
    assert_eq!(pending[0].reviewed_by, None);
}

#[tokio::test]
async fn test_blank_names_are_rejected() {
    let ctx = context().await;
    let mut input = sign_up_input("amina@example.com", Role::Parent);
    input.name = "   ".to_string();

    assert!(matches!(
        ctx.registration.sign_up(input).await,
        Err(AppError::Validation(_))
    ));
    assert!(ctx.credentials.current_identity().is_none());

    let admin_id = admin(&ctx).await;
    assert!(matches!(
        ctx.students
            .create_student(&admin_id, new_student("  ", None))
            .await,
        Err(AppError::Validation(_))
    ));
    assert!(ctx.students.list_for_teacher(&admin_id).await.unwrap().is_empty());
}
