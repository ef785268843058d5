//! Registration and approval workflow.
//!
//! A new identity becomes a usable account in one of two ways: the very first
//! teacher is approved as admin on the spot, everyone else files a join
//! request that an approved teacher reviews.

use crate::services::credentials::{Credentials, Identity};
use crate::services::student::{STARTING_JUZ, STARTING_SURAH, STARTING_VERSE, not_blank};
use chrono::Utc;
use hifz_common::{AppError, AppResult, AuthError, IdGenerator};
use hifz_db::{
    Change, Collection, LiveStream, Store,
    entities::{
        Role,
        account::{self, Entity as Account},
        join_request::{self, Entity as JoinRequest, JoinRequestStatus},
        student,
    },
    repositories::{AccountRepository, JoinRequestRepository},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, sea_query::Expr};
use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

/// Input for signing up.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub role: Role,
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[validate(length(min = 1, max = 32))]
    pub phone: Option<String>,
    /// Required for students.
    #[validate(range(min = 3, max = 100))]
    pub age: Option<i32>,
}

/// Contact details copied onto the account and its join request.
#[derive(Debug, Clone)]
pub struct ProfileFields {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub age: Option<i32>,
}

/// Result of a registration.
#[derive(Debug, Clone)]
pub struct RegistrationOutcome {
    pub account: account::Model,
    /// `None` for the bootstrap teacher, a recovered account, or when the
    /// request could not be written.
    pub join_request: Option<join_request::Model>,
    /// The account already existed and was returned unchanged.
    pub recovered: bool,
}

impl RegistrationOutcome {
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        self.account.is_approved
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.account.is_admin
    }
}

/// Reviewer verdict on a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Accept,
    Reject,
}

/// Registration service.
#[derive(Clone)]
pub struct RegistrationService {
    store: Store,
    credentials: Credentials,
    account_repo: AccountRepository,
    join_request_repo: JoinRequestRepository,
    id_gen: IdGenerator,
    profile_lookup_timeout: Duration,
}

impl RegistrationService {
    /// Create a new registration service.
    #[must_use]
    pub fn new(store: Store, credentials: Credentials, profile_lookup_timeout: Duration) -> Self {
        Self {
            account_repo: AccountRepository::new(store.clone()),
            join_request_repo: JoinRequestRepository::new(store.clone()),
            store,
            credentials,
            id_gen: IdGenerator::new(),
            profile_lookup_timeout,
        }
    }

    /// Create an identity and register its account.
    ///
    /// An email that is already registered is recovered by signing in with
    /// the same password: an existing account is returned as-is, a missing
    /// one is created under the recovered identity.
    pub async fn sign_up(&self, input: SignUpInput) -> AppResult<RegistrationOutcome> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        if input.role == Role::Student && input.age.is_none() {
            return Err(AppError::Validation(
                "age: required for student registration".to_string(),
            ));
        }

        let (identity, recovered) = match self
            .credentials
            .sign_up(&input.email, &input.password)
            .await
        {
            Ok(identity) => (identity, false),
            Err(AuthError::EmailAlreadyInUse) => {
                tracing::info!(email = %input.email, "Email already registered, attempting recovery");
                match self.credentials.sign_in(&input.email, &input.password).await {
                    Ok(identity) => (identity, true),
                    Err(e) => {
                        tracing::debug!(error = %e, "Recovery sign-in failed");
                        return Err(AuthError::EmailAlreadyInUse.into());
                    }
                }
            }
            Err(e) => return Err(e.into()),
        };

        let profile = ProfileFields {
            name: input.name.trim().to_string(),
            email: identity.email.clone(),
            phone: input.phone,
            age: input.age,
        };

        self.register_account(&identity, input.role, profile, recovered)
            .await
    }

    /// Create the account for a freshly authenticated identity.
    ///
    /// `recovered` marks a caller that came through the sign-in recovery
    /// path; only such a caller may find an existing account, which is then
    /// returned without any write.
    pub async fn register_account(
        &self,
        identity: &Identity,
        role: Role,
        profile: ProfileFields,
        recovered: bool,
    ) -> AppResult<RegistrationOutcome> {
        if let Some(account) = self.lookup_account(&identity.id).await? {
            if recovered {
                tracing::info!(account_id = %account.id, "Recovered existing account");
                return Ok(RegistrationOutcome {
                    account,
                    join_request: None,
                    recovered: true,
                });
            }
            return Err(AppError::Conflict(format!(
                "Account already exists: {}",
                identity.id
            )));
        }

        let bootstrap =
            role == Role::Teacher && !self.account_repo.exists_with_role(Role::Teacher).await?;

        let created = match self.create_account(identity, role, &profile, bootstrap).await {
            // Another teacher took the admin slot after the check.
            Err(AppError::Conflict(_)) if bootstrap => {
                tracing::info!(identity_id = %identity.id, "Bootstrap slot taken, registering as pending");
                self.create_account(identity, role, &profile, false)
                    .await
                    .map(|account| (account, false))
            }
            other => other.map(|account| (account, bootstrap)),
        };

        let (account, bootstrap) = match created {
            Ok(created) => created,
            Err(e) => {
                tracing::error!(error = %e, identity_id = %identity.id, "Failed to create account");
                if let Err(sign_out_err) = self.credentials.sign_out().await {
                    tracing::warn!(error = %sign_out_err, "Failed to sign out after account failure");
                }
                return Err(e);
            }
        };

        if bootstrap {
            tracing::info!(account_id = %account.id, "Bootstrap teacher approved as admin");
            return Ok(RegistrationOutcome {
                account,
                join_request: None,
                recovered,
            });
        }

        let join_request = match self.file_join_request(&account, &profile).await {
            Ok(request) => Some(request),
            Err(e) => {
                tracing::warn!(error = %e, account_id = %account.id, "Failed to create join request");
                None
            }
        };

        Ok(RegistrationOutcome {
            account,
            join_request,
            recovered,
        })
    }

    /// Insert the account. The store admits a single admin, so a bootstrap
    /// insert that loses the race fails with [`AppError::Conflict`].
    async fn create_account(
        &self,
        identity: &Identity,
        role: Role,
        profile: &ProfileFields,
        bootstrap: bool,
    ) -> AppResult<account::Model> {
        let model = account::ActiveModel {
            id: Set(identity.id.clone()),
            role: Set(role),
            name: Set(profile.name.clone()),
            email: Set(profile.email.clone()),
            phone: Set(profile.phone.clone()),
            is_approved: Set(bootstrap),
            is_rejected: Set(false),
            is_admin: Set(bootstrap),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        self.account_repo.create(model).await
    }

    /// Account lookup bounded by the profile lookup timeout.
    async fn lookup_account(&self, id: &str) -> AppResult<Option<account::Model>> {
        tokio::time::timeout(self.profile_lookup_timeout, self.account_repo.find_by_id(id))
            .await
            .map_err(|_| AppError::Timeout(format!("Account lookup for {id}")))?
    }

    async fn file_join_request(
        &self,
        account: &account::Model,
        profile: &ProfileFields,
    ) -> AppResult<join_request::Model> {
        let model = join_request::ActiveModel {
            id: Set(self.id_gen.generate()),
            account_id: Set(account.id.clone()),
            role: Set(account.role),
            name: Set(profile.name.clone()),
            email: Set(profile.email.clone()),
            phone: Set(profile.phone.clone()),
            age: Set(if account.role == Role::Student {
                profile.age
            } else {
                None
            }),
            status: Set(JoinRequestStatus::Pending),
            reviewed_by: Set(None),
            created_at: Set(Utc::now().into()),
            reviewed_at: Set(None),
        };

        self.join_request_repo.create(model).await
    }

    /// Pending join requests, oldest first.
    pub async fn list_pending_requests(&self) -> AppResult<Vec<join_request::Model>> {
        self.join_request_repo.find_pending().await
    }

    /// Live queue of pending join requests.
    #[must_use]
    pub fn watch_pending_requests(&self) -> LiveStream<Vec<join_request::Model>> {
        self.join_request_repo.watch_pending()
    }

    /// The reviewer must be an approved teacher.
    async fn authorize_reviewer(&self, reviewer_id: &str) -> AppResult<account::Model> {
        let reviewer = self
            .account_repo
            .find_by_id(reviewer_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("Reviewer has no account".to_string()))?;

        if reviewer.role != Role::Teacher || !reviewer.is_approved {
            return Err(AppError::Forbidden(
                "Only approved teachers can review join requests".to_string(),
            ));
        }

        Ok(reviewer)
    }

    /// Accept or reject a pending join request.
    ///
    /// The request, its account and (for an accepted student) the new student
    /// are written in one transaction. The request is only updated while it
    /// is still pending, so a concurrent second review fails with
    /// [`AppError::Conflict`] and writes nothing.
    pub async fn review_join_request(
        &self,
        reviewer_id: &str,
        request_id: &str,
        decision: ReviewDecision,
    ) -> AppResult<join_request::Model> {
        let reviewer = self.authorize_reviewer(reviewer_id).await?;
        let request = self.join_request_repo.get_by_id(request_id).await?;

        if request.status != JoinRequestStatus::Pending {
            return Err(AppError::Conflict(
                "Join request already reviewed".to_string(),
            ));
        }
        if request.role == Role::Teacher && !reviewer.is_admin {
            return Err(AppError::Forbidden(
                "Only admins can review teacher requests".to_string(),
            ));
        }

        let accept = decision == ReviewDecision::Accept;
        let status = if accept {
            JoinRequestStatus::Accepted
        } else {
            JoinRequestStatus::Rejected
        };
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        let txn = self.store.begin().await?;

        let updated = JoinRequest::update_many()
            .col_expr(join_request::Column::Status, Expr::value(status))
            .col_expr(join_request::Column::ReviewedBy, Expr::value(reviewer.id.clone()))
            .col_expr(join_request::Column::ReviewedAt, Expr::value(now))
            .filter(join_request::Column::Id.eq(request_id))
            .filter(join_request::Column::Status.eq(JoinRequestStatus::Pending))
            .exec(&txn)
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        if updated.rows_affected == 0 {
            return Err(AppError::Conflict(
                "Join request already reviewed".to_string(),
            ));
        }

        let account_update = Account::update_many()
            .col_expr(account::Column::IsApproved, Expr::value(accept))
            .col_expr(account::Column::IsRejected, Expr::value(!accept))
            .col_expr(account::Column::UpdatedAt, Expr::value(now))
            .filter(account::Column::Id.eq(request.account_id.as_str()))
            .exec(&txn)
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        if accept && account_update.rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "Account not found: {}",
                request.account_id
            )));
        }

        let creates_student = accept && request.role == Role::Student;
        if creates_student {
            student::ActiveModel {
                id: Set(self.id_gen.generate()),
                name: Set(request.name.clone()),
                age: Set(request.age.unwrap_or_default()),
                parent_id: Set(None),
                teacher_id: Set(Some(reviewer.id.clone())),
                account_id: Set(Some(request.account_id.clone())),
                juz_number: Set(STARTING_JUZ),
                surah_name: Set(STARTING_SURAH.to_string()),
                verse_number: Set(STARTING_VERSE),
                notes: Set(None),
                enrolled_at: Set(now),
                updated_at: Set(None),
            }
            .insert(&txn)
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::WriteFailure(e.to_string()))?;

        let feed = self.store.feed();
        feed.publish(Change::updated(Collection::JoinRequests));
        feed.publish(Change::updated(Collection::Accounts));
        if creates_student {
            feed.publish(Change::created(Collection::Students));
        }

        tracing::info!(
            request_id = %request_id,
            reviewer_id = %reviewer.id,
            decision = ?decision,
            "Join request reviewed"
        );

        Ok(join_request::Model {
            status,
            reviewed_by: Some(reviewer.id),
            reviewed_at: Some(now),
            ..request
        })
    }

    /// Delete a rejected account and every join request it filed.
    ///
    /// The identity is left to the caller.
    pub async fn purge_rejected_account(&self, account_id: &str) -> AppResult<()> {
        let removed = self.join_request_repo.delete_by_account(account_id).await?;
        self.account_repo.delete(account_id).await?;

        tracing::info!(account_id = %account_id, join_requests = removed, "Purged rejected account");
        Ok(())
    }
}
