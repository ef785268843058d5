//! Session service: portal sign-in and the signed-in account.

use crate::services::credentials::{Credentials, Identity};
use crate::services::registration::RegistrationService;
use hifz_common::{AppError, AppResult};
use hifz_db::{
    Store,
    entities::{Role, account},
    repositories::AccountRepository,
};
use tokio_stream::wrappers::WatchStream;

/// Session service.
#[derive(Clone)]
pub struct SessionService {
    credentials: Credentials,
    account_repo: AccountRepository,
    registration: RegistrationService,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub fn new(store: Store, credentials: Credentials, registration: RegistrationService) -> Self {
        Self {
            credentials,
            account_repo: AccountRepository::new(store),
            registration,
        }
    }

    /// Sign in through the portal of one role.
    ///
    /// The session survives only when the account exists, has the portal's
    /// role and is approved. A rejected account is purged along with its
    /// identity.
    pub async fn sign_in_to_portal(
        &self,
        email: &str,
        password: &str,
        portal: Role,
    ) -> AppResult<account::Model> {
        let identity = self.credentials.sign_in(email, password).await?;

        let Some(account) = self.account_repo.find_by_id(&identity.id).await? else {
            self.sign_out().await?;
            return Err(AppError::ProfileMissing(identity.id));
        };

        if account.role != portal {
            self.sign_out().await?;
            return Err(AppError::RoleMismatch {
                expected: portal.to_string(),
                actual: account.role.to_string(),
            });
        }

        if account.is_rejected {
            self.discard_rejected(&identity).await;
            return Err(AppError::AccountRejected);
        }

        if !account.is_approved {
            self.sign_out().await?;
            return Err(AppError::AccountPending);
        }

        tracing::info!(account_id = %account.id, role = %account.role, "Signed in");
        Ok(account)
    }

    /// Purge the account, delete the identity and sign out. Failures are
    /// logged; the caller reports the rejection regardless.
    async fn discard_rejected(&self, identity: &Identity) {
        if let Err(e) = self.registration.purge_rejected_account(&identity.id).await {
            tracing::warn!(error = %e, account_id = %identity.id, "Failed to purge rejected account");
        }
        if let Err(e) = self.credentials.delete_identity(&identity.id).await {
            tracing::warn!(error = %e, identity_id = %identity.id, "Failed to delete rejected identity");
        }
        if let Err(e) = self.credentials.sign_out().await {
            tracing::warn!(error = %e, "Failed to sign out rejected identity");
        }
    }

    /// The account of the signed-in identity.
    pub async fn current_account(&self) -> AppResult<Option<account::Model>> {
        match self.credentials.current_identity() {
            Some(identity) => self.account_repo.find_by_id(&identity.id).await,
            None => Ok(None),
        }
    }

    /// End the session.
    pub async fn sign_out(&self) -> AppResult<()> {
        self.credentials.sign_out().await?;
        Ok(())
    }

    /// Auth-state changes, starting with the current state.
    #[must_use]
    pub fn watch_auth_state(&self) -> WatchStream<Option<Identity>> {
        self.credentials.subscribe()
    }
}
