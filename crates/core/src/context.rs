//! Service wiring.

use crate::services::{
    Credentials, DailyRecordService, LiveViewService, LocalCredentialProvider, MessagingService,
    RegistrationService, RemovalService, SessionService, StudentService,
};
use hifz_common::{AppResult, Config};
use hifz_db::{Store, repositories::IdentityRepository};
use std::sync::Arc;

/// Every service, built over one store and one credential provider.
#[derive(Clone)]
pub struct AppContext {
    pub store: Store,
    pub credentials: Credentials,
    pub registration: RegistrationService,
    pub session: SessionService,
    pub removal: RemovalService,
    pub students: StudentService,
    pub records: DailyRecordService,
    pub messaging: MessagingService,
    pub live_views: LiveViewService,
}

impl AppContext {
    /// Connect to the configured database, run migrations and wire the
    /// local credential provider.
    pub async fn bootstrap(config: &Config) -> AppResult<Self> {
        let store = hifz_db::open(config).await?;
        let credentials: Credentials = Arc::new(LocalCredentialProvider::new(
            IdentityRepository::new(store.clone()),
            config.workflow.min_password_length,
        ));
        Self::from_parts(store, credentials, config)
    }

    /// Wire services over explicit collaborators.
    pub fn from_parts(store: Store, credentials: Credentials, config: &Config) -> AppResult<Self> {
        let tz = config.workflow.tz()?;
        let registration = RegistrationService::new(
            store.clone(),
            credentials.clone(),
            config.workflow.profile_lookup_timeout(),
        );

        tracing::debug!(timezone = %tz, "Services wired");

        Ok(Self {
            session: SessionService::new(store.clone(), credentials.clone(), registration.clone()),
            registration,
            removal: RemovalService::new(store.clone()),
            students: StudentService::new(store.clone()),
            records: DailyRecordService::new(store.clone(), tz),
            messaging: MessagingService::new(store.clone()),
            live_views: LiveViewService::new(store.clone(), tz),
            credentials,
            store,
        })
    }
}
