//! Credential service: identities, passwords and the current session.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use chrono::Utc;
use hifz_common::{AppError, AuthError, IdGenerator};
use hifz_db::{entities::identity, repositories::IdentityRepository};
use sea_orm::Set;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
}

impl From<identity::Model> for Identity {
    fn from(model: identity::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
        }
    }
}

/// Authentication backend.
///
/// Signing up or in makes the identity current; signing out clears it.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Create an identity and sign it in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Verify credentials and sign the identity in.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Clear the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The signed-in identity, if any.
    fn current_identity(&self) -> Option<Identity>;

    /// Delete an identity, signing it out if it is current.
    async fn delete_identity(&self, id: &str) -> Result<(), AuthError>;

    /// Auth-state changes, starting with the current state.
    fn subscribe(&self) -> WatchStream<Option<Identity>>;
}

/// Shared handle to a credential provider.
pub type Credentials = Arc<dyn CredentialProvider>;

/// Credential provider over the `identity` collection.
#[derive(Clone)]
pub struct LocalCredentialProvider {
    identity_repo: IdentityRepository,
    current: Arc<watch::Sender<Option<Identity>>>,
    min_password_length: usize,
    id_gen: IdGenerator,
}

impl LocalCredentialProvider {
    /// Create a new local credential provider.
    #[must_use]
    pub fn new(identity_repo: IdentityRepository, min_password_length: usize) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            identity_repo,
            current: Arc::new(current),
            min_password_length,
            id_gen: IdGenerator::new(),
        }
    }

    fn set_current(&self, identity: Option<Identity>) {
        self.current.send_replace(identity);
    }
}

fn backend_error(e: AppError) -> AuthError {
    AuthError::Other(e.to_string())
}

#[async_trait]
impl CredentialProvider for LocalCredentialProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if password.chars().count() < self.min_password_length {
            return Err(AuthError::WeakPassword);
        }

        let email = email.trim().to_lowercase();
        if self
            .identity_repo
            .find_by_email(&email)
            .await
            .map_err(backend_error)?
            .is_some()
        {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let password_hash = hash_password(password)?;
        let model = identity::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(email),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now().into()),
        };

        let identity: Identity = self
            .identity_repo
            .create(model)
            .await
            .map_err(backend_error)?
            .into();

        tracing::info!(identity_id = %identity.id, "Identity created");
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let record = self
            .identity_repo
            .find_by_email(email.trim())
            .await
            .map_err(backend_error)?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(password, &record.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity::from(record);
        self.set_current(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_current(None);
        Ok(())
    }

    fn current_identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    async fn delete_identity(&self, id: &str) -> Result<(), AuthError> {
        if !self.identity_repo.delete(id).await.map_err(backend_error)? {
            return Err(AuthError::UserNotFound);
        }

        self.current.send_if_modified(|current| {
            if current.as_ref().is_some_and(|c| c.id == id) {
                *current = None;
                true
            } else {
                false
            }
        });

        tracing::info!(identity_id = %id, "Identity deleted");
        Ok(())
    }

    fn subscribe(&self) -> WatchStream<Option<Identity>> {
        WatchStream::new(self.current.subscribe())
    }
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Other(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AuthError::Other(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
