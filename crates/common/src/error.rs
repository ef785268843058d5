//! Error types for hifz-tracker.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Errors reported by the credential service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Email already in use")]
    EmailAlreadyInUse,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Password too weak")]
    WeakPassword,

    #[error("Authentication failed: {0}")]
    Other(String),
}

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // === Session / workflow ===
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Authenticated identity has no account document.
    #[error("Profile missing for identity {0}")]
    ProfileMissing(String),

    #[error("Role mismatch: expected {expected}, found {actual}")]
    RoleMismatch { expected: String, actual: String },

    #[error("Account pending approval")]
    AccountPending,

    #[error("Account rejected")]
    AccountRejected,

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Write failure: {0}")]
    WriteFailure(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the stable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Auth(AuthError::EmailAlreadyInUse) => "EMAIL_ALREADY_IN_USE",
            Self::Auth(AuthError::InvalidCredentials) => "INVALID_CREDENTIALS",
            Self::Auth(AuthError::UserNotFound) => "USER_NOT_FOUND",
            Self::Auth(AuthError::WeakPassword) => "WEAK_PASSWORD",
            Self::Auth(AuthError::Other(_)) => "AUTH_ERROR",
            Self::ProfileMissing(_) => "PROFILE_MISSING",
            Self::RoleMismatch { .. } => "ROLE_MISMATCH",
            Self::AccountPending => "ACCOUNT_PENDING",
            Self::AccountRejected => "ACCOUNT_REJECTED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::WriteFailure(_) => "WRITE_FAILURE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::WriteFailure(_)
                | Self::Timeout(_)
                | Self::Config(_)
                | Self::Internal(_)
                | Self::Auth(AuthError::Other(_))
        )
    }

    /// Human-readable message for display.
    ///
    /// Client-side messages are passed through [`humanize_error_text`];
    /// server-side failures never expose their technical detail.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::Validation(msg)
            | Self::Conflict(msg) => humanize_error_text(msg),
            Self::Auth(AuthError::EmailAlreadyInUse) => {
                "This email address is already registered.".to_string()
            }
            Self::Auth(AuthError::InvalidCredentials) => {
                "The email or password is incorrect.".to_string()
            }
            Self::Auth(AuthError::UserNotFound) => {
                "No account exists for this email address.".to_string()
            }
            Self::Auth(AuthError::WeakPassword) => "The password is too short.".to_string(),
            Self::Auth(AuthError::Other(msg)) => humanize_error_text(msg),
            Self::ProfileMissing(_) => "This account has been disabled or deleted.".to_string(),
            Self::RoleMismatch { expected, actual } => {
                format!("This account is registered as a {actual}, not a {expected}.")
            }
            Self::AccountPending => "Your registration is awaiting approval.".to_string(),
            Self::AccountRejected => "Your registration request was rejected.".to_string(),
            Self::Timeout(_) => {
                "The server took too long to respond. Please try again.".to_string()
            }
            Self::WriteFailure(_) => "Your changes could not be saved. Please try again.".to_string(),
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

// Prefix patterns stripped from technical error text
#[allow(clippy::unwrap_used)]
static BRACKET_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\[[^\]]*\]\s*").unwrap());

#[allow(clippy::unwrap_used)]
static EXCEPTION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z_]*(?:Exception|Error)\s*:\s*").unwrap());

#[allow(clippy::unwrap_used)]
static VERSION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*v?\d+(?:\.\d+)+\s*[:\-]?\s*").unwrap());

#[allow(clippy::unwrap_used)]
static NAMESPACE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[a-z][a-z0-9_\-]*(?:[./][a-z0-9_\-]+)+\s*:\s*").unwrap()
});

#[allow(clippy::unwrap_used)]
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip internal jargon from a technical error string.
///
/// Removes, repeatedly and only at the start of the text: bracketed namespace
/// tags (`[auth/email-already-in-use]`), `Exception:`/`Error:` prefixes,
/// version numbers (`v2.1.0:`) and dotted or slashed namespaces
/// (`store.write:`).
#[must_use]
pub fn humanize_error_text(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    loop {
        let before = text.len();
        for pattern in [&*BRACKET_TAG, &*EXCEPTION_PREFIX, &*VERSION_PREFIX, &*NAMESPACE_PREFIX] {
            text = pattern.replace(&text, "").into_owned();
        }
        if text.len() == before {
            break;
        }
    }

    let text = WHITESPACE.replace_all(text.trim(), " ").into_owned();
    if text.is_empty() {
        "An unexpected error occurred.".to_string()
    } else {
        text
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_bracketed_namespace() {
        assert_eq!(
            humanize_error_text(
                "[auth/email-already-in-use] The email address is already in use by another account."
            ),
            "The email address is already in use by another account."
        );
    }

    #[test]
    fn test_strips_stacked_prefixes() {
        assert_eq!(
            humanize_error_text("Exception: [store/permission-denied]  Missing or insufficient permissions."),
            "Missing or insufficient permissions."
        );
        assert_eq!(
            humanize_error_text("v2.1.0: store.write: Batch commit failed"),
            "Batch commit failed"
        );
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(humanize_error_text("Student not found"), "Student not found");
        assert_eq!(
            humanize_error_text("Juz number must be between 1 and 30"),
            "Juz number must be between 1 and 30"
        );
    }

    #[test]
    fn test_empty_after_stripping() {
        assert_eq!(
            humanize_error_text("[internal/unknown]"),
            "An unexpected error occurred."
        );
    }

    #[test]
    fn test_user_message_hides_server_detail() {
        let err = AppError::WriteFailure("sqlx: UNIQUE constraint failed: account.id".to_string());
        assert!(!err.user_message().contains("sqlx"));
        assert!(err.is_server_error());
    }

    #[test]
    fn test_user_message_for_role_mismatch() {
        let err = AppError::RoleMismatch {
            expected: "teacher".to_string(),
            actual: "parent".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "This account is registered as a parent, not a teacher."
        );
        assert_eq!(err.error_code(), "ROLE_MISMATCH");
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_auth_error_codes() {
        assert_eq!(
            AppError::from(AuthError::EmailAlreadyInUse).error_code(),
            "EMAIL_ALREADY_IN_USE"
        );
        assert_eq!(
            AppError::from(AuthError::Other("[auth/internal] boom".to_string())).user_message(),
            "boom"
        );
    }
}
