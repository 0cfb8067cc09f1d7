//! HTTP Basic authentication, evaluated on every protected request.
//!
//! Handlers opt in by taking an [`AuthUser`] argument; the extractor runs
//! before the handler body and rejects the request on the first failed check.

use std::fmt;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use base64::{Engine, prelude::BASE64_STANDARD};
use sqlx::AnyPool;

use crate::{
    error::ApiError,
    models::User,
    password::verify_password,
    state::AppState,
    validation::{validate_email, validate_password},
};

pub const CREDENTIALS_MISSING: &str = "Basic auth credentials missing";
pub const INVALID_EMAIL: &str = "Invalid email";
pub const INVALID_PASSWORD_FORMAT: &str = "Invalid password format";
pub const BAD_CREDENTIALS: &str = "Invalid email or password";
pub const LOOKUP_FAILED: &str = "Database connection unavailable";

/// Identity of the caller, established for this request only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    /// Decodes `Authorization: Basic base64(email:password)`. Anything
    /// unreadable, or an empty email or password, counts as missing.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = BASE64_STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (email, password) = decoded.split_once(':')?;

        if email.is_empty() || password.is_empty() {
            return None;
        }

        Some(Self {
            email: email.to_owned(),
            password: password.to_owned(),
        })
    }

    pub fn check_format(&self) -> Result<(), ApiError> {
        if !validate_email(&self.email) {
            return Err(ApiError::Unauthorized(INVALID_EMAIL));
        }

        if !validate_password(&self.password) {
            return Err(ApiError::Unauthorized(INVALID_PASSWORD_FORMAT));
        }

        Ok(())
    }
}

pub async fn authenticate(db: &AnyPool, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let credentials =
        Credentials::from_headers(headers).ok_or(ApiError::Unauthorized(CREDENTIALS_MISSING))?;

    credentials.check_format()?;

    let user = User::find_by_email(db, &credentials.email)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "user lookup failed");
            ApiError::ServiceUnavailable(LOOKUP_FAILED)
        })?
        .ok_or(ApiError::Unauthorized(BAD_CREDENTIALS))?;

    let hash = user.password_hash;
    let password = credentials.password;
    let verified = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .map_err(|_| ApiError::Hashing)?;

    if !verified {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
    }

    Ok(AuthUser {
        id: user.id,
        email: user.email,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(&state.db_pool, &parts.headers).await?;
        tracing::debug!(user_id = %user.id, "authenticated");

        Ok(user)
    }
}
