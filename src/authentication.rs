use std::sync::Arc;

use anyhow::{Context, Result};
use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{db_helpers::get_user_by_id, errors::RequestError, handlers::found, AppState};

const SESSION_EXPIRY_DURATION: time::Duration = time::Duration::days(14);
pub const SESSION_COOKIE: &str = "session";
pub const LOGIN_URL: &str = "/auth/login/";

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    id: i64,
    exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}

/// The visitor, if the session cookie names a live user.
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn get_id(&self) -> Option<i64> {
        self.0.as_ref().map(|a| a.id)
    }
}

/// A signed-in visitor. Anonymous requests are sent to the login page.
pub struct LoginRequired(pub AuthUser);

/// A signed-in staff member. Used by the admin API, so rejections are JSON.
pub struct StaffUser(pub AuthUser);

/// Redirect to the login page that brings the visitor back afterwards.
pub struct LoginRedirect {
    next: String,
}

impl LoginRedirect {
    pub fn new(next: impl Into<String>) -> Self {
        LoginRedirect { next: next.into() }
    }

    /// `next` is percent-encoded except for `/`, so its own query string survives.
    pub fn location(&self) -> String {
        let next = urlencoding::encode(&self.next).replace("%2F", "/");
        format!("{}?next={}", LOGIN_URL, next)
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        found(&self.location())
    }
}

fn session_token_from_parts(parts: &Parts) -> Option<&str> {
    let cookie_header = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix("session="))
        .filter(|token| !token.is_empty())
}

fn app_state(parts: &Parts) -> Result<Arc<AppState>, RequestError> {
    // `Extension` layers store the bare value in the request extensions.
    parts
        .extensions
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(|| {
            tracing::error!("AppState extension is missing from the router");
            RequestError::ServerError
        })
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = match session_token_from_parts(parts) {
            Some(token) => token.to_owned(),
            None => return Ok(MaybeUser(None)),
        };
        let state = app_state(parts)?;

        // A stale or forged cookie just means an anonymous visitor.
        let id = match verify_session_token(&state.config.jwt_secret, &token) {
            Ok(id) => id,
            Err(_) => return Ok(MaybeUser(None)),
        };

        let user = get_user_by_id(&state.pool, id).await?;
        Ok(MaybeUser(user.map(|user| AuthUser {
            id: user.id,
            username: user.username,
            is_staff: user.is_staff,
        })))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for LoginRequired
where
    S: Send + Sync + 'static,
{
    type Rejection = Response;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        match user {
            Some(user) => Ok(LoginRequired(user)),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|path| path.as_str().to_owned())
                    .unwrap_or_else(|| parts.uri.path().to_owned());
                Err(LoginRedirect::new(next).into_response())
            }
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for StaffUser
where
    S: Send + Sync + 'static,
{
    type Rejection = Response;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state)
            .await
            .map_err(|e| e.to_json_response().into_response())?;
        match user {
            Some(user) if user.is_staff => Ok(StaffUser(user)),
            Some(_) => Err(RequestError::Forbidden.to_json_response().into_response()),
            None => Err(RequestError::NotAuthorized("Need to be authorized")
                .to_json_response()
                .into_response()),
        }
    }
}

pub fn issue_session_token(secret: &str, id: i64) -> Result<String> {
    let expiry_date = OffsetDateTime::now_utc() + SESSION_EXPIRY_DURATION;
    let claim = AuthClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_ref()),
    )
    .context("Failed to generate session token")
}

pub fn verify_session_token(secret: &str, token: &str) -> Result<i64, RequestError> {
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        RequestError::NotAuthorized("Invalid Token")
    })?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        return Err(RequestError::NotAuthorized("Token expired"));
    }
    Ok(claim.id)
}

pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        SESSION_EXPIRY_DURATION.whole_seconds()
    )
}

pub fn expired_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Only local absolute paths are followed after login.
pub fn safe_next_path(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn session_token_round_trips_the_user_id() {
        let token = issue_session_token(SECRET, 42).unwrap();
        assert_eq!(verify_session_token(SECRET, &token).unwrap(), 42);
    }

    #[test]
    fn session_token_signed_with_another_secret_is_rejected() {
        let token = issue_session_token("other-secret", 42).unwrap();
        assert!(matches!(
            verify_session_token(SECRET, &token),
            Err(RequestError::NotAuthorized(_))
        ));
    }

    #[test]
    fn next_path_must_be_local() {
        assert_eq!(safe_next_path(Some("/create/")), "/create/");
        assert_eq!(safe_next_path(Some("//evil.example")), "/");
        assert_eq!(safe_next_path(Some("https://evil.example/")), "/");
        assert_eq!(safe_next_path(None), "/");
    }

    #[test]
    fn login_redirect_carries_next() {
        let redirect = LoginRedirect::new("/create/");
        assert_eq!(redirect.location(), "/auth/login/?next=/create/");
    }

    #[test]
    fn login_redirect_keeps_the_query_of_next() {
        let redirect = LoginRedirect::new("/follow/?page=2&x=1");
        assert_eq!(
            redirect.location(),
            "/auth/login/?next=/follow/%3Fpage%3D2%26x%3D1"
        );
    }

    #[tokio::test]
    async fn password_hash_verifies_only_the_original_password() {
        let hash = hash_password_argon2("correct horse".to_owned()).await.unwrap();
        assert!(verify_password_argon2("correct horse".to_owned(), &hash)
            .await
            .unwrap());
        assert!(!verify_password_argon2("battery staple".to_owned(), &hash)
            .await
            .unwrap());
    }
}
