//! Request authentication and the admin gate.
//!
//! Handlers declare what they need by extractor:
//!
//! - [`AuthUser`]: a valid bearer token (401 otherwise).
//! - [`CurrentUser`]: a valid token whose user record still exists.
//! - [`AdminUser`]: a valid token whose stored user record is an admin
//!   (403 otherwise). It is the only way to obtain an `AdminUser`, so any
//!   service taking one can assume the check already passed.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{
    dto::auth::Claims,
    entity::Users,
    error::{AppError, AppResult},
    models::User,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }

    pub fn is_admin(&self) -> bool {
        self.0.is_admin
    }
}

#[derive(Debug, Clone)]
pub struct AdminUser(User);

impl AdminUser {
    pub fn id(&self) -> Uuid {
        self.0.id
    }
}

/// Grants the admin capability to a loaded user record.
pub fn authorize_admin(user: Option<User>) -> AppResult<AdminUser> {
    match user {
        Some(user) if user.is_admin => Ok(AdminUser(user)),
        _ => Err(AppError::admin_required()),
    }
}

pub fn issue_token(secret: &str, user_id: Uuid, ttl_hours: i64) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_token(secret: &str, token: &str) -> AppResult<AuthUser> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;

    Ok(AuthUser { user_id })
}

fn bearer_token(parts: &Parts) -> AppResult<&str> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))
}

async fn load_user(state: &AppState, user_id: Uuid) -> AppResult<Option<User>> {
    Ok(Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .map(User::from))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        verify_token(&state.config.jwt_secret, token)
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        load_user(state, auth.user_id)
            .await?
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        let admin = authorize_admin(load_user(state, auth.user_id).await?);
        if admin.is_err() {
            tracing::warn!(user_id = %auth.user_id, path = %parts.uri.path(), "admin access denied");
        }
        admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "someone@example.com".into(),
            first_name: None,
            last_name: None,
            profile_image_url: None,
            is_admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn gate_admits_only_admins() {
        assert!(authorize_admin(Some(user(true))).is_ok());
        assert!(matches!(
            authorize_admin(Some(user(false))),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(authorize_admin(None), Err(AppError::Forbidden(_))));
    }

    #[test]
    fn issued_tokens_verify_with_same_secret_only() {
        let id = Uuid::new_v4();
        let token = issue_token("s3cret", id, 1).unwrap();
        assert_eq!(verify_token("s3cret", &token).unwrap().user_id, id);
        assert!(matches!(
            verify_token("other", &token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = issue_token("s3cret", Uuid::new_v4(), -2).unwrap();
        assert!(verify_token("s3cret", &token).is_err());
    }

    #[test]
    fn bearer_scheme_is_required() {
        let request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "Basic abc")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert!(matches!(bearer_token(&parts), Err(AppError::Unauthorized(_))));

        let request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "Bearer  tok ")
            .body(())
            .unwrap();
        let (parts, _) = request.into_parts();
        assert_eq!(bearer_token(&parts).unwrap(), "tok");
    }
}
