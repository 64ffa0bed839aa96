use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::Utc;
use password_hash::rand_core::OsRng;
use sea_orm::sea_query::OnConflict;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{LoginRequest, LoginResponse, ProfileChange, RegisterRequest, UpdateProfileRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::{CurrentUser, issue_token},
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
    validation::Validate,
};

const EMAIL_TAKEN: &str = "Email is already taken";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn email_taken(state: &AppState, email: &str, except: Option<Uuid>) -> AppResult<bool> {
    let mut condition = Condition::all().add(UserCol::Email.eq(email));
    if let Some(id) = except {
        condition = condition.add(UserCol::Id.ne(id));
    }
    Ok(Users::find().filter(condition).one(&state.orm).await?.is_some())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let email = normalize_email(&payload.email);

    if email_taken(state, &email, None).await? {
        return Err(AppError::BadRequest(EMAIL_TAKEN.into()));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        first_name: Set(payload.first_name.map(|n| n.trim().to_string())),
        last_name: Set(payload.last_name.map(|n| n.trim().to_string())),
        profile_image_url: Set(None),
        is_admin: Set(false),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| AppError::unique_violation(err, EMAIL_TAKEN))?;

    audit::record(
        state,
        user.id,
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("User created", User::from(user), None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let invalid = || AppError::BadRequest("Invalid email or password".into());

    let user = Users::find()
        .filter(UserCol::Email.eq(normalize_email(&payload.email)))
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    let token = issue_token(&state.config.jwt_secret, user.id, state.config.jwt_ttl_hours)?;

    audit::record(
        state,
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            token_type: "Bearer".into(),
        },
        Some(Meta::empty()),
    ))
}

pub fn current_user(user: CurrentUser) -> ApiResponse<User> {
    ApiResponse::success("User", user.0, None)
}

pub async fn update_profile(
    state: &AppState,
    user: &CurrentUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let changes = payload.into_changes()?;

    let existing = Users::find_by_id(user.id())
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let mut active: UserActive = existing.into();

    for change in changes {
        match change {
            ProfileChange::SetFirstName(name) => active.first_name = Set(Some(name)),
            ProfileChange::SetLastName(name) => active.last_name = Set(Some(name)),
            ProfileChange::SetEmail(email) => {
                if email_taken(state, &email, Some(user.id())).await? {
                    return Err(AppError::BadRequest(EMAIL_TAKEN.into()));
                }
                active.email = Set(email);
            }
        }
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active
        .update(&state.orm)
        .await
        .map_err(|err| AppError::unique_violation(err, EMAIL_TAKEN))?;

    Ok(ApiResponse::success("Profile updated", User::from(updated), None))
}

/// Account data for [`upsert_user`]; the email is the identity key.
#[derive(Debug, Clone)]
pub struct UpsertUser {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
}

/// Insert the account, or refresh its profile, password and role if the
/// email already exists.
pub async fn upsert_user(state: &AppState, account: UpsertUser) -> AppResult<User> {
    let email = normalize_email(&account.email);
    let model = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.clone()),
        password_hash: Set(hash_password(&account.password)?),
        first_name: Set(account.first_name),
        last_name: Set(account.last_name),
        profile_image_url: Set(None),
        is_admin: Set(account.is_admin),
        created_at: NotSet,
        updated_at: Set(Utc::now().into()),
    };

    Users::insert(model)
        .on_conflict(
            OnConflict::column(UserCol::Email)
                .update_columns([
                    UserCol::PasswordHash,
                    UserCol::FirstName,
                    UserCol::LastName,
                    UserCol::IsAdmin,
                    UserCol::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(&state.orm)
        .await?;

    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(User::from(user))
}
