use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    validation::{Validate, Violations},
};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Violations::new();
        check_email(&mut v, &self.email);
        v.check(
            self.password.chars().count() >= MIN_PASSWORD_LEN,
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        );
        v.finish()
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Partial profile edit as sent by the dashboard form.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// The profile edits a user may make to their own record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileChange {
    SetFirstName(String),
    SetLastName(String),
    SetEmail(String),
}

impl UpdateProfileRequest {
    pub fn into_changes(self) -> AppResult<Vec<ProfileChange>> {
        let mut v = Violations::new();
        let mut changes = Vec::new();
        if let Some(first_name) = self.first_name {
            v.require_text(&first_name, "firstName");
            changes.push(ProfileChange::SetFirstName(first_name.trim().to_string()));
        }
        if let Some(last_name) = self.last_name {
            v.require_text(&last_name, "lastName");
            changes.push(ProfileChange::SetLastName(last_name.trim().to_string()));
        }
        if let Some(email) = self.email {
            check_email(&mut v, &email);
            changes.push(ProfileChange::SetEmail(email.trim().to_lowercase()));
        }
        v.finish()?;
        if changes.is_empty() {
            return Err(AppError::BadRequest("No profile fields to update".into()));
        }
        Ok(changes)
    }
}

fn check_email(v: &mut Violations, email: &str) {
    let email = email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    v.check(well_formed, "email", "Valid email is required");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_requires_email_and_long_password() {
        let req = RegisterRequest {
            email: "nope".into(),
            password: "short".into(),
            first_name: None,
            last_name: None,
        };
        match req.validate() {
            Err(AppError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, ["email", "password"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn profile_changes_are_normalized() {
        let req: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
            "firstName": " Ada ",
            "email": "Ada@Example.com"
        }))
        .unwrap();
        assert_eq!(
            req.into_changes().unwrap(),
            vec![
                ProfileChange::SetFirstName("Ada".into()),
                ProfileChange::SetEmail("ada@example.com".into()),
            ]
        );
    }

    #[test]
    fn empty_profile_update_is_rejected() {
        assert!(matches!(
            UpdateProfileRequest::default().into_changes(),
            Err(AppError::BadRequest(_))
        ));
        assert!(serde_json::from_value::<UpdateProfileRequest>(
            serde_json::json!({ "isAdmin": true })
        )
        .is_err());
    }
}
