use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::Discount,
    money::Percentage,
    validation::{Validate, Violations},
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscountRequest {
    pub code: String,
    #[schema(value_type = String, example = "20")]
    pub percentage: Percentage,
    pub valid_until: DateTime<Utc>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Validate for CreateDiscountRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Violations::new();
        v.require_text(&self.code, "code");
        v.finish()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateDiscountRequest {
    pub code: Option<String>,
    #[schema(value_type = Option<String>, example = "15")]
    pub percentage: Option<Percentage>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

/// The mutations an admin may apply to a discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscountChange {
    Recode(String),
    SetPercentage(Percentage),
    SetValidUntil(DateTime<Utc>),
    SetActive(bool),
}

impl UpdateDiscountRequest {
    pub fn into_changes(self) -> AppResult<Vec<DiscountChange>> {
        let mut v = Violations::new();
        let mut changes = Vec::new();
        if let Some(code) = self.code {
            v.require_text(&code, "code");
            changes.push(DiscountChange::Recode(code.trim().to_string()));
        }
        if let Some(percentage) = self.percentage {
            changes.push(DiscountChange::SetPercentage(percentage));
        }
        if let Some(valid_until) = self.valid_until {
            changes.push(DiscountChange::SetValidUntil(valid_until));
        }
        if let Some(is_active) = self.is_active {
            changes.push(DiscountChange::SetActive(is_active));
        }
        v.finish()?;
        if changes.is_empty() {
            return Err(AppError::BadRequest("No discount fields to update".into()));
        }
        Ok(changes)
    }
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct DiscountList {
    #[schema(value_type = Vec<Discount>)]
    pub items: Vec<Discount>,
}
