use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::validate::{
    Validate, ValidationError, check_length, check_non_negative, check_optional_length,
};

pub const MAX_NAME_LEN: usize = 64;
pub const MAX_EMAIL_LEN: usize = 256;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 256;
pub const MAX_TITLE_LEN: usize = 128;
pub const MAX_DESCRIPTION_LEN: usize = 1024;
pub const MAX_MESSAGE_LEN: usize = 512;
pub const MAX_SUPPORT_TIERS: usize = 3;

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        check_length("email", &self.email, 1, MAX_EMAIL_LEN)?;
        check_length("firstName", &self.first_name, 1, MAX_NAME_LEN)?;
        check_length("lastName", &self.last_name, 1, MAX_NAME_LEN)?;
        check_length("password", &self.password, MIN_PASSWORD_LEN, MAX_PASSWORD_LEN)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        check_length("email", &self.email, 1, MAX_EMAIL_LEN)?;
        check_length("password", &self.password, 1, MAX_PASSWORD_LEN)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: i64,
    pub token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub current_password: Option<String>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        check_optional_length("email", self.email.as_deref(), 1, MAX_EMAIL_LEN)?;
        check_optional_length("firstName", self.first_name.as_deref(), 1, MAX_NAME_LEN)?;
        check_optional_length("lastName", self.last_name.as_deref(), 1, MAX_NAME_LEN)?;
        check_optional_length(
            "password",
            self.password.as_deref(),
            MIN_PASSWORD_LEN,
            MAX_PASSWORD_LEN,
        )?;
        if self.password.is_some() && self.current_password.is_none() {
            return Err(ValidationError(
                "currentPassword is required to change the password".into(),
            ));
        }
        check_optional_length(
            "currentPassword",
            self.current_password.as_deref(),
            1,
            MAX_PASSWORD_LEN,
        )
    }
}

/// Email is only present when the caller is viewing their own account.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

// -- Petitions --

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTierRequest {
    pub title: String,
    pub description: String,
    pub cost: i64,
}

impl Validate for SupportTierRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        check_length("supportTier.title", &self.title, 1, MAX_TITLE_LEN)?;
        check_length("supportTier.description", &self.description, 1, MAX_DESCRIPTION_LEN)?;
        check_non_negative("supportTier.cost", self.cost)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetitionRequest {
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub support_tiers: Vec<SupportTierRequest>,
}

impl Validate for CreatePetitionRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        check_length("title", &self.title, 1, MAX_TITLE_LEN)?;
        check_length("description", &self.description, 1, MAX_DESCRIPTION_LEN)?;

        if self.support_tiers.is_empty() || self.support_tiers.len() > MAX_SUPPORT_TIERS {
            return Err(ValidationError(format!(
                "a petition must have between 1 and {MAX_SUPPORT_TIERS} support tiers"
            )));
        }

        let mut titles = HashSet::new();
        for tier in &self.support_tiers {
            tier.validate()?;
            if !titles.insert(tier.title.as_str()) {
                return Err(ValidationError(format!(
                    "support tier title '{}' is used more than once",
                    tier.title
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePetitionResponse {
    pub petition_id: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditPetitionRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
}

impl Validate for EditPetitionRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        check_optional_length("title", self.title.as_deref(), 1, MAX_TITLE_LEN)?;
        check_optional_length("description", self.description.as_deref(), 1, MAX_DESCRIPTION_LEN)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortBy {
    AlphabeticalAsc,
    AlphabeticalDesc,
    CostAsc,
    CostDesc,
    #[default]
    CreatedAsc,
    CreatedDesc,
}

/// Query string of `GET /petitions`. `categoryIds` may be repeated.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionSearchQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<i64>,
    pub supporting_cost: Option<i64>,
    pub owner_id: Option<i64>,
    pub supporter_id: Option<i64>,
    pub sort_by: Option<SortBy>,
    pub start_index: Option<usize>,
    pub count: Option<usize>,
}

impl Validate for PetitionSearchQuery {
    fn validate(&self) -> Result<(), ValidationError> {
        check_optional_length("q", self.q.as_deref(), 1, MAX_TITLE_LEN)?;
        if let Some(cost) = self.supporting_cost {
            check_non_negative("supportingCost", cost)?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PetitionListResponse {
    pub petitions: Vec<crate::models::PetitionSummary>,
    /// Total number of matches before `startIndex`/`count` are applied.
    pub count: usize,
}

// -- Support tiers --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupportTierResponse {
    pub support_tier_id: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSupportTierRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cost: Option<i64>,
}

impl Validate for EditSupportTierRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        check_optional_length("title", self.title.as_deref(), 1, MAX_TITLE_LEN)?;
        check_optional_length("description", self.description.as_deref(), 1, MAX_DESCRIPTION_LEN)?;
        if let Some(cost) = self.cost {
            check_non_negative("cost", cost)?;
        }
        Ok(())
    }
}

// -- Supporters --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSupporterRequest {
    pub support_tier_id: i64,
    pub message: Option<String>,
}

impl Validate for AddSupporterRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        check_optional_length("message", self.message.as_deref(), 1, MAX_MESSAGE_LEN)
    }
}
