use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::user_entity;
use crate::error::{AppError, AppResult};
use crate::models::double_option;
use crate::utils::FieldErrors;

pub use crate::entities::users::{SubscriptionTier, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub subscription_tier: SubscriptionTier,
    pub subscription_expiry: Option<DateTime<Utc>>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(user: user_entity::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_image_url: user.profile_image_url,
            subscription_tier: user.subscription_tier,
            subscription_expiry: user.subscription_expiry,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Identity fields copied from the session token on first login and refreshed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertUser {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Maximum number of users (default 100)
    pub limit: Option<i64>,
}

/// Admin edit of a user. Only the listed fields can change; `id` and timestamps are fixed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub profile_image_url: Option<Option<String>>,
    pub subscription_tier: Option<SubscriptionTier>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub subscription_expiry: Option<Option<DateTime<Utc>>>,
    pub role: Option<UserRole>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.profile_image_url.is_none()
            && self.subscription_tier.is_none()
            && self.subscription_expiry.is_none()
            && self.role.is_none()
    }

    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        if self.is_empty() {
            errors.add("body", "no fields to update");
        }
        if let Some(Some(email)) = &self.email
            && !looks_like_email(email)
        {
            errors.add("email", "must be a valid email address");
        }
        errors.into_result()
    }
}

fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpgradeSubscriptionRequest {
    /// Target tier, `pro` or `expert`
    #[schema(example = "pro")]
    pub tier: String,
}

impl UpgradeSubscriptionRequest {
    /// Only paid tiers can be bought; anything else is rejected.
    pub fn target_tier(&self) -> AppResult<SubscriptionTier> {
        match self.tier.as_str() {
            "pro" => Ok(SubscriptionTier::Pro),
            "expert" => Ok(SubscriptionTier::Expert),
            _ => Err(AppError::ValidationError(
                "Invalid subscription tier".to_string(),
            )),
        }
    }
}
