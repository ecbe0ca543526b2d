use std::sync::Arc;

use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{DEFAULT_USER_LIMIT, resolve_limit};
use chrono::{DateTime, Duration, Months, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

#[derive(Clone)]
pub struct UserService {
    pool: Arc<DatabaseConnection>,
}

fn email_conflict(email: &str) -> AppError {
    AppError::Conflict(format!("Email '{email}' is already used by another account"))
}

/// `users.email` is unique; a racing writer that slips past the pre-check lands here.
fn map_unique_violation(err: DbErr, email: Option<&str>) -> AppError {
    match (err.sql_err(), email) {
        (Some(SqlErr::UniqueConstraintViolation(_)), Some(email)) => email_conflict(email),
        (Some(SqlErr::UniqueConstraintViolation(_)), None) => {
            AppError::Conflict("Email is already used by another account".to_string())
        }
        _ => AppError::DatabaseError(err),
    }
}

/// Paid subscriptions run for one calendar month from the moment of purchase.
pub fn subscription_expiry_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_add_months(Months::new(1))
        .unwrap_or_else(|| now + Duration::days(30))
}

impl UserService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    pub async fn get_user(&self, user_id: &str) -> AppResult<Option<users::Model>> {
        Ok(users::Entity::find_by_id(user_id.to_string())
            .one(self.pool.as_ref())
            .await?)
    }

    pub async fn require_user(&self, user_id: &str) -> AppResult<users::Model> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Loads the caller and fails with 403 unless they hold the admin role.
    /// The stored role is authoritative; token claims are not trusted for this.
    pub async fn require_admin(&self, user_id: &str) -> AppResult<users::Model> {
        match self.get_user(user_id).await? {
            Some(user) if user.is_admin() => Ok(user),
            _ => Err(AppError::PermissionDenied),
        }
    }

    async fn ensure_email_free(&self, email: &str, owner_id: &str) -> AppResult<()> {
        let taken = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::Id.ne(owner_id))
            .one(self.pool.as_ref())
            .await?;
        if taken.is_some() {
            return Err(email_conflict(email));
        }
        Ok(())
    }

    /// Creates the user on first login, otherwise refreshes the identity fields the
    /// provider supplied. Tier, expiry and role are never touched here.
    pub async fn upsert_user(&self, identity: UpsertUser) -> AppResult<users::Model> {
        if let Some(email) = identity.email.as_deref() {
            self.ensure_email_free(email, &identity.id).await?;
        }

        let now = Utc::now();
        let email = identity.email.clone();

        let mut update_columns = vec![users::Column::UpdatedAt];
        if identity.email.is_some() {
            update_columns.push(users::Column::Email);
        }
        if identity.first_name.is_some() {
            update_columns.push(users::Column::FirstName);
        }
        if identity.last_name.is_some() {
            update_columns.push(users::Column::LastName);
        }
        if identity.profile_image_url.is_some() {
            update_columns.push(users::Column::ProfileImageUrl);
        }

        let model = users::ActiveModel {
            id: Set(identity.id),
            email: Set(identity.email),
            first_name: Set(identity.first_name),
            last_name: Set(identity.last_name),
            profile_image_url: Set(identity.profile_image_url),
            subscription_tier: Set(SubscriptionTier::Free),
            subscription_expiry: Set(None),
            role: Set(UserRole::User),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let user = users::Entity::insert(model)
            .on_conflict(
                OnConflict::column(users::Column::Id)
                    .update_columns(update_columns)
                    .to_owned(),
            )
            .exec_with_returning(self.pool.as_ref())
            .await
            .map_err(|e| map_unique_violation(e, email.as_deref()))?;
        Ok(user)
    }

    /// Returns the stored user, creating it from the session identity if the
    /// caller never fetched their profile.
    pub async fn ensure_user(&self, identity: UpsertUser) -> AppResult<users::Model> {
        match self.get_user(&identity.id).await? {
            Some(u) => Ok(u),
            None => self.upsert_user(identity).await,
        }
    }

    /// Sets a paid tier with a one-month expiry.
    pub async fn upgrade_subscription(
        &self,
        identity: UpsertUser,
        tier: SubscriptionTier,
    ) -> AppResult<users::Model> {
        let user = self.ensure_user(identity).await?;

        let now = Utc::now();
        let expiry = subscription_expiry_from(now);
        let mut model = user.into_active_model();
        model.subscription_tier = Set(tier);
        model.subscription_expiry = Set(Some(expiry));
        model.updated_at = Set(now);
        let updated = model.update(self.pool.as_ref()).await?;

        log::info!(
            "User {} upgraded to {} until {}",
            updated.id,
            tier,
            expiry.to_rfc3339()
        );
        Ok(updated)
    }

    pub async fn list_users(&self, limit: Option<i64>) -> AppResult<Vec<users::Model>> {
        let models = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .limit(resolve_limit(limit, DEFAULT_USER_LIMIT))
            .all(self.pool.as_ref())
            .await?;
        Ok(models)
    }

    pub async fn update_user(
        &self,
        user_id: &str,
        request: UpdateUserRequest,
    ) -> AppResult<users::Model> {
        request.validate()?;

        let existing = self.require_user(user_id).await?;
        let new_email = request.email.map(normalize_optional);
        if let Some(Some(email)) = &new_email
            && existing.email.as_deref() != Some(email.as_str())
        {
            self.ensure_email_free(email, user_id).await?;
        }

        let mut model = existing.into_active_model();
        if let Some(v) = new_email.clone() {
            model.email = Set(v);
        }
        if let Some(v) = request.first_name {
            model.first_name = Set(normalize_optional(v));
        }
        if let Some(v) = request.last_name {
            model.last_name = Set(normalize_optional(v));
        }
        if let Some(v) = request.profile_image_url {
            model.profile_image_url = Set(normalize_optional(v));
        }
        if let Some(v) = request.subscription_tier {
            model.subscription_tier = Set(v);
        }
        if let Some(v) = request.subscription_expiry {
            model.subscription_expiry = Set(v);
        }
        if let Some(v) = request.role {
            model.role = Set(v);
        }
        model.updated_at = Set(Utc::now());

        let updated = model
            .update(self.pool.as_ref())
            .await
            .map_err(|e| map_unique_violation(e, new_email.flatten().as_deref()))?;
        Ok(updated)
    }

    /// Hard-deletes a user. An admin cannot delete their own account.
    pub async fn delete_user(&self, acting_admin_id: &str, user_id: &str) -> AppResult<()> {
        if acting_admin_id == user_id {
            return Err(AppError::ValidationError(
                "You cannot delete your own account".to_string(),
            ));
        }

        let result = users::Entity::delete_by_id(user_id.to_string())
            .exec(self.pool.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        log::info!("User {user_id} deleted by admin {acting_admin_id}");
        Ok(())
    }
}
