use std::collections::HashSet;
use std::sync::Arc;

use crate::entities::{
    access_entity as access, prediction_entity as predictions, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{AccessDecision, AccessPolicy};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};

/// Applies the premium visibility rule against stored users and access grants.
#[derive(Clone)]
pub struct AccessService {
    pool: Arc<DatabaseConnection>,
    policy: AccessPolicy,
}

fn already_granted() -> AppError {
    AppError::ValidationError("Access already granted".to_string())
}

impl AccessService {
    pub fn new(pool: Arc<DatabaseConnection>, policy: AccessPolicy) -> Self {
        Self { pool, policy }
    }

    /// Resolves the requesting user row; unknown or anonymous callers yield `None`.
    pub async fn load_viewer(&self, user_id: Option<&str>) -> AppResult<Option<users::Model>> {
        match user_id {
            Some(id) => Ok(users::Entity::find_by_id(id.to_string())
                .one(self.pool.as_ref())
                .await?),
            None => Ok(None),
        }
    }

    pub async fn find_grant(
        &self,
        user_id: &str,
        prediction_id: i64,
    ) -> AppResult<Option<access::Model>> {
        let grant = access::Entity::find()
            .filter(access::Column::UserId.eq(user_id))
            .filter(access::Column::PredictionId.eq(prediction_id))
            .one(self.pool.as_ref())
            .await?;
        Ok(grant)
    }

    /// Full visibility check for one prediction. The grant table is only queried
    /// when the tier alone does not decide.
    pub async fn can_view_prediction(
        &self,
        user: Option<&users::Model>,
        prediction: &predictions::Model,
    ) -> AppResult<bool> {
        let now = Utc::now();
        match (self.policy.decide(user, prediction, now), user) {
            (AccessDecision::NeedsGrant, Some(u)) => {
                let has_grant = self.find_grant(&u.id, prediction.id).await?.is_some();
                Ok(self
                    .policy
                    .can_view_prediction(user, prediction, has_grant, now))
            }
            (decision, _) => Ok(decision == AccessDecision::Allowed),
        }
    }

    /// Returns the prediction if the viewer may see its detail, 403 otherwise.
    pub async fn view_prediction(
        &self,
        user_id: Option<&str>,
        prediction: predictions::Model,
    ) -> AppResult<PredictionResponse> {
        let viewer = if prediction.is_premium {
            self.load_viewer(user_id).await?
        } else {
            None
        };

        if !self.can_view_prediction(viewer.as_ref(), &prediction).await? {
            log::info!(
                "Premium prediction {} denied to {}",
                prediction.id,
                user_id.unwrap_or("anonymous")
            );
            return Err(AppError::Forbidden(
                "Premium subscription required".to_string(),
            ));
        }
        Ok(PredictionResponse::from(prediction))
    }

    /// Shapes a listing for the viewer: premium entries they cannot open are locked.
    pub async fn present_predictions(
        &self,
        user_id: Option<&str>,
        models: Vec<predictions::Model>,
    ) -> AppResult<Vec<PredictionResponse>> {
        if !models.iter().any(|m| m.is_premium) {
            return Ok(models.into_iter().map(PredictionResponse::from).collect());
        }

        let viewer = self.load_viewer(user_id).await?;
        let now = Utc::now();

        let needs_grant: Vec<i64> = models
            .iter()
            .filter(|m| self.policy.decide(viewer.as_ref(), m, now) == AccessDecision::NeedsGrant)
            .map(|m| m.id)
            .collect();
        let granted = match (&viewer, needs_grant.is_empty()) {
            (Some(u), false) => self.granted_ids(&u.id, needs_grant).await?,
            _ => HashSet::new(),
        };

        Ok(models
            .into_iter()
            .map(|m| {
                let has_grant = granted.contains(&m.id);
                if self
                    .policy
                    .can_view_prediction(viewer.as_ref(), &m, has_grant, now)
                {
                    PredictionResponse::from(m)
                } else {
                    PredictionResponse::locked(m)
                }
            })
            .collect())
    }

    async fn granted_ids(&self, user_id: &str, prediction_ids: Vec<i64>) -> AppResult<HashSet<i64>> {
        let grants = access::Entity::find()
            .filter(access::Column::UserId.eq(user_id))
            .filter(access::Column::PredictionId.is_in(prediction_ids))
            .all(self.pool.as_ref())
            .await?;
        Ok(grants.into_iter().map(|g| g.prediction_id).collect())
    }

    /// Records a one-off grant for the caller. Fails with 404 for an unknown
    /// prediction and 400 when the pair already has a grant.
    pub async fn grant_access(&self, user_id: &str, prediction_id: i64) -> AppResult<access::Model> {
        if predictions::Entity::find_by_id(prediction_id)
            .one(self.pool.as_ref())
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Prediction not found".to_string()));
        }

        if self.find_grant(user_id, prediction_id).await?.is_some() {
            return Err(already_granted());
        }

        let grant = access::ActiveModel {
            user_id: Set(user_id.to_string()),
            prediction_id: Set(prediction_id),
            purchased_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await
        .map_err(|e: DbErr| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => already_granted(),
            _ => AppError::DatabaseError(e),
        })?;

        log::info!("User {user_id} granted access to prediction {prediction_id}");
        Ok(grant)
    }
}
