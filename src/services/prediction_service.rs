use std::sync::Arc;

use crate::entities::prediction_entity as predictions;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{DEFAULT_PREDICTION_LIMIT, resolve_limit};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct PredictionService {
    pool: Arc<DatabaseConnection>,
}

impl PredictionService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    /// Most recent matches first, optionally restricted to premium or free predictions.
    pub async fn list_predictions(
        &self,
        premium: Option<bool>,
        limit: Option<i64>,
    ) -> AppResult<Vec<predictions::Model>> {
        let mut query = predictions::Entity::find();
        if let Some(is_premium) = premium {
            query = query.filter(predictions::Column::IsPremium.eq(is_premium));
        }

        let models = query
            .order_by_desc(predictions::Column::MatchDate)
            .limit(resolve_limit(limit, DEFAULT_PREDICTION_LIMIT))
            .all(self.pool.as_ref())
            .await?;
        Ok(models)
    }

    pub async fn get_prediction(&self, id: i64) -> AppResult<Option<predictions::Model>> {
        Ok(predictions::Entity::find_by_id(id).one(self.pool.as_ref()).await?)
    }

    pub async fn require_prediction(&self, id: i64) -> AppResult<predictions::Model> {
        self.get_prediction(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Prediction not found".to_string()))
    }

    pub async fn create_prediction(
        &self,
        request: CreatePredictionRequest,
    ) -> AppResult<predictions::Model> {
        request.validate()?;

        let now = Utc::now();
        let model = predictions::ActiveModel {
            match_date: Set(request.match_date),
            team1: Set(request.team1.trim().to_string()),
            team2: Set(request.team2.trim().to_string()),
            venue: Set(normalize_optional(request.venue)),
            championship: Set(request.championship.trim().to_string()),
            prediction_type: Set(request.prediction_type.trim().to_string()),
            prediction: Set(request.prediction.trim().to_string()),
            odds: Set(request.odds),
            confidence: Set(request.confidence),
            analysis: Set(normalize_optional(request.analysis)),
            status: Set(request.status.unwrap_or(PredictionStatus::Scheduled)),
            actual_result: Set(normalize_optional(request.actual_result)),
            is_premium: Set(request.is_premium.unwrap_or(false)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await?;

        log::info!(
            "Prediction {} created: {} vs {} ({})",
            model.id,
            model.team1,
            model.team2,
            model.championship
        );
        Ok(model)
    }

    /// Applies only the fields present in the request. Status changes follow the
    /// scheduled -> ongoing -> won/lost lifecycle by convention only; any valid
    /// status may be written.
    pub async fn update_prediction(
        &self,
        id: i64,
        request: UpdatePredictionRequest,
    ) -> AppResult<predictions::Model> {
        request.validate()?;

        let existing = self.require_prediction(id).await?;
        let previous_status = existing.status;
        let mut model = existing.into_active_model();

        if let Some(v) = request.match_date {
            model.match_date = Set(v);
        }
        if let Some(v) = request.team1 {
            model.team1 = Set(v.trim().to_string());
        }
        if let Some(v) = request.team2 {
            model.team2 = Set(v.trim().to_string());
        }
        if let Some(v) = request.venue {
            model.venue = Set(normalize_optional(v));
        }
        if let Some(v) = request.championship {
            model.championship = Set(v.trim().to_string());
        }
        if let Some(v) = request.prediction_type {
            model.prediction_type = Set(v.trim().to_string());
        }
        if let Some(v) = request.prediction {
            model.prediction = Set(v.trim().to_string());
        }
        if let Some(v) = request.odds {
            model.odds = Set(v);
        }
        if let Some(v) = request.confidence {
            model.confidence = Set(v);
        }
        if let Some(v) = request.analysis {
            model.analysis = Set(normalize_optional(v));
        }
        if let Some(v) = request.status {
            model.status = Set(v);
        }
        if let Some(v) = request.actual_result {
            model.actual_result = Set(normalize_optional(v));
        }
        if let Some(v) = request.is_premium {
            model.is_premium = Set(v);
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(self.pool.as_ref()).await?;
        if updated.status != previous_status {
            log::info!(
                "Prediction {} status {:?} -> {:?}",
                updated.id,
                previous_status,
                updated.status
            );
        }
        Ok(updated)
    }

    pub async fn delete_prediction(&self, id: i64) -> AppResult<()> {
        let result = predictions::Entity::delete_by_id(id)
            .exec(self.pool.as_ref())
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Prediction not found".to_string()));
        }
        log::info!("Prediction {id} deleted");
        Ok(())
    }
}
