use std::sync::Arc;

use crate::entities::{prediction_entity as predictions, user_entity as users};
use crate::error::AppResult;
use crate::models::*;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QuerySelect,
};

/// Whole-percent win rate over resolved predictions; 0 when nothing is resolved yet.
pub fn accuracy_percent(won: u64, lost: u64) -> i64 {
    let resolved = won + lost;
    if resolved == 0 {
        return 0;
    }
    ((won as f64 / resolved as f64) * 100.0).round() as i64
}

#[derive(Clone)]
pub struct StatsService {
    pool: Arc<DatabaseConnection>,
}

impl StatsService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    async fn count_with_status(&self, status: PredictionStatus) -> AppResult<u64> {
        Ok(predictions::Entity::find()
            .filter(predictions::Column::Status.eq(status))
            .count(self.pool.as_ref())
            .await?)
    }

    pub async fn get_stats(&self) -> AppResult<StatsResponse> {
        let won = self.count_with_status(PredictionStatus::Won).await?;
        let lost = self.count_with_status(PredictionStatus::Lost).await?;

        let total_predictions = predictions::Entity::find().count(self.pool.as_ref()).await?;
        let active_users = users::Entity::find().count(self.pool.as_ref()).await?;

        #[derive(Debug, FromQueryResult)]
        struct CountRow {
            count: i64,
        }
        let leagues = predictions::Entity::find()
            .select_only()
            .column_as(Expr::cust("COUNT(DISTINCT championship)"), "count")
            .into_model::<CountRow>()
            .one(self.pool.as_ref())
            .await?
            .map(|r| r.count)
            .unwrap_or(0);

        Ok(StatsResponse {
            accuracy: accuracy_percent(won, lost),
            total_predictions: total_predictions as i64,
            active_users: active_users as i64,
            leagues,
        })
    }
}
