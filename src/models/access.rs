use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::access_entity;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionAccessResponse {
    pub id: i64,
    pub user_id: String,
    pub prediction_id: i64,
    pub purchased_at: DateTime<Utc>,
}

impl From<access_entity::Model> for PredictionAccessResponse {
    fn from(m: access_entity::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            prediction_id: m.prediction_id,
            purchased_at: m.purchased_at,
        }
    }
}
