use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Share of resolved predictions that were won, in whole percent
    pub accuracy: i64,
    pub total_predictions: i64,
    pub active_users: i64,
    /// Distinct championships covered
    pub leagues: i64,
}
