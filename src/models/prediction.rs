use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::prediction_entity;
use crate::error::AppResult;
use crate::models::double_option;
use crate::utils::FieldErrors;

pub use crate::entities::predictions::PredictionStatus;

/// Highest odds accepted for a published pick.
pub const MAX_ODDS: f64 = 99.99;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PredictionQuery {
    /// Only premium (`true`) or only free (`false`) predictions; both when omitted
    pub premium: Option<bool>,
    /// Maximum number of predictions (default 50)
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePredictionRequest {
    pub match_date: DateTime<Utc>,
    #[schema(example = "Paris SG")]
    pub team1: String,
    #[schema(example = "Olympique de Marseille")]
    pub team2: String,
    pub venue: Option<String>,
    #[schema(example = "Ligue 1")]
    pub championship: String,
    #[schema(example = "1N2")]
    pub prediction_type: String,
    #[schema(example = "1")]
    pub prediction: String,
    #[schema(example = 1.85)]
    pub odds: Option<f64>,
    #[schema(example = 4)]
    pub confidence: Option<i32>,
    pub analysis: Option<String>,
    pub status: Option<PredictionStatus>,
    pub actual_result: Option<String>,
    pub is_premium: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePredictionRequest {
    pub match_date: Option<DateTime<Utc>>,
    pub team1: Option<String>,
    pub team2: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub venue: Option<Option<String>>,
    pub championship: Option<String>,
    pub prediction_type: Option<String>,
    pub prediction: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub odds: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub confidence: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub analysis: Option<Option<String>>,
    pub status: Option<PredictionStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub actual_result: Option<Option<String>>,
    pub is_premium: Option<bool>,
}

fn check_odds(errors: &mut FieldErrors, odds: Option<f64>) {
    if let Some(o) = odds
        && !(o.is_finite() && o > 0.0 && o <= MAX_ODDS)
    {
        errors.add("odds", "must be a positive number no greater than 99.99");
    }
}

fn check_confidence(errors: &mut FieldErrors, confidence: Option<i32>) {
    if let Some(c) = confidence
        && !(1..=5).contains(&c)
    {
        errors.add("confidence", "must be between 1 and 5");
    }
}

impl CreatePredictionRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        errors.require_text("team1", &self.team1);
        errors.require_text("team2", &self.team2);
        errors.require_text("championship", &self.championship);
        errors.require_text("predictionType", &self.prediction_type);
        errors.require_text("prediction", &self.prediction);
        check_odds(&mut errors, self.odds);
        check_confidence(&mut errors, self.confidence);
        errors.into_result()
    }
}

impl UpdatePredictionRequest {
    pub fn is_empty(&self) -> bool {
        self.match_date.is_none()
            && self.team1.is_none()
            && self.team2.is_none()
            && self.venue.is_none()
            && self.championship.is_none()
            && self.prediction_type.is_none()
            && self.prediction.is_none()
            && self.odds.is_none()
            && self.confidence.is_none()
            && self.analysis.is_none()
            && self.status.is_none()
            && self.actual_result.is_none()
            && self.is_premium.is_none()
    }

    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        if self.is_empty() {
            errors.add("body", "no fields to update");
        }
        errors.require_text_if_set("team1", self.team1.as_ref());
        errors.require_text_if_set("team2", self.team2.as_ref());
        errors.require_text_if_set("championship", self.championship.as_ref());
        errors.require_text_if_set("predictionType", self.prediction_type.as_ref());
        errors.require_text_if_set("prediction", self.prediction.as_ref());
        check_odds(&mut errors, self.odds.flatten());
        check_confidence(&mut errors, self.confidence.flatten());
        errors.into_result()
    }
}

/// A prediction as served to a requester. When `locked` is set the requester may
/// only see the match metadata; the pick, odds, analysis and result are withheld.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub id: i64,
    pub match_date: DateTime<Utc>,
    pub team1: String,
    pub team2: String,
    pub venue: Option<String>,
    pub championship: String,
    pub prediction_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
    pub odds: Option<f64>,
    pub confidence: Option<i32>,
    pub analysis: Option<String>,
    pub status: PredictionStatus,
    pub actual_result: Option<String>,
    pub is_premium: bool,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PredictionResponse {
    pub fn locked(m: prediction_entity::Model) -> Self {
        let mut resp = Self::from(m);
        resp.prediction = None;
        resp.odds = None;
        resp.analysis = None;
        resp.actual_result = None;
        resp.locked = true;
        resp
    }
}

impl From<prediction_entity::Model> for PredictionResponse {
    fn from(m: prediction_entity::Model) -> Self {
        Self {
            id: m.id,
            match_date: m.match_date,
            team1: m.team1,
            team2: m.team2,
            venue: m.venue,
            championship: m.championship,
            prediction_type: m.prediction_type,
            prediction: Some(m.prediction),
            odds: m.odds,
            confidence: m.confidence,
            analysis: m.analysis,
            status: m.status,
            actual_result: m.actual_result,
            is_premium: m.is_premium,
            locked: false,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
