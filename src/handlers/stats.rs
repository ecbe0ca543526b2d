use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::models::*;
use crate::services::StatsService;

#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Headline counters for the landing page", body = StatsResponse)
    )
)]
pub async fn get_stats(stats_service: web::Data<StatsService>) -> Result<HttpResponse> {
    match stats_service.get_stats().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(stats))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn stats_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/stats", web::get().to(get_stats));
}
