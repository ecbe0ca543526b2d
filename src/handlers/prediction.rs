use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::config::AccessConfig;
use crate::handlers::authorize_content_write;
use crate::middlewares::{CurrentUser, MaybeUser};
use crate::models::*;
use crate::services::{AccessService, PredictionService, UserService};

#[utoipa::path(
    get,
    path = "/predictions",
    tag = "predictions",
    params(PredictionQuery),
    responses(
        (status = 200, description = "Predictions, most recent match first. Premium entries the caller cannot open are locked", body = [PredictionResponse]),
        (status = 400, description = "Invalid query parameters")
    )
)]
pub async fn list_predictions(
    prediction_service: web::Data<PredictionService>,
    access_service: web::Data<AccessService>,
    query: web::Query<PredictionQuery>,
    user: MaybeUser,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    let models = match prediction_service
        .list_predictions(query.premium, query.limit)
        .await
    {
        Ok(models) => models,
        Err(e) => return Ok(e.error_response()),
    };

    match access_service
        .present_predictions(user.user_id(), models)
        .await
    {
        Ok(predictions) => Ok(HttpResponse::Ok().json(ApiResponse::success(predictions))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/predictions/{id}",
    tag = "predictions",
    params(
        ("id" = i64, Path, description = "Prediction id")
    ),
    responses(
        (status = 200, description = "Full prediction", body = PredictionResponse),
        (status = 403, description = "Premium subscription required"),
        (status = 404, description = "Prediction not found")
    )
)]
pub async fn get_prediction(
    prediction_service: web::Data<PredictionService>,
    access_service: web::Data<AccessService>,
    path: web::Path<i64>,
    user: MaybeUser,
) -> Result<HttpResponse> {
    let prediction = match prediction_service.require_prediction(path.into_inner()).await {
        Ok(prediction) => prediction,
        Err(e) => return Ok(e.error_response()),
    };

    match access_service
        .view_prediction(user.user_id(), prediction)
        .await
    {
        Ok(prediction) => Ok(HttpResponse::Ok().json(ApiResponse::success(prediction))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/predictions",
    tag = "predictions",
    request_body = CreatePredictionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Prediction created", body = PredictionResponse),
        (status = 400, description = "Invalid prediction"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn create_prediction(
    prediction_service: web::Data<PredictionService>,
    user_service: web::Data<UserService>,
    access: web::Data<AccessConfig>,
    user: CurrentUser,
    request: web::Json<CreatePredictionRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = authorize_content_write(&access, &user_service, &user.0).await {
        return Ok(e.error_response());
    }

    match prediction_service
        .create_prediction(request.into_inner())
        .await
    {
        Ok(prediction) => Ok(HttpResponse::Created()
            .json(ApiResponse::success(PredictionResponse::from(prediction)))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/predictions/{id}",
    tag = "predictions",
    params(
        ("id" = i64, Path, description = "Prediction id")
    ),
    request_body = UpdatePredictionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Prediction updated", body = PredictionResponse),
        (status = 400, description = "Invalid update"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Prediction not found")
    )
)]
pub async fn update_prediction(
    prediction_service: web::Data<PredictionService>,
    user_service: web::Data<UserService>,
    access: web::Data<AccessConfig>,
    user: CurrentUser,
    path: web::Path<i64>,
    request: web::Json<UpdatePredictionRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = authorize_content_write(&access, &user_service, &user.0).await {
        return Ok(e.error_response());
    }

    match prediction_service
        .update_prediction(path.into_inner(), request.into_inner())
        .await
    {
        Ok(prediction) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(PredictionResponse::from(prediction))))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/predictions/{id}/access",
    tag = "predictions",
    params(
        ("id" = i64, Path, description = "Prediction id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Access granted", body = PredictionAccessResponse),
        (status = 400, description = "Access already granted"),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Prediction not found")
    )
)]
pub async fn purchase_access(
    access_service: web::Data<AccessService>,
    user_service: web::Data<UserService>,
    user: CurrentUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let buyer = match user_service.ensure_user(user.0.identity()).await {
        Ok(buyer) => buyer,
        Err(e) => return Ok(e.error_response()),
    };

    match access_service.grant_access(&buyer.id, path.into_inner()).await {
        Ok(grant) => Ok(HttpResponse::Created().json(ApiResponse::success(
            PredictionAccessResponse::from(grant),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn prediction_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/predictions")
            .route("", web::get().to(list_predictions))
            .route("", web::post().to(create_prediction))
            .route("/{id}", web::get().to(get_prediction))
            .route("/{id}", web::put().to(update_prediction))
            .route("/{id}/access", web::post().to(purchase_access)),
    );
}
