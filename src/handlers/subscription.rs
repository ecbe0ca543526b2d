use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::middlewares::CurrentUser;
use crate::models::*;
use crate::services::UserService;

#[utoipa::path(
    post,
    path = "/subscription/upgrade",
    tag = "subscription",
    request_body = UpgradeSubscriptionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Subscription upgraded for one month", body = UserResponse),
        (status = 400, description = "Invalid subscription tier"),
        (status = 401, description = "No valid session")
    )
)]
pub async fn upgrade_subscription(
    user_service: web::Data<UserService>,
    user: CurrentUser,
    request: web::Json<UpgradeSubscriptionRequest>,
) -> Result<HttpResponse> {
    let tier = match request.target_tier() {
        Ok(tier) => tier,
        Err(e) => return Ok(e.error_response()),
    };

    match user_service
        .upgrade_subscription(user.0.identity(), tier)
        .await
    {
        Ok(updated) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            UserResponse::from(updated),
            "Subscription upgraded successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn subscription_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/subscription").route("/upgrade", web::post().to(upgrade_subscription)),
    );
}
