use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::middlewares::CurrentUser;
use crate::models::*;
use crate::services::UserService;

#[utoipa::path(
    get,
    path = "/auth/user",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile of the signed-in user", body = UserResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_current_user(
    user_service: web::Data<UserService>,
    user: CurrentUser,
) -> Result<HttpResponse> {
    match user_service.ensure_user(user.0.identity()).await {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(UserResponse::from(user)))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/auth").route("/user", web::get().to(get_current_user)));
}
