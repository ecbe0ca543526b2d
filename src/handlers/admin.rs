use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::middlewares::AdminUser;
use crate::models::*;
use crate::services::{BlogService, PredictionService, UserService};

#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(UserListQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Users, newest first", body = [UserResponse]),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_users(
    user_service: web::Data<UserService>,
    _admin: AdminUser,
    query: web::Query<UserListQuery>,
) -> Result<HttpResponse> {
    match user_service.list_users(query.limit).await {
        Ok(users) => {
            let users: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
            Ok(HttpResponse::Ok().json(ApiResponse::success(users)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/admin/users/{id}",
    tag = "admin",
    params(
        ("id" = String, Path, description = "User id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    user_service: web::Data<UserService>,
    _admin: AdminUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match user_service.require_user(&path.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Ok().json(ApiResponse::success(UserResponse::from(user)))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/users/{id}",
    tag = "admin",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = UpdateUserRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid update"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    user_service: web::Data<UserService>,
    admin: AdminUser,
    path: web::Path<String>,
    request: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();
    match user_service.update_user(&user_id, request.into_inner()).await {
        Ok(updated) => {
            log::info!("User {} updated by admin {}", user_id, admin.0.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(UserResponse::from(updated))))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    tag = "admin",
    params(
        ("id" = String, Path, description = "User id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "Admins cannot delete themselves"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    user_service: web::Data<UserService>,
    admin: AdminUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match user_service.delete_user(&admin.0.id, &path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("User deleted successfully"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/predictions/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Prediction id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Prediction deleted"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Prediction not found")
    )
)]
pub async fn delete_prediction(
    prediction_service: web::Data<PredictionService>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match prediction_service.delete_prediction(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("Prediction deleted successfully"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/admin/blog/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Blog post id")
    ),
    request_body = UpdateBlogPostRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Blog post updated", body = BlogPostResponse),
        (status = 400, description = "Invalid update"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Blog post not found"),
        (status = 409, description = "Slug already in use")
    )
)]
pub async fn update_blog_post(
    blog_service: web::Data<BlogService>,
    _admin: AdminUser,
    path: web::Path<i64>,
    request: web::Json<UpdateBlogPostRequest>,
) -> Result<HttpResponse> {
    match blog_service
        .update_post(path.into_inner(), request.into_inner())
        .await
    {
        Ok(post) => Ok(HttpResponse::Ok().json(ApiResponse::success(BlogPostResponse::from(post)))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/admin/blog/{id}",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "Blog post id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Blog post deleted"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Blog post not found")
    )
)]
pub async fn delete_blog_post(
    blog_service: web::Data<BlogService>,
    _admin: AdminUser,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match blog_service.delete_post(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("Blog post deleted successfully"))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/users", web::get().to(list_users))
            .route("/users/{id}", web::get().to(get_user))
            .route("/users/{id}", web::put().to(update_user))
            .route("/users/{id}", web::delete().to(delete_user))
            .route("/predictions/{id}", web::delete().to(delete_prediction))
            .route("/blog/{id}", web::put().to(update_blog_post))
            .route("/blog/{id}", web::delete().to(delete_blog_post)),
    );
}
