use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::config::AccessConfig;
use crate::entities::blog_post_entity;
use crate::error::{AppError, AppResult};
use crate::handlers::authorize_content_write;
use crate::middlewares::{CurrentUser, MaybeUser};
use crate::models::*;
use crate::services::{BlogService, UserService};

async fn is_admin(user_service: &UserService, user_id: Option<&str>) -> AppResult<bool> {
    match user_id {
        Some(id) => Ok(user_service
            .get_user(id)
            .await?
            .is_some_and(|u| u.is_admin())),
        None => Ok(false),
    }
}

/// Drafts look missing to anyone but an admin.
async fn find_visible_post(
    blog_service: &BlogService,
    user_service: &UserService,
    slug: &str,
    user: &CurrentUser,
) -> AppResult<blog_post_entity::Model> {
    let not_found = || AppError::NotFound("Blog post not found".to_string());

    let post = blog_service
        .get_post_by_slug(slug)
        .await?
        .ok_or_else(not_found)?;
    if !post.published && !is_admin(user_service, Some(user.0.user_id.as_str())).await? {
        return Err(not_found());
    }
    Ok(post)
}

#[utoipa::path(
    get,
    path = "/blog",
    tag = "blog",
    params(BlogQuery),
    responses(
        (status = 200, description = "Blog posts, newest first", body = [BlogPostResponse]),
        (status = 400, description = "Invalid query parameters")
    )
)]
pub async fn list_posts(
    blog_service: web::Data<BlogService>,
    user_service: web::Data<UserService>,
    query: web::Query<BlogQuery>,
    user: MaybeUser,
) -> Result<HttpResponse> {
    let query = query.into_inner();
    // drafts stay hidden from everyone but admins
    let published_only = match query.published {
        Some(false) => match is_admin(&user_service, user.user_id()).await {
            Ok(admin) => !admin,
            Err(e) => return Ok(e.error_response()),
        },
        _ => true,
    };

    match blog_service.list_posts(published_only, query.limit).await {
        Ok(posts) => {
            let posts: Vec<BlogPostResponse> =
                posts.into_iter().map(BlogPostResponse::from).collect();
            Ok(HttpResponse::Ok().json(ApiResponse::success(posts)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/blog/{slug}",
    tag = "blog",
    params(
        ("slug" = String, Path, description = "Post slug")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Blog post", body = BlogPostResponse),
        (status = 401, description = "No valid session"),
        (status = 404, description = "Blog post not found")
    )
)]
pub async fn get_post(
    blog_service: web::Data<BlogService>,
    user_service: web::Data<UserService>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match find_visible_post(&blog_service, &user_service, &path.into_inner(), &user).await {
        Ok(post) => Ok(HttpResponse::Ok().json(ApiResponse::success(BlogPostResponse::from(post)))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/blog",
    tag = "blog",
    request_body = CreateBlogPostRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Blog post created", body = BlogPostResponse),
        (status = 400, description = "Invalid blog post"),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "Slug already in use")
    )
)]
pub async fn create_post(
    blog_service: web::Data<BlogService>,
    user_service: web::Data<UserService>,
    access: web::Data<AccessConfig>,
    user: CurrentUser,
    request: web::Json<CreateBlogPostRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = authorize_content_write(&access, &user_service, &user.0).await {
        return Ok(e.error_response());
    }

    match blog_service.create_post(request.into_inner()).await {
        Ok(post) => Ok(HttpResponse::Created().json(ApiResponse::success(BlogPostResponse::from(post)))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn blog_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/blog")
            .route("", web::get().to(list_posts))
            .route("", web::post().to(create_post))
            .route("/{slug}", web::get().to(get_post)),
    );
}
