use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::error::FieldError;
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::get_current_user,
        handlers::prediction::list_predictions,
        handlers::prediction::get_prediction,
        handlers::prediction::create_prediction,
        handlers::prediction::update_prediction,
        handlers::prediction::purchase_access,
        handlers::blog::list_posts,
        handlers::blog::get_post,
        handlers::blog::create_post,
        handlers::stats::get_stats,
        handlers::subscription::upgrade_subscription,
        handlers::admin::list_users,
        handlers::admin::get_user,
        handlers::admin::update_user,
        handlers::admin::delete_user,
        handlers::admin::delete_prediction,
        handlers::admin::update_blog_post,
        handlers::admin::delete_blog_post,
    ),
    components(
        schemas(
            UserResponse,
            UpdateUserRequest,
            UpgradeSubscriptionRequest,
            SubscriptionTier,
            UserRole,
            PredictionResponse,
            CreatePredictionRequest,
            UpdatePredictionRequest,
            PredictionStatus,
            PredictionAccessResponse,
            BlogPostResponse,
            CreateBlogPostRequest,
            UpdateBlogPostRequest,
            StatsResponse,
            FieldError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Session profile API"),
        (name = "predictions", description = "Match predictions and premium access"),
        (name = "blog", description = "Blog API"),
        (name = "stats", description = "Public statistics"),
        (name = "subscription", description = "Subscription API"),
        (name = "admin", description = "Back-office API"),
    ),
    info(
        title = "Pronos Backend API",
        version = "1.0.0",
        description = "Sports prediction subscription REST API"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
