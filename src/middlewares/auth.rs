use crate::entities::user_entity;
use crate::error::AppError;
use crate::models::UpsertUser;
use crate::services::UserService;
use crate::utils::{Claims, JwtService};
use actix_web::dev::Payload;
use actix_web::http::Method;
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, web,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

// Paths that never look at the Authorization header
const SKIPPED_PREFIXES: &[&str] = &["/swagger-ui", "/api-docs/"];

/// Authenticated caller, attached to the request by [`AuthMiddleware`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub claims: Claims,
}

impl Principal {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            claims,
        }
    }

    /// Identity fields to store for this caller.
    pub fn identity(&self) -> UpsertUser {
        UpsertUser {
            id: self.user_id.clone(),
            email: self.claims.email.clone(),
            first_name: self.claims.first_name.clone(),
            last_name: self.claims.last_name.clone(),
            profile_image_url: self.claims.profile_image_url.clone(),
        }
    }
}

/// Extractor for routes that require a session. Responds 401 when absent.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Principal>()
                .cloned()
                .map(CurrentUser)
                .ok_or_else(|| AppError::AuthError("Authentication required".to_string())),
        )
    }
}

/// Extractor for public routes whose answer depends on who is asking.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Principal>);

impl MaybeUser {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(|p| p.user_id.as_str())
    }
}

impl FromRequest for MaybeUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(MaybeUser(req.extensions().get::<Principal>().cloned())))
    }
}

/// Extractor for admin-only routes: the session user must exist in the store
/// with the admin role. 401 without a session, 403 otherwise.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user_entity::Model);

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let principal = req.extensions().get::<Principal>().cloned();
        let user_service = req.app_data::<web::Data<UserService>>().cloned();

        Box::pin(async move {
            let principal = principal
                .ok_or_else(|| AppError::AuthError("Authentication required".to_string()))?;
            let user_service = user_service
                .ok_or_else(|| AppError::InternalError("UserService is not registered".to_string()))?;
            let admin = user_service.require_admin(&principal.user_id).await?;
            Ok(AdminUser(admin))
        })
    }
}

/// Verifies bearer tokens and attaches the [`Principal`]. Requests without a
/// token pass through anonymously; route extractors decide whether that is
/// acceptable. A token that fails verification is always rejected.
pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight
        if req.method() == Method::OPTIONS {
            return Box::pin(self.service.call(req));
        }

        let path = req.path();
        if SKIPPED_PREFIXES.iter().any(|p| path.starts_with(p)) {
            return Box::pin(self.service.call(req));
        }

        let verified = bearer_token(&req).map(|token| self.jwt_service.verify_session_token(token));

        match verified {
            None => Box::pin(self.service.call(req)),
            Some(Ok(claims)) => {
                req.extensions_mut().insert(Principal::from_claims(claims));
                Box::pin(self.service.call(req))
            }
            Some(Err(e)) => {
                log::debug!("Rejected bearer token: {e}");
                let error = AppError::AuthError("Invalid access token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}
