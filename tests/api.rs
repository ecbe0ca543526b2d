use std::collections::BTreeMap;
use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use chrono::{TimeZone, Utc};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Transaction};
use serde_json::{Value, json};

use pronos_backend::config::AccessConfig;
use pronos_backend::entities::{access_entity, blog_post_entity, prediction_entity, user_entity};
use pronos_backend::handlers;
use pronos_backend::middlewares::AuthMiddleware;
use pronos_backend::models::{PredictionStatus, SubscriptionTier, UserRole};
use pronos_backend::services::*;
use pronos_backend::utils::{Claims, JwtService};

const SECRET: &str = "integration-secret";

macro_rules! init_app {
    ($db:expr) => {{
        let db: Arc<DatabaseConnection> = $db;
        let access = AccessConfig::default();
        test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(JwtService::new(SECRET)))
                .app_data(handlers::json_config())
                .app_data(handlers::query_config())
                .app_data(handlers::path_config())
                .app_data(web::Data::new(access.clone()))
                .app_data(web::Data::new(UserService::new(db.clone())))
                .app_data(web::Data::new(PredictionService::new(db.clone())))
                .app_data(web::Data::new(AccessService::new(
                    db.clone(),
                    AccessPolicy::new(&access),
                )))
                .app_data(web::Data::new(BlogService::new(db.clone())))
                .app_data(web::Data::new(StatsService::new(db)))
                .configure(handlers::api_config),
        )
        .await
    }};
}

fn bearer(user_id: &str) -> (&'static str, String) {
    let token = JwtService::new(SECRET)
        .sign(&Claims::for_subject(user_id, 3600))
        .unwrap();
    ("Authorization", format!("Bearer {token}"))
}

fn user(id: &str, tier: SubscriptionTier, role: UserRole) -> user_entity::Model {
    let created = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    user_entity::Model {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
        first_name: None,
        last_name: None,
        profile_image_url: None,
        subscription_tier: tier,
        subscription_expiry: None,
        role,
        created_at: created,
        updated_at: created,
    }
}

fn prediction(id: i64, is_premium: bool) -> prediction_entity::Model {
    let created = Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap();
    prediction_entity::Model {
        id,
        match_date: Utc.with_ymd_and_hms(2025, 9, 20, 19, 0, 0).unwrap(),
        team1: "Paris SG".to_string(),
        team2: "Marseille".to_string(),
        venue: Some("Parc des Princes".to_string()),
        championship: "Ligue 1".to_string(),
        prediction_type: "1N2".to_string(),
        prediction: "1".to_string(),
        odds: Some(1.65),
        confidence: Some(4),
        analysis: Some("Home side unbeaten in eight".to_string()),
        status: PredictionStatus::Scheduled,
        actual_result: None,
        is_premium,
        created_at: created,
        updated_at: created,
    }
}

fn blog_post(id: i64, slug: &str, published: bool) -> blog_post_entity::Model {
    let created = Utc.with_ymd_and_hms(2025, 9, 5, 8, 0, 0).unwrap();
    blog_post_entity::Model {
        id,
        title: "Derby preview".to_string(),
        slug: slug.to_string(),
        excerpt: None,
        content: "Form, injuries and the numbers behind our pick.".to_string(),
        category: "analyse".to_string(),
        author: "Admin".to_string(),
        reading_time: Some(5),
        featured_image: None,
        published,
        created_at: created,
        updated_at: created,
    }
}

fn count_row(column: &'static str, n: i64) -> BTreeMap<&'static str, sea_orm::Value> {
    BTreeMap::from([(column, sea_orm::Value::BigInt(Some(n)))])
}

/// Statements the mock connection saw, once the app has released it.
fn executed(db: Arc<DatabaseConnection>) -> Vec<Transaction> {
    match Arc::try_unwrap(db) {
        Ok(db) => db.into_transaction_log(),
        Err(_) => panic!("connection still shared with the app"),
    }
}

fn grant(user_id: &str, prediction_id: i64) -> access_entity::Model {
    access_entity::Model {
        id: 1,
        user_id: user_id.to_string(),
        prediction_id,
        purchased_at: Utc.with_ymd_and_hms(2025, 9, 2, 10, 0, 0).unwrap(),
    }
}

#[actix_web::test]
async fn test_free_prediction_is_public() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![prediction(7, false)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get().uri("/api/predictions/7").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["prediction"], json!("1"));
    assert_eq!(body["data"]["locked"], json!(false));
}

#[actix_web::test]
async fn test_anonymous_premium_prediction_is_forbidden() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![prediction(7, true)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get().uri("/api/predictions/7").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("FORBIDDEN"));
}

#[actix_web::test]
async fn test_free_user_without_grant_is_forbidden() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![prediction(7, true)]])
        .append_query_results([vec![user("u-free", SubscriptionTier::Free, UserRole::User)]])
        .append_query_results([Vec::<access_entity::Model>::new()])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get()
        .uri("/api/predictions/7")
        .insert_header(bearer("u-free"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_free_user_with_grant_sees_premium_prediction() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![prediction(7, true)]])
        .append_query_results([vec![user("u-free", SubscriptionTier::Free, UserRole::User)]])
        .append_query_results([vec![grant("u-free", 7)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get()
        .uri("/api/predictions/7")
        .insert_header(bearer("u-free"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["analysis"], json!("Home side unbeaten in eight"));
}

#[actix_web::test]
async fn test_paid_user_sees_premium_prediction_without_grant() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![prediction(7, true)]])
        .append_query_results([vec![user("u-pro", SubscriptionTier::Pro, UserRole::User)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get()
        .uri("/api/predictions/7")
        .insert_header(bearer("u-pro"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_missing_prediction_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<prediction_entity::Model>::new()])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get().uri("/api/predictions/404").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_listing_locks_premium_entries_for_anonymous() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![prediction(2, true), prediction(1, false)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get().uri("/api/predictions").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0]["locked"], json!(true));
    assert!(items[0].get("prediction").is_none());
    assert_eq!(items[0]["odds"], Value::Null);
    assert_eq!(items[0]["team1"], json!("Paris SG"));

    assert_eq!(items[1]["locked"], json!(false));
    assert_eq!(items[1]["prediction"], json!("1"));
}

#[actix_web::test]
async fn test_invalid_token_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get()
        .uri("/api/predictions")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::try_call_service(&app, req).await;
    let err = resp.err().expect("invalid token must be rejected");
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_upgrade_rejects_unknown_tier() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::post()
        .uri("/api/subscription/upgrade")
        .insert_header(bearer("u-free"))
        .set_json(json!({ "tier": "gold" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], json!("Invalid subscription tier"));
}

#[actix_web::test]
async fn test_upgrade_requires_session() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::post()
        .uri("/api/subscription/upgrade")
        .set_json(json!({ "tier": "pro" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_malformed_json_body_is_bad_request() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::post()
        .uri("/api/subscription/upgrade")
        .insert_header(bearer("u-free"))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{\"tier\":")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_admin_cannot_delete_self() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user("u-admin", SubscriptionTier::Free, UserRole::Admin)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::delete()
        .uri("/api/admin/users/u-admin")
        .insert_header(bearer("u-admin"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_admin_routes_reject_regular_users() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user("u-pro", SubscriptionTier::Pro, UserRole::User)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get()
        .uri("/api/admin/users")
        .insert_header(bearer("u-pro"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get().uri("/api/admin/users").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_create_prediction_requires_admin_by_default() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user("u-free", SubscriptionTier::Free, UserRole::User)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::post()
        .uri("/api/predictions")
        .insert_header(bearer("u-free"))
        .set_json(json!({
            "matchDate": "2025-09-20T19:00:00Z",
            "team1": "Lyon",
            "team2": "Lens",
            "championship": "Ligue 1",
            "predictionType": "1N2",
            "prediction": "X"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_grant_access_twice_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user("u-free", SubscriptionTier::Free, UserRole::User)]])
        .append_query_results([vec![prediction(7, true)]])
        .append_query_results([vec![grant("u-free", 7)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::post()
        .uri("/api/predictions/7/access")
        .insert_header(bearer("u-free"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["message"], json!("Access already granted"));
}

#[actix_web::test]
async fn test_listing_uses_grants_for_free_user() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![prediction(3, true), prediction(2, true), prediction(1, false)]])
        .append_query_results([vec![user("u-free", SubscriptionTier::Free, UserRole::User)]])
        .append_query_results([vec![grant("u-free", 3)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get()
        .uri("/api/predictions")
        .insert_header(bearer("u-free"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let locks: Vec<bool> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["locked"].as_bool().unwrap())
        .collect();
    assert_eq!(locks, vec![false, true, false]);
}

#[actix_web::test]
async fn test_grant_access_returns_created() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user("u-free", SubscriptionTier::Free, UserRole::User)]])
        .append_query_results([vec![prediction(7, true)]])
        .append_query_results([Vec::<access_entity::Model>::new()])
        .append_query_results([vec![grant("u-free", 7)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::post()
        .uri("/api/predictions/7/access")
        .insert_header(bearer("u-free"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["predictionId"], json!(7));
    assert_eq!(body["data"]["userId"], json!("u-free"));
}

#[actix_web::test]
async fn test_update_missing_prediction_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user("u-admin", SubscriptionTier::Free, UserRole::Admin)]])
        .append_query_results([Vec::<prediction_entity::Model>::new()])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::put()
        .uri("/api/predictions/404")
        .insert_header(bearer("u-admin"))
        .set_json(json!({ "status": "won", "actualResult": "2-0" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_non_numeric_prediction_id_is_bad_request() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get().uri("/api/predictions/abc").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
}

#[actix_web::test]
async fn test_draft_post_is_hidden_from_regular_users() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![blog_post(5, "derby-preview", false)]])
        .append_query_results([vec![user("u-pro", SubscriptionTier::Pro, UserRole::User)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get()
        .uri("/api/blog/derby-preview")
        .insert_header(bearer("u-pro"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_draft_post_is_visible_to_admins() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![blog_post(5, "derby-preview", false)]])
        .append_query_results([vec![user("u-admin", SubscriptionTier::Free, UserRole::Admin)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get()
        .uri("/api/blog/derby-preview")
        .insert_header(bearer("u-admin"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_drafts_listing_ignored_for_regular_users() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user("u-pro", SubscriptionTier::Pro, UserRole::User)]])
            .append_query_results([vec![blog_post(1, "derby-preview", true)]])
            .into_connection(),
    );
    let app = init_app!(db.clone());

    let req = test::TestRequest::get()
        .uri("/api/blog?published=false")
        .insert_header(bearer("u-pro"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    drop(resp);
    drop(app);

    let log = executed(db);
    let listing = format!("{:?}", log.last().unwrap());
    assert!(listing.contains("WHERE"), "published filter missing: {listing}");
}

#[actix_web::test]
async fn test_drafts_listing_honoured_for_admins() {
    let db = Arc::new(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![user("u-admin", SubscriptionTier::Free, UserRole::Admin)]])
            .append_query_results([vec![
                blog_post(2, "team-news", false),
                blog_post(1, "derby-preview", true),
            ]])
            .into_connection(),
    );
    let app = init_app!(db.clone());

    let req = test::TestRequest::get()
        .uri("/api/blog?published=false")
        .insert_header(bearer("u-admin"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    drop(app);

    let log = executed(db);
    let listing = format!("{:?}", log.last().unwrap());
    assert!(!listing.contains("WHERE"), "drafts were filtered: {listing}");
}

#[actix_web::test]
async fn test_stats_reports_accuracy_and_counters() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[count_row("num_items", 3)]])
        .append_query_results([[count_row("num_items", 1)]])
        .append_query_results([[count_row("num_items", 10)]])
        .append_query_results([[count_row("num_items", 4)]])
        .append_query_results([[count_row("count", 2)]])
        .into_connection();
    let app = init_app!(Arc::new(db));

    let req = test::TestRequest::get().uri("/api/stats").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["data"],
        json!({ "accuracy": 75, "totalPredictions": 10, "activeUsers": 4, "leagues": 2 })
    );
}
