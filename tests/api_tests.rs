use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use forgefit::api::AppState;
use forgefit::config::Config;
use forgefit::db::NewExercise;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const WEBHOOK_SECRET: &str = "whsec_test_secret";

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.billing.stripe_webhook_secret = WEBHOOK_SECRET.to_string();

    let state = forgefit::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let app = forgefit::api::router(state.clone()).await;

    (app, state)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json");

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn response_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Registers an account and returns the `data` object of the auth response
/// (user, access_token, refresh_token).
async fn register(app: &Router, username: &str, email: &str, password: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            serde_json::json!({
                "email": email,
                "username": username,
                "password": password,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    body["data"].clone()
}

async fn promote_to_superuser(state: &AppState, user_id: &str) {
    use forgefit::entities::users;
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};

    let id = Uuid::parse_str(user_id).unwrap();
    let model = users::Entity::find_by_id(id)
        .one(&state.store().conn)
        .await
        .unwrap()
        .expect("user should exist");

    let mut active: users::ActiveModel = model.into();
    active.is_superuser = Set(true);
    active.update(&state.store().conn).await.unwrap();
}

/// Seeds a built-in exercise directly through the store so free-tier tests
/// have something to build workouts from.
async fn seed_exercise(state: &AppState, name: &str) -> Uuid {
    let categories = state.store().list_exercise_categories().await.unwrap();
    let category_id = categories.first().expect("categories seeded").id;

    let exercise = state
        .store()
        .create_exercise(NewExercise {
            name: name.to_string(),
            description: None,
            instructions: None,
            difficulty: "beginner".to_string(),
            mechanics: None,
            is_bodyweight: true,
            unilateral: false,
            video_url: None,
            is_custom: false,
            created_by: None,
            category_id,
            notes: None,
            muscle_group_ids: vec![],
            equipment_ids: vec![],
        })
        .await
        .unwrap();

    exercise.id
}

fn workout_body(name: &str, exercise_id: Uuid) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "difficulty": "beginner",
        "exercises": [{
            "exercise_id": exercise_id,
            "position": 1,
            "sets": 3,
            "reps": 10,
        }],
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _state) = spawn_app().await;

    let response = app
        .oneshot(get_request("/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["checks"]["database"], true);
}

#[tokio::test]
async fn test_register_and_login() {
    let (app, _state) = spawn_app().await;

    let data = register(&app, "lifter", "lifter@example.com", "hunter2hunter2").await;
    assert_eq!(data["user"]["username"], "lifter");
    assert_eq!(data["user"]["email"], "lifter@example.com");
    assert!(data["access_token"].as_str().unwrap().len() > 20);
    assert_eq!(data["token_type"], "bearer");

    // Login by username
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            serde_json::json!({ "identifier": "lifter", "password": "hunter2hunter2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Login by email
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            serde_json::json!({ "identifier": "lifter@example.com", "password": "hunter2hunter2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_accepts_mixed_case_email() {
    let (app, _state) = spawn_app().await;

    register(&app, "cased", "cased@example.com", "hunter2hunter2").await;

    // Stored emails are normalized, so the login fallback must normalize too.
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            serde_json::json!({
                "identifier": "Cased@Example.com",
                "password": "hunter2hunter2",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            serde_json::json!({
                "identifier": "  cased@example.com  ",
                "password": "hunter2hunter2",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_rejects_duplicates() {
    let (app, _state) = spawn_app().await;

    register(&app, "dupe", "dupe@example.com", "hunter2hunter2").await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            serde_json::json!({
                "email": "dupe@example.com",
                "username": "someone-else",
                "password": "hunter2hunter2",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            serde_json::json!({
                "email": "other@example.com",
                "username": "dupe",
                "password": "hunter2hunter2",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validates_input() {
    let (app, _state) = spawn_app().await;

    // Short password
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            serde_json::json!({ "email": "a@b.com", "username": "shorty", "password": "short" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Malformed email
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            serde_json::json!({ "email": "not-an-email", "username": "valid", "password": "hunter2hunter2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _state) = spawn_app().await;

    register(&app, "secretive", "secretive@example.com", "hunter2hunter2").await;

    let wrong_password = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            serde_json::json!({ "identifier": "secretive", "password": "wrong-password" }),
        ))
        .await
        .unwrap();

    let unknown_user = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            serde_json::json!({ "identifier": "nobody", "password": "whatever-pass" }),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let a = response_json(wrong_password).await;
    let b = response_json(unknown_user).await;
    assert_eq!(a["error"], b["error"]);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/users/me", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/users/me", Some("garbage-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_token_flow() {
    let (app, _state) = spawn_app().await;

    let data = register(&app, "refresher", "refresher@example.com", "hunter2hunter2").await;
    let access = data["access_token"].as_str().unwrap();
    let refresh = data["refresh_token"].as_str().unwrap();

    // Refresh token mints a new pair
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            serde_json::json!({ "refresh_token": refresh }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["data"]["access_token"].as_str().unwrap().len() > 20);

    // An access token is not accepted as a refresh token
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            serde_json::json!({ "refresh_token": access }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A refresh token is not accepted as an access token
    let response = app
        .clone()
        .oneshot(get_request("/api/v1/users/me", Some(refresh)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forgot_password_is_generic() {
    let (app, _state) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/password/forgot",
            None,
            serde_json::json!({ "email": "never-registered@example.com" }),
        ))
        .await
        .unwrap();

    // Unknown addresses get the same answer as known ones
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_change_password() {
    let (app, _state) = spawn_app().await;

    let data = register(&app, "changer", "changer@example.com", "old-password-1").await;
    let token = data["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/v1/auth/password",
            Some(token),
            serde_json::json!({ "current_password": "old-password-1", "new_password": "new-password-2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer works
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            serde_json::json!({ "identifier": "changer", "password": "old-password-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // New one does
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/auth/login",
            None,
            serde_json::json!({ "identifier": "changer", "password": "new-password-2" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_profile_update() {
    let (app, _state) = spawn_app().await;

    let data = register(&app, "updater", "updater@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/v1/users/me",
            Some(token),
            serde_json::json!({ "preferred_units": "fathoms" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            "/api/v1/users/me",
            Some(token),
            serde_json::json!({ "preferred_units": "metric", "full_name": "Up Dater" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["full_name"], "Up Dater");
    assert_eq!(body["data"]["preferred_units"], "metric");
}

#[tokio::test]
async fn test_default_subscription_is_free() {
    let (app, _state) = spawn_app().await;

    let data = register(&app, "freeloader", "freeloader@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/users/me/subscription", Some(token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["plan_type"], "free");
    assert_eq!(body["data"]["price_cents"], 0);
}

#[tokio::test]
async fn test_admin_routes_require_superuser() {
    let (app, state) = spawn_app().await;

    let data = register(&app, "pleb", "pleb@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/users", Some(token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    promote_to_superuser(&state, data["user"]["id"].as_str().unwrap()).await;

    // Middleware reloads the user row, so no new token is needed
    let response = app
        .clone()
        .oneshot(get_request("/api/v1/users", Some(token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_superuser_cannot_deactivate_self() {
    let (app, state) = spawn_app().await;

    let data = register(&app, "admin", "admin@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();
    let user_id = data["user"]["id"].as_str().unwrap();
    promote_to_superuser(&state, user_id).await;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/users/{user_id}/active"),
            Some(token),
            serde_json::json!({ "is_active": false }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deactivated_user_loses_access() {
    let (app, state) = spawn_app().await;

    let admin = register(&app, "enforcer", "enforcer@example.com", "hunter2hunter2").await;
    let admin_token = admin["access_token"].as_str().unwrap();
    promote_to_superuser(&state, admin["user"]["id"].as_str().unwrap()).await;

    let victim = register(&app, "victim", "victim@example.com", "hunter2hunter2").await;
    let victim_token = victim["access_token"].as_str().unwrap();
    let victim_id = victim["user"]["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/users/{victim_id}/active"),
            Some(admin_token),
            serde_json::json!({ "is_active": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The still-valid token no longer gets through
    let response = app
        .clone()
        .oneshot(get_request("/api/v1/users/me", Some(victim_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_taxonomy_is_seeded() {
    let (app, _state) = spawn_app().await;

    let data = register(&app, "browser", "browser@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    for uri in [
        "/api/v1/exercises/categories",
        "/api/v1/exercises/muscle-groups",
        "/api/v1/exercises/equipment",
    ] {
        let response = app.clone().oneshot(get_request(uri, Some(token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert!(!body["data"].as_array().unwrap().is_empty(), "{uri} empty");
    }
}

#[tokio::test]
async fn test_custom_exercises_gated_by_plan() {
    let (app, state) = spawn_app().await;

    let data = register(&app, "tinkerer", "tinkerer@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    let categories = state.store().list_exercise_categories().await.unwrap();
    let category_id = categories[0].id;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/exercises",
            Some(token),
            serde_json::json!({
                "name": "My Special Curl",
                "difficulty": "beginner",
                "category_id": category_id,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_superuser_exercise_crud() {
    let (app, state) = spawn_app().await;

    let data = register(&app, "curator", "curator@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();
    promote_to_superuser(&state, data["user"]["id"].as_str().unwrap()).await;

    let categories = state.store().list_exercise_categories().await.unwrap();
    let category_id = categories[0].id;

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/exercises",
            Some(token),
            serde_json::json!({
                "name": "Back Squat",
                "difficulty": "intermediate",
                "category_id": category_id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["is_custom"], false);
    let exercise_id = body["data"]["id"].as_str().unwrap().to_string();

    // Duplicate name rejected
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/exercises",
            Some(token),
            serde_json::json!({
                "name": "Back Squat",
                "difficulty": "intermediate",
                "category_id": category_id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/exercises/{exercise_id}"),
            Some(token),
            serde_json::json!({ "difficulty": "advanced" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["difficulty"], "advanced");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::DELETE)
                .uri(format!("/api/v1/exercises/{exercise_id}"))
                .header("Authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/v1/exercises/{exercise_id}"),
            Some(token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_regular_user_cannot_modify_builtin_exercise() {
    let (app, state) = spawn_app().await;

    let exercise_id = seed_exercise(&state, "Push-up").await;

    let data = register(&app, "meddler", "meddler@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::PUT,
            &format!("/api/v1/exercises/{exercise_id}"),
            Some(token),
            serde_json::json!({ "difficulty": "expert" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_image_listing_requires_storage() {
    let (app, state) = spawn_app().await;

    let exercise_id = seed_exercise(&state, "Bench Press").await;
    let data = register(&app, "viewer", "viewer@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    // Storage is disabled in the default config; the read endpoint must
    // say so rather than hand out bare object keys.
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/v1/exercises/{exercise_id}/images"),
            Some(token),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Image storage is not enabled");
}

#[tokio::test]
async fn test_workout_limit_on_free_tier() {
    let (app, state) = spawn_app().await;

    let exercise_id = seed_exercise(&state, "Deadlift").await;
    let data = register(&app, "grinder", "grinder@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    for i in 0..10 {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/workouts",
                Some(token),
                workout_body(&format!("Workout {i}"), exercise_id),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED, "workout {i}");
    }

    // Free tier caps out at ten
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/workouts",
            Some(token),
            workout_body("One Too Many", exercise_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_plan_limit_on_free_tier() {
    let (app, state) = spawn_app().await;

    let exercise_id = seed_exercise(&state, "Front Squat").await;
    let data = register(&app, "scheduler", "scheduler@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/workouts",
            Some(token),
            workout_body("Leg Day", exercise_id),
        ))
        .await
        .unwrap();
    let body = response_json(response).await;
    let workout_id = body["data"]["id"].as_str().unwrap().to_string();

    for i in 0..2 {
        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/plans",
                Some(token),
                serde_json::json!({
                    "name": format!("Plan {i}"),
                    "duration_weeks": 4,
                    "entries": [{ "workout_id": workout_id, "week_number": 1, "day_number": i + 1 }],
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED, "plan {i}");
    }

    // Free tier caps out at two plans
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/plans",
            Some(token),
            serde_json::json!({
                "name": "One Plan Too Many",
                "duration_weeks": 4,
                "entries": [{ "workout_id": workout_id, "week_number": 1, "day_number": 3 }],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_workout_requires_known_exercise() {
    let (app, _state) = spawn_app().await;

    let data = register(&app, "fumbler", "fumbler@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/workouts",
            Some(token),
            workout_body("Ghost Workout", Uuid::new_v4()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_private_workout_access() {
    let (app, state) = spawn_app().await;

    let exercise_id = seed_exercise(&state, "Bench Press").await;
    let owner = register(&app, "owner", "owner@example.com", "hunter2hunter2").await;
    let owner_token = owner["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/workouts",
            Some(owner_token),
            workout_body("Private Push Day", exercise_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    let workout_id = body["data"]["id"].as_str().unwrap().to_string();

    let intruder = register(&app, "intruder", "intruder@example.com", "hunter2hunter2").await;
    let intruder_token = intruder["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/v1/workouts/{workout_id}"),
            Some(intruder_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Unknown IDs are a 404, not a 403
    let response = app
        .clone()
        .oneshot(get_request(
            &format!("/api/v1/workouts/{}", Uuid::new_v4()),
            Some(intruder_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (app, state) = spawn_app().await;

    let exercise_id = seed_exercise(&state, "Row").await;
    let data = register(&app, "athlete", "athlete@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/workouts",
            Some(token),
            workout_body("Pull Day", exercise_id),
        ))
        .await
        .unwrap();
    let body = response_json(response).await;
    let workout_id = body["data"]["id"].as_str().unwrap().to_string();

    // Start
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/sessions/start",
            Some(token),
            serde_json::json!({ "workout_id": workout_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "in_progress");
    let session_id = body["data"]["id"].as_str().unwrap().to_string();

    // Second concurrent session is refused
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/sessions/start",
            Some(token),
            serde_json::json!({ "workout_id": workout_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Complete with out-of-range rating
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/sessions/{session_id}/complete"),
            Some(token),
            serde_json::json!({ "mood_rating": 11 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Complete properly
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/sessions/{session_id}/complete"),
            Some(token),
            serde_json::json!({ "mood_rating": 4, "difficulty_rating": 7, "notes": "solid" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["mood_rating"], 4);

    // Completing twice fails
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/sessions/{session_id}/complete"),
            Some(token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_abandon_and_isolation() {
    let (app, state) = spawn_app().await;

    let exercise_id = seed_exercise(&state, "Lunge").await;
    let data = register(&app, "quitter", "quitter@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/workouts",
            Some(token),
            workout_body("Leg Day", exercise_id),
        ))
        .await
        .unwrap();
    let body = response_json(response).await;
    let workout_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/sessions/start",
            Some(token),
            serde_json::json!({ "workout_id": workout_id }),
        ))
        .await
        .unwrap();
    let body = response_json(response).await;
    let session_id = body["data"]["id"].as_str().unwrap().to_string();

    // Someone else cannot abandon it
    let other = register(&app, "bystander", "bystander@example.com", "hunter2hunter2").await;
    let other_token = other["access_token"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/sessions/{session_id}/abandon"),
            Some(other_token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/sessions/{session_id}/abandon"),
            Some(token),
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "abandoned");
}

#[tokio::test]
async fn test_plan_creation_validates_entries() {
    let (app, state) = spawn_app().await;

    let exercise_id = seed_exercise(&state, "Plank").await;
    let data = register(&app, "planner", "planner@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/workouts",
            Some(token),
            workout_body("Core Day", exercise_id),
        ))
        .await
        .unwrap();
    let body = response_json(response).await;
    let workout_id = body["data"]["id"].as_str().unwrap().to_string();

    // Week outside the plan duration
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/plans",
            Some(token),
            serde_json::json!({
                "name": "Broken Plan",
                "duration_weeks": 4,
                "entries": [{ "workout_id": workout_id, "week_number": 9, "day_number": 1 }],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/plans",
            Some(token),
            serde_json::json!({
                "name": "Four Week Base",
                "duration_weeks": 4,
                "entries": [{ "workout_id": workout_id, "week_number": 1, "day_number": 2 }],
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["name"], "Four Week Base");
}

#[tokio::test]
async fn test_plus_tier_unlocks_custom_exercises() {
    let (app, state) = spawn_app().await;

    let data = register(&app, "upgrader", "upgrader@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();
    let user_id = Uuid::parse_str(data["user"]["id"].as_str().unwrap()).unwrap();

    let plan = state
        .store()
        .get_plan_by_type(forgefit::models::PlanType::Plus)
        .await
        .unwrap()
        .expect("plus plan seeded");
    state
        .store()
        .create_subscription(
            user_id,
            plan.id,
            Some("sub_live".to_string()),
            Some("cus_live".to_string()),
        )
        .await
        .unwrap();

    let categories = state.store().list_exercise_categories().await.unwrap();
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/exercises",
            Some(token),
            serde_json::json!({
                "name": "Weighted Dip",
                "difficulty": "intermediate",
                "category_id": categories[0].id,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["is_custom"], true);

    let response = app
        .clone()
        .oneshot(get_request("/api/v1/users/me/subscription", Some(token)))
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["data"]["plan_type"], "plus");
}

#[tokio::test]
async fn test_exercise_list_can_exclude_custom() {
    let (app, state) = spawn_app().await;

    seed_exercise(&state, "Push-up").await;

    let data = register(&app, "curator", "curator@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();
    let user_id = Uuid::parse_str(data["user"]["id"].as_str().unwrap()).unwrap();

    let plan = state
        .store()
        .get_plan_by_type(forgefit::models::PlanType::Plus)
        .await
        .unwrap()
        .expect("plus plan seeded");
    state
        .store()
        .create_subscription(user_id, plan.id, None, None)
        .await
        .unwrap();

    let categories = state.store().list_exercise_categories().await.unwrap();
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/exercises",
            Some(token),
            serde_json::json!({
                "name": "Weighted Pull-up",
                "difficulty": "advanced",
                "category_id": categories[0].id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let names = |body: &serde_json::Value| -> Vec<String> {
        body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["name"].as_str().unwrap().to_string())
            .collect()
    };

    // Custom exercises are listed by default
    let response = app
        .clone()
        .oneshot(get_request("/api/v1/exercises", Some(token)))
        .await
        .unwrap();
    let body = response_json(response).await;
    let listed = names(&body);
    assert!(listed.contains(&"Push-up".to_string()));
    assert!(listed.contains(&"Weighted Pull-up".to_string()));

    let response = app
        .clone()
        .oneshot(get_request(
            "/api/v1/exercises?include_custom=false",
            Some(token),
        ))
        .await
        .unwrap();
    let body = response_json(response).await;
    let listed = names(&body);
    assert!(listed.contains(&"Push-up".to_string()));
    assert!(!listed.contains(&"Weighted Pull-up".to_string()));
}

fn signed_webhook(payload: &str) -> Request<Body> {
    let timestamp = chrono::Utc::now().timestamp();
    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, WEBHOOK_SECRET.as_bytes());
    let mut signed = timestamp.to_string().into_bytes();
    signed.push(b'.');
    signed.extend_from_slice(payload.as_bytes());
    let tag = ring::hmac::sign(&key, &signed);
    let header = format!("t={timestamp},v1={}", hex::encode(tag.as_ref()));

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/webhooks/stripe")
        .header("Content-Type", "application/json")
        .header("stripe-signature", header)
        .body(Body::from(payload.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_payment_failure_revokes_tier() {
    let (app, state) = spawn_app().await;

    let data = register(&app, "lapsed", "lapsed@example.com", "hunter2hunter2").await;
    let token = data["access_token"].as_str().unwrap();
    let user_id = Uuid::parse_str(data["user"]["id"].as_str().unwrap()).unwrap();

    let plan = state
        .store()
        .get_plan_by_type(forgefit::models::PlanType::Plus)
        .await
        .unwrap()
        .unwrap();
    state
        .store()
        .create_subscription(
            user_id,
            plan.id,
            Some("sub_lapsed".to_string()),
            Some("cus_lapsed".to_string()),
        )
        .await
        .unwrap();

    let payload = serde_json::json!({
        "type": "invoice.payment_failed",
        "data": { "object": { "subscription": "sub_lapsed" } },
    })
    .to_string();

    let response = app.clone().oneshot(signed_webhook(&payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Back on the free tier, so custom exercises are gated again
    let categories = state.store().list_exercise_categories().await.unwrap();
    let response = app
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/exercises",
            Some(token),
            serde_json::json!({
                "name": "Lapsed Lift",
                "difficulty": "beginner",
                "category_id": categories[0].id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn test_webhook_rejects_bad_signatures() {
    let (app, _state) = spawn_app().await;

    let payload = serde_json::json!({
        "type": "invoice.paid",
        "data": { "object": { "subscription": "sub_none" } },
    });

    // No signature header
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/webhooks/stripe")
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Bogus signature header
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/webhooks/stripe")
                .header("Content-Type", "application/json")
                .header("stripe-signature", "t=0,v1=deadbeef")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_accepts_signed_events() {
    let (app, _state) = spawn_app().await;

    let payload = serde_json::json!({
        "type": "customer.subscription.updated",
        "data": { "object": {
            "id": "sub_unknown",
            "customer": "cus_unknown",
            "status": "active",
            "items": { "data": [ { "price": { "id": "price_plus_monthly" } } ] },
        }},
    })
    .to_string();

    // Unknown subscriptions are acknowledged so Stripe stops retrying
    let response = app.clone().oneshot(signed_webhook(&payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "success");
}
