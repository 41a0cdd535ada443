mod common;

use common::{register_and_login, spawn_app};
use sea_orm::{ConnectOptions, Database};
use serde_json::{json, Value};
use std::sync::Arc;

use mega_mart_backend::api::create_api_router;
use mega_mart_backend::entities::user::{self, Role};
use mega_mart_backend::middleware::auth::generate_token;

#[tokio::test]
async fn health_check_responds() {
    //1. Boot the app
    let app = spawn_app().await;

    //2. Hit the root route
    let res = app
        .client
        .get(format!("{}/", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Backend running fine");
}

#[tokio::test]
async fn register_then_fetch_profile_with_bearer_token() {
    //1. Boot the app and create a regular account
    let app = spawn_app().await;
    let (user_id, token) = register_and_login(&app, "alice@example.com", None).await;

    //2. The token opens the profile route
    let res = app
        .client
        .get(format!("{}/api/users/me", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"].as_i64().unwrap() as i32, user_id);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn login_sets_cookie_that_authenticates() {
    //1. Boot the app and register through a cookie-aware client
    let app = spawn_app().await;
    let jar_client = reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap();

    let res = jar_client
        .post(format!("{}/api/users/register", app.address))
        .json(&json!({
            "name": "Bob",
            "email": "bob@example.com",
            "password": "password123",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);

    //2. Login stores the token cookie in the jar
    let res = jar_client
        .post(format!("{}/api/users/login", app.address))
        .json(&json!({ "email": "bob@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    //3. The cookie alone authenticates the profile route
    let res = jar_client
        .get(format!("{}/api/users/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["email"], "bob@example.com");

    //4. Logout clears the cookie
    let res = jar_client
        .post(format!("{}/api/users/logout", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = jar_client
        .get(format!("{}/api/users/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    //1. Boot the app and register once
    let app = spawn_app().await;
    register_and_login(&app, "carol@example.com", None).await;

    //2. Registering again with the same email fails
    let res = app
        .client
        .post(format!("{}/api/users/register", app.address))
        .json(&json!({
            "name": "Carol Again",
            "email": "carol@example.com",
            "password": "password456",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn short_password_is_rejected() {
    let app = spawn_app().await;

    let res = app
        .client
        .post(format!("{}/api/users/register", app.address))
        .json(&json!({
            "name": "Dora",
            "email": "dora@example.com",
            "password": "abc",
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid user data");
}

#[tokio::test]
async fn wrong_password_gets_401_and_unknown_email_404() {
    //1. Boot the app with one known account
    let app = spawn_app().await;
    register_and_login(&app, "erin@example.com", None).await;

    //2. Bad password
    let res = app
        .client
        .post(format!("{}/api/users/login", app.address))
        .json(&json!({ "email": "erin@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 401);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid credentials");

    //3. Unknown email
    let res = app
        .client
        .post(format!("{}/api/users/login", app.address))
        .json(&json!({ "email": "nobody@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn protected_route_requires_token() {
    let app = spawn_app().await;

    let res = app
        .client
        .get(format!("{}/api/users/me", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 401);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "No token provided");
}

#[tokio::test]
async fn database_failure_during_token_check_is_a_server_error() {
    //1. Boot the router over a database with no tables at all
    std::env::set_var("JWT_SECRET", "integration-test-secret");

    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);
    let db = Database::connect(options).await.unwrap();
    let app = create_api_router(Arc::new(db));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    //2. Craft a well-formed token for a user the database cannot look up
    let now = chrono::Utc::now();
    let ghost = user::Model {
        id: 1,
        name: "Ghost".to_owned(),
        email: "ghost@example.com".to_owned(),
        password: String::new(),
        role: Role::User,
        phone: String::new(),
        street: String::new(),
        city: String::new(),
        state: String::new(),
        country: String::new(),
        postal_code: String::new(),
        is_verified: false,
        last_login: None,
        created_at: now,
        updated_at: now,
    };
    let token = generate_token(&ghost, 1).unwrap();

    //3. The broken lookup surfaces as a server error, not a bad token
    let res = reqwest::Client::new()
        .get(format!("{}/api/users/me", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Internal server error");
}

#[tokio::test]
async fn garbage_token_is_forbidden() {
    let app = spawn_app().await;

    let res = app
        .client
        .get(format!("{}/api/users/me", app.address))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 403);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid or expired token");
}
