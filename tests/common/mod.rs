use sea_orm::{ConnectOptions, Database};
use serde_json::{json, Value};
use std::sync::Arc;

use mega_mart_backend::api::create_api_router;
use mega_mart_backend::entities::setup_schema;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

/// Boots the full router on an ephemeral port over a fresh in-memory
/// database. The pool is pinned to one connection so every request sees the
/// same database.
pub async fn spawn_app() -> TestApp {
    std::env::set_var("JWT_SECRET", "integration-test-secret");

    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);

    let db = Database::connect(options)
        .await
        .expect("failed to open in-memory database");
    setup_schema(&db).await.expect("failed to build schema");

    let app = create_api_router(Arc::new(db));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let address = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Cookie handling is off so tokens never leak between the users a test
    // creates; auth tests that care about cookies build their own client.
    let client = reqwest::Client::new();

    TestApp { address, client }
}

/// Registers an account and logs it in, returning `(user_id, token)`.
/// Passing `Some("admin")` mints an admin.
pub async fn register_and_login(app: &TestApp, email: &str, role: Option<&str>) -> (i32, String) {
    let mut body = json!({
        "name": "Test User",
        "email": email,
        "password": "password123",
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }

    let res = app
        .client
        .post(format!("{}/api/users/register", app.address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201, "registration should succeed");
    let body: Value = res.json().await.unwrap();
    let user_id = body["user"]["id"].as_i64().unwrap() as i32;

    let res = app
        .client
        .post(format!("{}/api/users/login", app.address))
        .json(&json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200, "login should succeed");
    let body: Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_owned();

    (user_id, token)
}

/// Creates a product through the admin endpoint and returns its id.
pub async fn create_product(app: &TestApp, admin_token: &str, name_en: &str, price: f32) -> i32 {
    let res = app
        .client
        .post(format!("{}/api/products", app.address))
        .bearer_auth(admin_token)
        .json(&json!({
            "name": { "en": name_en, "ar": format!("{} (ar)", name_en) },
            "description": { "en": "A test product", "ar": "منتج تجريبي" },
            "category": { "en": "Electronics", "ar": "إلكترونيات" },
            "price": price,
            "stock": 25,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201, "product creation should succeed");
    let body: Value = res.json().await.unwrap();
    body["id"].as_i64().unwrap() as i32
}
