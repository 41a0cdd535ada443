pub mod auth;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod uploads;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::middleware::auth::{auth_middleware, AuthState};
use crate::middleware::logging::logging_middleware;

pub fn create_api_router(shared_db: Arc<DatabaseConnection>) -> Router {
    let api = Router::new()
        .merge(auth::auth_router())
        .merge(users::users_router())
        .merge(products::products_router())
        .merge(reviews::reviews_router())
        .merge(orders::orders_router())
        .merge(checkout::checkout_router());

    Router::new()
        .route("/", get(health_check))
        .nest("/api", api)
        .merge(uploads::uploads_router())
        .layer(middleware::from_fn_with_state(
            AuthState {
                db: shared_db.clone(),
            },
            auth_middleware,
        ))
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors_layer())
        .layer(Extension(shared_db))
}

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "message": "Backend running fine"
        })),
    )
}

fn cors_layer() -> CorsLayer {
    let origin = std::env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
    let origin = origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"));

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// An `{en, ar}` pair, the wire shape of every localized field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Localized {
    pub en: String,
    pub ar: String,
}

impl Localized {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Localized {
            en: en.into(),
            ar: ar.into(),
        }
    }
}

/// Some clients send localized names, older ones plain strings; both decode.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum NameField {
    Localized(Localized),
    Plain(String),
}

impl NameField {
    pub fn into_localized(self) -> Localized {
        match self {
            NameField::Localized(pair) => pair,
            NameField::Plain(name) => Localized::new(name.clone(), name),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub postal_code: String,
}
