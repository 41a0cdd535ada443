use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::entities::user::{self, Entity as UserEntity, Role};
use crate::middleware::auth::{generate_token, hash_password};

// Cookie lifetimes: a short session unless the client asks to be remembered.
const SESSION_HOURS: i64 = 3;
const REMEMBER_ME_HOURS: i64 = 7 * 24;

pub fn auth_router() -> Router {
    Router::new()
        .route("/users/register", post(register_user))
        .route("/users/login", post(login_user))
        .route("/users/logout", post(logout_user))
}

async fn register_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<RegisterPayload>,
) -> Response {
    if payload.name.trim().is_empty() || payload.email.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "All fields are required"
            })),
        )
            .into_response();
    }

    if let Err(err) = payload.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Invalid user data",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    let email = payload.email.trim().to_lowercase();

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error creating user",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    match UserEntity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&txn)
        .await
    {
        Ok(Some(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "User already exists"
                })),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error creating user",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    }

    let password = match hash_password(&payload.password) {
        Ok(password) => password,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error creating user",
                    "error": "Failed to hash password"
                })),
            )
                .into_response();
        }
    };

    // Registration honors an optional role field; anything that is not
    // exactly "admin" collapses to a regular user.
    let role = match payload.role.as_deref() {
        Some("admin") => Role::Admin,
        _ => Role::User,
    };

    let now = Utc::now();
    let new_user = user::ActiveModel {
        name: Set(payload.name.trim().to_owned()),
        email: Set(email),
        password: Set(password),
        role: Set(role),
        phone: Set(String::new()),
        street: Set(String::new()),
        city: Set(String::new()),
        state: Set(String::new()),
        country: Set(String::new()),
        postal_code: Set(String::new()),
        is_verified: Set(false),
        last_login: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let saved = match new_user.insert(&txn).await {
        Ok(saved) => saved,
        Err(err) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "User already exists",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    match txn.commit().await {
        Ok(_) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "User created successfully",
                "user": {
                    "id": saved.id,
                    "name": saved.name,
                    "email": saved.email,
                    "role": saved.role,
                }
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error creating user",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn login_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<LoginPayload>,
) -> Response {
    let email = payload.email.trim().to_lowercase();

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Login failed",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let user = match UserEntity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&txn)
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "message": "User not found"
                })),
            )
                .into_response();
        }
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Login failed",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    if user.check_hash(&payload.password).is_err() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "message": "Invalid credentials"
            })),
        )
            .into_response();
    }

    let hours = if payload.remember_me.unwrap_or(false) {
        REMEMBER_ME_HOURS
    } else {
        SESSION_HOURS
    };

    let token = match generate_token(&user, hours) {
        Ok(token) => token,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Login failed",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let mut active: user::ActiveModel = user.clone().into();
    active.last_login = Set(Some(Utc::now()));
    if active.update(&txn).await.is_ok() {
        let _ = txn.commit().await;
    } else {
        let _ = txn.rollback().await;
    }

    let cookie = format!(
        "token={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        token,
        hours * 3600
    );

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "message": "Login successful",
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "role": user.role,
            "token": token,
        })),
    )
        .into_response()
}

async fn logout_user() -> Response {
    let cookie = "token=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax".to_owned();

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({
            "message": "Logged out successfully"
        })),
    )
        .into_response()
}

//structs
#[derive(Deserialize, Clone, Debug, Validate)]
struct RegisterPayload {
    name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 6))]
    password: String,
    role: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct LoginPayload {
    email: String,
    password: String,
    remember_me: Option<bool>,
}
