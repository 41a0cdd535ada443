use crate::entities::user::{self, Entity as UserEntity, Role};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};

/// What the token carried, decoded once at the boundary. Handlers decide
/// per route whether anonymous or non-admin callers are acceptable.
#[derive(Clone, Debug)]
pub enum AuthSession {
    Anonymous,
    Invalid,
    Authenticated(Claims),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub email: String,
    pub role: Role,
    pub exp: usize,
}

#[derive(Clone)]
pub struct AuthState {
    pub db: Arc<DatabaseConnection>,
}

/// Resolves the bearer-or-cookie token into an `AuthSession` request
/// extension. Requests without a token pass through as `Anonymous` so the
/// public routes behind this layer keep working.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session = match token_from_request(&req) {
        Some(token) => match validate_token(state.db.clone(), &token).await {
            Ok(claims) => AuthSession::Authenticated(claims),
            // A database failure is not the caller's fault; it must not be
            // reported as a bad token.
            Err(AuthError::InternalServerError) => {
                tracing::error!("token check failed against the database");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Internal server error"
                    })),
                )
                    .into_response();
            }
            Err(err) => {
                tracing::debug!(error = %err, "rejected auth token");
                AuthSession::Invalid
            }
        },
        None => AuthSession::Anonymous,
    };

    req.extensions_mut().insert(session);
    next.run(req).await
}

pub fn require_user(session: &AuthSession) -> Result<Claims, Response> {
    match session {
        AuthSession::Authenticated(claims) => Ok(claims.clone()),
        AuthSession::Anonymous => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "message": "No token provided"
            })),
        )
            .into_response()),
        AuthSession::Invalid => Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "message": "Invalid or expired token"
            })),
        )
            .into_response()),
    }
}

pub fn require_admin(session: &AuthSession) -> Result<Claims, Response> {
    let claims = require_user(session)?;
    if claims.role != Role::Admin {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "message": "Admin access only"
            })),
        )
            .into_response());
    }
    Ok(claims)
}

fn token_from_request(req: &Request) -> Option<String> {
    if let Some(header) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        if let Some(token) = header.strip_prefix("Bearer ") {
            return Some(token.to_owned());
        }
    }

    let cookies = req.headers().get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("token=").map(str::to_owned))
}

pub fn generate_token(user: &user::Model, hours: i64) -> Result<String, AuthError> {
    let exp = Utc::now()
        .checked_add_signed(Duration::hours(hours))
        .ok_or(AuthError::GenerationFail)?
        .timestamp() as usize;

    let claims = Claims {
        user_id: user.id,
        email: user.email.clone(),
        role: user.role,
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(get_secret_key().as_bytes()),
    )
    .map_err(|_| AuthError::GenerationFail)
}

pub async fn validate_token(
    db: Arc<DatabaseConnection>,
    token: &str,
) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(get_secret_key().as_bytes()),
        &validation,
    )
    .map_err(|_| AuthError::TokenExpired)?;

    let claims = token_data.claims;

    // The signed role must still match the stored row.
    match UserEntity::find_by_id(claims.user_id)
        .filter(user::Column::Role.eq(claims.role))
        .one(&*db)
        .await
    {
        Ok(Some(_)) => Ok(claims),
        Ok(None) => Err(AuthError::InvalidUserOrRole),
        Err(_) => Err(AuthError::InternalServerError),
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2.hash_password(password.as_bytes(), &salt)?.to_string();

    Ok(password_hash)
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid user id or role")]
    InvalidUserOrRole,
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to generate token")]
    GenerationFail,
    #[error("Internal server error")]
    InternalServerError,
}

fn get_secret_key() -> String {
    std::env::var("JWT_SECRET").expect("JWT_SECRET not found in environment")
}

#[cfg(test)]
mod tests {
    use super::hash_password;
    use crate::entities::user::{self, Role};
    use chrono::Utc;

    fn model_with_hash(hash: String) -> user::Model {
        let now = Utc::now();
        user::Model {
            id: 1,
            name: "Hash Tester".to_owned(),
            email: "hash@example.com".to_owned(),
            password: hash,
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
        }
    }

    #[test]
    fn hashed_password_round_trips() {
        let hash = hash_password("correct horse").expect("hashing should work");
        let user = model_with_hash(hash);

        assert!(user.check_hash("correct horse").is_ok());
        assert!(user.check_hash("wrong horse").is_err());
    }
}
