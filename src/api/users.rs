use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::{Address, Localized};
use crate::entities::user::{self, Entity as UserEntity, Role};
use crate::entities::{cart_item, cart_item::Entity as CartItemEntity};
use crate::entities::{wishlist_item, wishlist_item::Entity as WishlistItemEntity};
use crate::middleware::auth::{require_admin, require_user, AuthSession};

const FALLBACK_NAME_EN: &str = "Unnamed Product";
const FALLBACK_NAME_AR: &str = "منتج بدون اسم";

//ROUTERS
pub fn users_router() -> Router {
    Router::new()
        .route("/users", get(get_users))
        .route("/users/me", get(get_my_profile).put(update_my_profile))
        .route("/users/me/cart", get(get_my_cart).put(update_my_cart))
        .route(
            "/users/me/wishlist",
            get(get_my_wishlist).put(update_my_wishlist),
        )
        .route("/users/:user_id", get(get_user_by_id))
}

//ROUTES
async fn get_my_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
) -> Response {
    let claims = match require_user(&session) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    user_profile_response(&*db, claims.user_id).await
}

async fn get_user_by_id(
    Path(user_id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
) -> Response {
    let claims = match require_user(&session) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    if claims.user_id != user_id && claims.role != Role::Admin {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "message": "Access denied"
            })),
        )
            .into_response();
    }

    user_profile_response(&*db, user_id).await
}

async fn user_profile_response(db: &DatabaseConnection, user_id: i32) -> Response {
    let user = match UserEntity::find_by_id(user_id).one(db).await {
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
                    "message": "Error fetching user",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let cart = match CartItemEntity::find()
        .filter(cart_item::Column::UserId.eq(user_id))
        .all(db)
        .await
    {
        Ok(items) => items.into_iter().map(CartItemResponse::new).collect(),
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error fetching user",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let wishlist = match WishlistItemEntity::find()
        .filter(wishlist_item::Column::UserId.eq(user_id))
        .all(db)
        .await
    {
        Ok(items) => items.into_iter().map(|item| item.product_id).collect(),
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error fetching user",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let mut response = UserResponse::new(user);
    response.cart = Some(cart);
    response.wishlist = Some(wishlist);

    (StatusCode::OK, Json(response)).into_response()
}

async fn update_my_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Response {
    let claims = match require_user(&session) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating user profile",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let user = match UserEntity::find_by_id(claims.user_id).one(&txn).await {
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
                    "message": "Error updating user profile",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let mut user: user::ActiveModel = user.into();

    if let Some(name) = payload.name {
        if !name.trim().is_empty() {
            user.name = Set(name.trim().to_owned());
        }
    }

    if let Some(phone) = payload.phone {
        if !phone.trim().is_empty() {
            user.phone = Set(phone.trim().to_owned());
        }
    }

    // Address fields merge one by one; absent fields keep their value.
    if let Some(address) = payload.address {
        if let Some(street) = address.street {
            user.street = Set(street);
        }
        if let Some(city) = address.city {
            user.city = Set(city);
        }
        if let Some(state) = address.state {
            user.state = Set(state);
        }
        if let Some(country) = address.country {
            user.country = Set(country);
        }
        if let Some(postal_code) = address.postal_code {
            user.postal_code = Set(postal_code);
        }
    }

    user.updated_at = Set(Utc::now());

    let updated = match user.update(&txn).await {
        Ok(updated) => updated,
        Err(err) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating user profile",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    match txn.commit().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "message": "Profile updated successfully",
                "user": UserResponse::new(updated)
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error updating user profile",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn get_my_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
) -> Response {
    let claims = match require_user(&session) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    match CartItemEntity::find()
        .filter(cart_item::Column::UserId.eq(claims.user_id))
        .all(&*db)
        .await
    {
        Ok(items) => {
            let cart: Vec<CartItemResponse> = items.into_iter().map(CartItemResponse::new).collect();
            (StatusCode::OK, Json(cart)).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error fetching cart",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

/// Wholesale cart replacement: the sanitized payload becomes the stored cart
/// verbatim. Last write wins; there is no merge and no version check.
async fn update_my_cart(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
    Json(body): Json<Value>,
) -> Response {
    let claims = match require_user(&session) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    let sanitized = match sanitize_cart(&body) {
        Ok(items) => items,
        Err(response) => return response,
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating cart",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    if let Err(err) = CartItemEntity::delete_many()
        .filter(cart_item::Column::UserId.eq(claims.user_id))
        .exec(&txn)
        .await
    {
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error updating cart",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    let rows: Vec<cart_item::ActiveModel> = sanitized
        .iter()
        .map(|item| cart_item::ActiveModel {
            user_id: Set(claims.user_id),
            product_id: Set(item.product_id),
            name_en: Set(item.name.en.clone()),
            name_ar: Set(item.name.ar.clone()),
            price: Set(item.price),
            quantity: Set(item.quantity),
            image: Set(item.image.clone()),
            ..Default::default()
        })
        .collect();

    if let Err(err) = CartItemEntity::insert_many(rows)
        .on_empty_do_nothing()
        .exec(&txn)
        .await
    {
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error updating cart",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    match txn.commit().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "message": "Cart updated successfully",
                "cart": sanitized
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error updating cart",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn get_my_wishlist(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
) -> Response {
    let claims = match require_user(&session) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    match WishlistItemEntity::find()
        .filter(wishlist_item::Column::UserId.eq(claims.user_id))
        .all(&*db)
        .await
    {
        Ok(items) => {
            let wishlist: Vec<i32> = items.into_iter().map(|item| item.product_id).collect();
            (StatusCode::OK, Json(wishlist)).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error fetching wishlist",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn update_my_wishlist(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<WishlistPayload>,
) -> Response {
    let claims = match require_user(&session) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating wishlist",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    if let Err(err) = WishlistItemEntity::delete_many()
        .filter(wishlist_item::Column::UserId.eq(claims.user_id))
        .exec(&txn)
        .await
    {
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error updating wishlist",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    let rows: Vec<wishlist_item::ActiveModel> = payload
        .wishlist
        .iter()
        .map(|product_id| wishlist_item::ActiveModel {
            user_id: Set(claims.user_id),
            product_id: Set(*product_id),
            ..Default::default()
        })
        .collect();

    if let Err(err) = WishlistItemEntity::insert_many(rows)
        .on_empty_do_nothing()
        .exec(&txn)
        .await
    {
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error updating wishlist",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    match txn.commit().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "message": "Wishlist updated successfully",
                "wishlist": payload.wishlist
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error updating wishlist",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn get_users(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
) -> Response {
    if let Err(response) = require_admin(&session) {
        return response;
    }

    match UserEntity::find().all(&*db).await {
        Ok(users) => {
            let users: Vec<UserResponse> = users.into_iter().map(UserResponse::new).collect();
            (StatusCode::OK, Json(users)).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error fetching users",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

//sanitization
fn sanitize_cart(body: &Value) -> Result<Vec<SanitizedCartItem>, Response> {
    let cart = match body.get("cart") {
        Some(Value::Array(items)) => items,
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "Cart must be an array"
                })),
            )
                .into_response());
        }
    };

    let mut sanitized = Vec::with_capacity(cart.len());

    for (index, item) in cart.iter().enumerate() {
        let product_id = item
            .get("productId")
            .or_else(|| item.get("id"))
            .and_then(Value::as_i64);

        let product_id = match product_id {
            Some(id) if id > 0 && id <= i64::from(i32::MAX) => id as i32,
            Some(_) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": format!("Invalid productId at index {}", index)
                    })),
                )
                    .into_response());
            }
            None => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": format!("Missing productId at index {}", index)
                    })),
                )
                    .into_response());
            }
        };

        let name = Localized::new(
            item.pointer("/name/en")
                .and_then(Value::as_str)
                .unwrap_or(FALLBACK_NAME_EN),
            item.pointer("/name/ar")
                .and_then(Value::as_str)
                .unwrap_or(FALLBACK_NAME_AR),
        );

        let price = item.get("price").and_then(Value::as_f64).unwrap_or(0.0) as f32;

        let quantity = match item.get("quantity").and_then(Value::as_i64) {
            Some(quantity) if quantity > 0 => quantity as i32,
            _ => 1,
        };

        let image = item
            .get("image")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_owned();

        sanitized.push(SanitizedCartItem {
            product_id,
            name,
            price,
            quantity,
            image,
        });
    }

    Ok(sanitized)
}

//structs
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
    pub address: Address,
    pub is_verified: bool,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<Vec<CartItemResponse>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wishlist: Option<Vec<i32>>,
}

impl UserResponse {
    pub fn new(user: user::Model) -> UserResponse {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            address: Address {
                street: user.street,
                city: user.city,
                state: user.state,
                country: user.country,
                postal_code: user.postal_code,
            },
            is_verified: user.is_verified,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
            cart: None,
            wishlist: None,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub name: Localized,
    pub price: f32,
    pub quantity: i32,
    pub image: String,
}

impl CartItemResponse {
    fn new(item: cart_item::Model) -> CartItemResponse {
        CartItemResponse {
            id: item.id,
            product_id: item.product_id,
            name: Localized::new(item.name_en, item.name_ar),
            price: item.price,
            quantity: item.quantity,
            image: item.image,
        }
    }
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct SanitizedCartItem {
    product_id: i32,
    name: Localized,
    price: f32,
    quantity: i32,
    image: String,
}

#[derive(Deserialize, Clone, Debug)]
struct UpdateProfilePayload {
    name: Option<String>,
    phone: Option<String>,
    address: Option<AddressPatch>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct AddressPatch {
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    country: Option<String>,
    postal_code: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
struct WishlistPayload {
    wishlist: Vec<i32>,
}
