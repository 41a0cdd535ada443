use axum::{
    extract::{rejection::JsonRejection, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::checkout::promo_discount;
use crate::api::{Address, Localized, NameField};
use crate::entities::cart_item::{self, Entity as CartItemEntity};
use crate::entities::order::{self, Entity as OrderEntity, Method, PaymentStatus, Status};
use crate::entities::order_item::{self, Entity as OrderItemEntity};
use crate::entities::user::{self, Entity as UserEntity};
use crate::middleware::auth::{require_admin, require_user, AuthSession, Claims};

//ROUTERS
pub fn orders_router() -> Router {
    Router::new()
        .route("/orders", get(get_all_orders).post(create_order))
        .route("/orders/user/:user_id", get(get_user_orders))
        .route("/orders/:id", get(get_order).delete(delete_order))
        .route("/orders/:id/status", axum::routing::put(update_order_status))
}

//ROUTES
async fn create_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<CreateOrderPayload>,
) -> Response {
    let claims = match require_user(&session) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    let method = match payload.method.as_deref() {
        None => Method::CashOnDelivery,
        Some(raw) => match raw.parse::<Method>() {
            Ok(method) => method,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Invalid payment method"
                    })),
                )
                    .into_response();
            }
        },
    };

    let promo = match payload.promo_code.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(code) => match promo_discount(code) {
            Some(discount) => Some((code.to_owned(), discount)),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Invalid promo code"
                    })),
                )
                    .into_response();
            }
        },
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error creating order",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    // Whoever holds the token owns the order; any userId in the body is
    // ignored.
    let account = match UserEntity::find_by_id(claims.user_id).one(&txn).await {
        Ok(Some(account)) => account,
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
                    "message": "Error creating order",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    // Items come from the body when present, otherwise from the saved cart.
    let items: Vec<NewOrderItem> = match payload.items {
        Some(items) if !items.is_empty() => items
            .into_iter()
            .map(|item| {
                let name = item
                    .name
                    .map(NameField::into_localized)
                    .unwrap_or_else(|| Localized::new("Unnamed Product", "منتج بدون اسم"));
                NewOrderItem {
                    product_id: item.product_id,
                    name,
                    image: item.image.unwrap_or_default(),
                    price: item.price.unwrap_or(0.0),
                    quantity: item.quantity.filter(|&q| q > 0).unwrap_or(1),
                    discount: item.discount.unwrap_or(0.0),
                }
            })
            .collect(),
        _ => {
            let cart = match CartItemEntity::find()
                .filter(cart_item::Column::UserId.eq(claims.user_id))
                .all(&txn)
                .await
            {
                Ok(cart) => cart,
                Err(err) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "message": "Error creating order",
                            "error": err.to_string()
                        })),
                    )
                        .into_response();
                }
            };

            cart.into_iter()
                .map(|row| NewOrderItem {
                    product_id: row.product_id,
                    name: Localized::new(row.name_en, row.name_ar),
                    image: row.image,
                    price: row.price,
                    quantity: row.quantity,
                    discount: 0.0,
                })
                .collect()
        }
    };

    if items.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "No order items"
            })),
        )
            .into_response();
    }

    let computed: f32 = items
        .iter()
        .map(|item| item.price * (1.0 - item.discount / 100.0) * item.quantity as f32)
        .sum();

    let mut total = payload.total.unwrap_or(computed);
    if let Some((_, discount)) = &promo {
        total *= 1.0 - discount / 100.0;
    }

    // Missing shipping details fall back to the account profile.
    let address = payload.address.unwrap_or_default();
    let street = non_empty_or(address.street, account.street);
    let city = non_empty_or(address.city, account.city);
    let state = non_empty_or(address.state, account.state);
    let country = non_empty_or(address.country, account.country);
    let postal_code = non_empty_or(address.postal_code, account.postal_code);
    let phone = non_empty_or(payload.phone.unwrap_or_default(), account.phone);

    let now = Utc::now();
    let new_order = order::ActiveModel {
        user_id: Set(claims.user_id),
        total: Set(total),
        method: Set(method),
        status: Set(Status::Pending),
        payment_status: Set(PaymentStatus::Unpaid),
        street: Set(street),
        city: Set(city),
        state: Set(state),
        country: Set(country),
        postal_code: Set(postal_code),
        phone: Set(phone),
        promo_code: Set(promo.as_ref().map(|(code, _)| code.clone())),
        promo_discount: Set(promo.as_ref().map(|(_, discount)| *discount)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let saved = match new_order.insert(&txn).await {
        Ok(saved) => saved,
        Err(err) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error creating order",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let item_rows: Vec<order_item::ActiveModel> = items
        .iter()
        .map(|item| order_item::ActiveModel {
            order_id: Set(saved.id),
            product_id: Set(item.product_id),
            name_en: Set(item.name.en.clone()),
            name_ar: Set(item.name.ar.clone()),
            image: Set(item.image.clone()),
            price: Set(item.price),
            quantity: Set(item.quantity),
            discount: Set(item.discount),
            ..Default::default()
        })
        .collect();

    if let Err(err) = OrderItemEntity::insert_many(item_rows).exec(&txn).await {
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error creating order",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    // Placing the order empties the cart in the same transaction.
    if let Err(err) = CartItemEntity::delete_many()
        .filter(cart_item::Column::UserId.eq(claims.user_id))
        .exec(&txn)
        .await
    {
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error creating order",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    let response = match order_response(&txn, saved).await {
        Ok(response) => response,
        Err(err) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error creating order",
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
                "success": true,
                "order": response,
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error creating order",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn get_user_orders(
    Path(user_id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
) -> Response {
    let claims = match require_user(&session) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    if !can_access(&claims, user_id) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "message": "Access denied"
            })),
        )
            .into_response();
    }

    let orders = match OrderEntity::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .all(&*db)
        .await
    {
        Ok(orders) => orders,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error fetching orders",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    match order_responses(&*db, orders).await {
        Ok(orders) => (StatusCode::OK, Json(json!({ "orders": orders }))).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error fetching orders",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn get_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
) -> Response {
    let claims = match require_user(&session) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    let order = match OrderEntity::find_by_id(id).one(&*db).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "message": "Order not found"
                })),
            )
                .into_response();
        }
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error fetching order",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    if !can_access(&claims, order.user_id) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "message": "Access denied"
            })),
        )
            .into_response();
    }

    match order_response(&*db, order).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error fetching order",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn get_all_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
) -> Response {
    if let Err(response) = require_admin(&session) {
        return response;
    }

    let orders = match OrderEntity::find()
        .order_by_desc(order::Column::CreatedAt)
        .all(&*db)
        .await
    {
        Ok(orders) => orders,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error fetching orders",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let user_ids: Vec<i32> = orders.iter().map(|order| order.user_id).collect();
    let users: HashMap<i32, user::Model> = match UserEntity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(&*db)
        .await
    {
        Ok(users) => users.into_iter().map(|user| (user.id, user)).collect(),
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error fetching orders",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let mut responses = match order_responses(&*db, orders).await {
        Ok(responses) => responses,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error fetching orders",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    // The admin table shows who placed each order.
    for response in &mut responses {
        if let Some(id) = response.user.as_i64() {
            if let Some(user) = users.get(&(id as i32)) {
                response.user = json!({
                    "id": user.id,
                    "name": user.name,
                    "email": user.email,
                });
            }
        }
    }

    (StatusCode::OK, Json(json!({ "orders": responses }))).into_response()
}

async fn update_order_status(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
    payload: Result<Json<UpdateStatusPayload>, JsonRejection>,
) -> Response {
    if let Err(response) = require_admin(&session) {
        return response;
    }

    // Anything that does not decode into a known status is rejected; there
    // is no transition ordering beyond that.
    let status = match payload {
        Ok(Json(payload)) => payload.status,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "Invalid status"
                })),
            )
                .into_response();
        }
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating order",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let order = match OrderEntity::find_by_id(id).one(&txn).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "message": "Order not found"
                })),
            )
                .into_response();
        }
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating order",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let mut active: order::ActiveModel = order.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());

    let updated = match active.update(&txn).await {
        Ok(updated) => updated,
        Err(err) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating order",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let response = match order_response(&txn, updated).await {
        Ok(response) => response,
        Err(err) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating order",
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
                "message": "Order status updated",
                "order": response,
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error updating order",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn delete_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
) -> Response {
    if let Err(response) = require_admin(&session) {
        return response;
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error deleting order",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let order = match OrderEntity::find_by_id(id).one(&txn).await {
        Ok(Some(order)) => order,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "message": "Order not found"
                })),
            )
                .into_response();
        }
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error deleting order",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let active: order::ActiveModel = order.into();
    if let Err(err) = active.delete(&txn).await {
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error deleting order",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    match txn.commit().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "message": "Order deleted"
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error deleting order",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

//helpers
fn can_access(claims: &Claims, owner_id: i32) -> bool {
    claims.user_id == owner_id || claims.role == crate::entities::user::Role::Admin
}

fn non_empty_or(value: String, fallback: String) -> String {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

async fn order_response<C: ConnectionTrait>(
    conn: &C,
    order: order::Model,
) -> Result<OrderResponse, DbErr> {
    let items = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .all(conn)
        .await?;

    Ok(OrderResponse::new(order, items))
}

async fn order_responses<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderResponse>, DbErr> {
    let ids: Vec<i32> = orders.iter().map(|order| order.id).collect();

    let mut items_by_order: HashMap<i32, Vec<order_item::Model>> = HashMap::new();
    for item in OrderItemEntity::find()
        .filter(order_item::Column::OrderId.is_in(ids))
        .all(conn)
        .await?
    {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            OrderResponse::new(order, items)
        })
        .collect())
}

//structs
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateOrderPayload {
    items: Option<Vec<OrderItemPayload>>,
    total: Option<f32>,
    method: Option<String>,
    address: Option<Address>,
    phone: Option<String>,
    promo_code: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct OrderItemPayload {
    product_id: i32,
    name: Option<NameField>,
    image: Option<String>,
    price: Option<f32>,
    quantity: Option<i32>,
    discount: Option<f32>,
}

struct NewOrderItem {
    product_id: i32,
    name: Localized,
    image: String,
    price: f32,
    quantity: i32,
    discount: f32,
}

#[derive(Deserialize, Clone, Debug)]
struct UpdateStatusPayload {
    status: Status,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i32,
    pub user: Value,
    pub total: f32,
    pub method: Method,
    pub status: Status,
    pub payment_status: PaymentStatus,
    pub address: Address,
    pub phone: String,
    pub promo_code: Option<String>,
    pub promo_discount: Option<f32>,
    pub items: Vec<OrderItemResponse>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: i32,
    pub product_id: i32,
    pub name: Localized,
    pub image: String,
    pub price: f32,
    pub quantity: i32,
    pub discount: f32,
}

impl OrderResponse {
    fn new(order: order::Model, items: Vec<order_item::Model>) -> OrderResponse {
        OrderResponse {
            id: order.id,
            user: json!(order.user_id),
            total: order.total,
            method: order.method,
            status: order.status,
            payment_status: order.payment_status,
            address: Address {
                street: order.street,
                city: order.city,
                state: order.state,
                country: order.country,
                postal_code: order.postal_code,
            },
            phone: order.phone,
            promo_code: order.promo_code,
            promo_discount: order.promo_discount,
            items: items
                .into_iter()
                .map(|item| OrderItemResponse {
                    id: item.id,
                    product_id: item.product_id,
                    name: Localized::new(item.name_en, item.name_ar),
                    image: item.image,
                    price: item.price,
                    quantity: item.quantity,
                    discount: item.discount,
                })
                .collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}
