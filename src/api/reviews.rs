use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, post},
    Extension, Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::api::{Localized, NameField};
use crate::entities::product::{self, Entity as ProductEntity};
use crate::entities::review::{self, Entity as ReviewEntity};
use crate::entities::user::{Entity as UserEntity, Role};
use crate::middleware::auth::{require_user, AuthSession};

//ROUTERS
pub fn reviews_router() -> Router {
    Router::new()
        .route("/products/:id/reviews", post(add_review))
        .route(
            "/products/:id/reviews/:review_id",
            delete(delete_review),
        )
}

//ROUTES
async fn add_review(
    Path(product_id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<AddReviewPayload>,
) -> Response {
    let claims = match require_user(&session) {
        Ok(claims) => claims,
        Err(response) => return response,
    };

    if !(1.0..=5.0).contains(&payload.rating) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Rating must be between 1 and 5"
            })),
        )
            .into_response();
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error adding review",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let product = match ProductEntity::find_by_id(product_id).one(&txn).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "message": "Product not found"
                })),
            )
                .into_response();
        }
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error adding review",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    // The reviewer name comes from the body when given, otherwise from the
    // account; a plain string fills both languages.
    let name = match payload.name {
        Some(name) => name.into_localized(),
        None => match UserEntity::find_by_id(claims.user_id).one(&txn).await {
            Ok(Some(user)) => Localized::new(user.name.clone(), user.name),
            _ => Localized::new("", ""),
        },
    };

    let comment = payload
        .comment
        .map(NameField::into_localized)
        .unwrap_or_else(|| Localized::new("", ""));

    let existing = match ReviewEntity::find()
        .filter(review::Column::ProductId.eq(product_id))
        .filter(review::Column::UserId.eq(claims.user_id))
        .one(&txn)
        .await
    {
        Ok(existing) => existing,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error adding review",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let now = Utc::now();
    let (saved, message) = match existing {
        Some(found) => {
            let mut active: review::ActiveModel = found.into();
            active.name_en = Set(name.en);
            active.name_ar = Set(name.ar);
            active.rating = Set(payload.rating);
            active.comment_en = Set(comment.en);
            active.comment_ar = Set(comment.ar);
            active.updated_at = Set(now);

            match active.update(&txn).await {
                Ok(saved) => (saved, "Review updated"),
                Err(err) => {
                    let _ = txn.rollback().await;
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "message": "Error adding review",
                            "error": err.to_string()
                        })),
                    )
                        .into_response();
                }
            }
        }
        None => {
            let new_review = review::ActiveModel {
                product_id: Set(product_id),
                user_id: Set(claims.user_id),
                name_en: Set(name.en),
                name_ar: Set(name.ar),
                rating: Set(payload.rating),
                comment_en: Set(comment.en),
                comment_ar: Set(comment.ar),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };

            match new_review.insert(&txn).await {
                Ok(saved) => (saved, "Review added"),
                Err(err) => {
                    let _ = txn.rollback().await;
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "message": "Error adding review",
                            "error": err.to_string()
                        })),
                    )
                        .into_response();
                }
            }
        }
    };

    if let Err(err) = recompute_rating(&txn, product).await {
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error adding review",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    match txn.commit().await {
        Ok(_) => (
            StatusCode::CREATED,
            Json(json!({
                "message": message,
                "review": ReviewResponse::new(saved),
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error adding review",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn delete_review(
    Path((product_id, review_id)): Path<(i32, i32)>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
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
                    "message": "Error deleting review",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let product = match ProductEntity::find_by_id(product_id).one(&txn).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "message": "Product not found"
                })),
            )
                .into_response();
        }
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error deleting review",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let review = match ReviewEntity::find_by_id(review_id).one(&txn).await {
        Ok(Some(review)) if review.product_id == product_id => review,
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "message": "Review not found"
                })),
            )
                .into_response();
        }
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error deleting review",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    if review.user_id != claims.user_id && claims.role != Role::Admin {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "message": "Not authorized"
            })),
        )
            .into_response();
    }

    let active: review::ActiveModel = review.into();
    if let Err(err) = active.delete(&txn).await {
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error deleting review",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    if let Err(err) = recompute_rating(&txn, product).await {
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error deleting review",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    match txn.commit().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "message": "Review deleted"
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error deleting review",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

/// Rebuilds the product's aggregate rating from its remaining reviews.
/// A product with no reviews goes back to 0 / 0.
async fn recompute_rating<C: ConnectionTrait>(
    conn: &C,
    product: product::Model,
) -> Result<(), DbErr> {
    let reviews = ReviewEntity::find()
        .filter(review::Column::ProductId.eq(product.id))
        .all(conn)
        .await?;

    let num_reviews = reviews.len() as i32;
    let rating = if reviews.is_empty() {
        0.0
    } else {
        reviews.iter().map(|review| review.rating).sum::<f32>() / reviews.len() as f32
    };

    let mut active: product::ActiveModel = product.into();
    active.rating = Set(rating);
    active.num_reviews = Set(num_reviews);
    active.updated_at = Set(Utc::now());
    active.update(conn).await?;

    Ok(())
}

//structs
#[derive(Deserialize, Clone, Debug)]
struct AddReviewPayload {
    rating: f32,
    name: Option<NameField>,
    comment: Option<NameField>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: i32,
    pub user: i32,
    pub name: Localized,
    pub rating: f32,
    pub comment: Localized,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ReviewResponse {
    pub(crate) fn new(review: review::Model) -> ReviewResponse {
        ReviewResponse {
            id: review.id,
            user: review.user_id,
            name: Localized::new(review.name_en, review.name_ar),
            rating: review.rating,
            comment: Localized::new(review.comment_en, review.comment_ar),
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}
