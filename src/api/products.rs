use axum::{
    extract::{FromRequest, Multipart, Path, Query, Request},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::fs as tokio_fs;
use uuid::Uuid;

use crate::api::uploads::{file_size_limit, uploads_dir};
use crate::api::reviews::ReviewResponse;
use crate::api::Localized;
use crate::entities::product::{self, Entity as ProductEntity};
use crate::entities::product_image::{self, Entity as ProductImageEntity};
use crate::entities::review::{self, Entity as ReviewEntity};
use crate::middleware::auth::{require_admin, AuthSession};

//ROUTERS
pub fn products_router() -> Router {
    Router::new()
        .route("/products", get(get_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

//ROUTES
async fn get_products(
    Query(params): Query<GetProductsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let mut condition = Condition::all();

    // Keyword search: case-insensitive substring across every localized
    // name/description/category column, any match wins.
    if let Some(keyword) = params.keyword.as_deref().map(str::trim) {
        if !keyword.is_empty() {
            condition = condition.add(
                Condition::any()
                    .add(product::Column::NameEn.contains(keyword))
                    .add(product::Column::NameAr.contains(keyword))
                    .add(product::Column::DescriptionEn.contains(keyword))
                    .add(product::Column::DescriptionAr.contains(keyword))
                    .add(product::Column::CategoryEn.contains(keyword))
                    .add(product::Column::CategoryAr.contains(keyword)),
            );
        }
    }

    // Category filter arrives as "lang:value".
    if let Some(category) = params.category.as_deref() {
        if let Some((lang, value)) = category.split_once(':') {
            match lang {
                "en" => condition = condition.add(product::Column::CategoryEn.eq(value)),
                "ar" => condition = condition.add(product::Column::CategoryAr.eq(value)),
                _ => {}
            }
        }
    }

    if let Some(min) = params.min_price {
        condition = condition.add(product::Column::Price.gte(min));
    }

    if let Some(max) = params.max_price {
        condition = condition.add(product::Column::Price.lte(max));
    }

    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(200).max(1);

    let total = match ProductEntity::find()
        .filter(condition.clone())
        .count(&*db)
        .await
    {
        Ok(total) => total,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error fetching products",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let products = match ProductEntity::find()
        .filter(condition)
        .order_by_desc(product::Column::CreatedAt)
        .offset((page - 1) * limit)
        .limit(limit)
        .all(&*db)
        .await
    {
        Ok(products) => products,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error fetching products",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let products = match product_responses(&*db, products).await {
        Ok(products) => products,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error fetching products",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "page": page,
            "totalPages": total.div_ceil(limit),
            "totalProducts": total,
            "products": products,
        })),
    )
        .into_response()
}

async fn get_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match ProductEntity::find_by_id(id).one(&*db).await {
        Ok(Some(prod)) => match product_response(&*db, prod).await {
            Ok(response) => (StatusCode::OK, Json(response)).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error fetching product",
                    "error": err.to_string()
                })),
            )
                .into_response(),
        },
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "message": "Product not found"
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error fetching product",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
    req: Request,
) -> Response {
    if let Err(response) = require_admin(&session) {
        return response;
    }

    let (payload, uploaded) = if is_multipart(&req) {
        let multipart = match Multipart::from_request(req, &()).await {
            Ok(multipart) => multipart,
            Err(err) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Error creating product",
                        "error": err.to_string()
                    })),
                )
                    .into_response();
            }
        };

        let (data, uploaded) = match read_multipart(multipart).await {
            Ok(parts) => parts,
            Err(response) => return response,
        };

        let data = match data {
            Some(data) => data,
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Missing product data"
                    })),
                )
                    .into_response();
            }
        };

        let payload: CreateProductPayload = match serde_json::from_str(&data) {
            Ok(payload) => payload,
            Err(err) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Error creating product",
                        "error": err.to_string()
                    })),
                )
                    .into_response();
            }
        };

        (payload, uploaded)
    } else {
        match Json::<CreateProductPayload>::from_request(req, &()).await {
            Ok(Json(payload)) => (payload, Vec::new()),
            Err(err) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Error creating product",
                        "error": err.to_string()
                    })),
                )
                    .into_response();
            }
        }
    };

    if payload.price < 0.0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Error creating product",
                "error": "Price must be non-negative"
            })),
        )
            .into_response();
    }

    // Uploaded files win over any image urls in the JSON body; the first
    // image doubles as the main image unless one was named explicitly.
    let images: Vec<StoredImage> = if uploaded.is_empty() {
        payload
            .images
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|image| StoredImage {
                url: image.url,
                public_id: image.public_id,
            })
            .collect()
    } else {
        uploaded
    };

    let main_image = payload
        .main_image
        .clone()
        .map(|image| StoredImage {
            url: image.url,
            public_id: image.public_id,
        })
        .or_else(|| images.first().cloned());

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error creating product",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let now = Utc::now();
    let new_product = product::ActiveModel {
        name_en: Set(payload.name.en),
        name_ar: Set(payload.name.ar),
        description_en: Set(payload.description.en),
        description_ar: Set(payload.description.ar),
        category_en: Set(payload.category.en),
        category_ar: Set(payload.category.ar),
        price: Set(payload.price),
        brand: Set(payload.brand.unwrap_or_else(|| "Generic".to_owned())),
        colors: Set(payload.colors.map(|v| json!(v))),
        storage: Set(payload.storage.map(|v| json!(v))),
        sizes: Set(payload.sizes.map(|v| json!(v))),
        main_image_url: Set(main_image.as_ref().map(|image| image.url.clone())),
        main_image_public_id: Set(main_image.as_ref().map(|image| image.public_id.clone())),
        stock: Set(payload.stock.unwrap_or(0)),
        rating: Set(0.0),
        num_reviews: Set(0),
        is_featured: Set(payload.is_featured.unwrap_or(false)),
        discount: Set(payload.discount.unwrap_or(0.0)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let saved = match sea_orm::ActiveModelTrait::insert(new_product, &txn).await {
        Ok(saved) => saved,
        Err(err) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "Error creating product",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let image_rows: Vec<product_image::ActiveModel> = images
        .iter()
        .map(|image| product_image::ActiveModel {
            product_id: Set(saved.id),
            url: Set(image.url.clone()),
            public_id: Set(image.public_id.clone()),
            ..Default::default()
        })
        .collect();

    if let Err(err) = ProductImageEntity::insert_many(image_rows)
        .on_empty_do_nothing()
        .exec(&txn)
        .await
    {
        let _ = txn.rollback().await;
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error creating product",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    let response = match product_response(&txn, saved).await {
        Ok(response) => response,
        Err(err) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error creating product",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    match txn.commit().await {
        Ok(_) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error creating product",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn update_product(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(session): Extension<AuthSession>,
    req: Request,
) -> Response {
    if let Err(response) = require_admin(&session) {
        return response;
    }

    let (payload, uploaded) = if is_multipart(&req) {
        let multipart = match Multipart::from_request(req, &()).await {
            Ok(multipart) => multipart,
            Err(err) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Error updating product",
                        "error": err.to_string()
                    })),
                )
                    .into_response();
            }
        };

        let (data, uploaded) = match read_multipart(multipart).await {
            Ok(parts) => parts,
            Err(response) => return response,
        };

        let payload: UpdateProductPayload = match data {
            Some(data) => match serde_json::from_str(&data) {
                Ok(payload) => payload,
                Err(err) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "message": "Error updating product",
                            "error": err.to_string()
                        })),
                    )
                        .into_response();
                }
            },
            None => UpdateProductPayload::default(),
        };

        (payload, uploaded)
    } else {
        match Json::<UpdateProductPayload>::from_request(req, &()).await {
            Ok(Json(payload)) => (payload, Vec::new()),
            Err(err) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Error updating product",
                        "error": err.to_string()
                    })),
                )
                    .into_response();
            }
        }
    };

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating product",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let existing = match ProductEntity::find_by_id(id).one(&txn).await {
        Ok(Some(existing)) => existing,
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
                    "message": "Error updating product",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let mut active: product::ActiveModel = existing.into();

    if let Some(name) = payload.name {
        active.name_en = Set(name.en);
        active.name_ar = Set(name.ar);
    }

    if let Some(description) = payload.description {
        active.description_en = Set(description.en);
        active.description_ar = Set(description.ar);
    }

    if let Some(category) = payload.category {
        active.category_en = Set(category.en);
        active.category_ar = Set(category.ar);
    }

    if let Some(price) = payload.price {
        if price < 0.0 {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "message": "Error updating product",
                    "error": "Price must be non-negative"
                })),
            )
                .into_response();
        }
        active.price = Set(price);
    }

    if let Some(brand) = payload.brand {
        active.brand = Set(brand);
    }

    if let Some(colors) = payload.colors {
        active.colors = Set(Some(json!(colors)));
    }

    if let Some(storage) = payload.storage {
        active.storage = Set(Some(json!(storage)));
    }

    if let Some(sizes) = payload.sizes {
        active.sizes = Set(Some(json!(sizes)));
    }

    if let Some(stock) = payload.stock {
        active.stock = Set(stock);
    }

    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }

    if let Some(discount) = payload.discount {
        active.discount = Set(discount);
    }

    // New uploads replace the whole gallery; there is no per-image patch.
    if !uploaded.is_empty() {
        let old_images = match ProductImageEntity::find()
            .filter(product_image::Column::ProductId.eq(id))
            .all(&txn)
            .await
        {
            Ok(old_images) => old_images,
            Err(err) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "message": "Error updating product",
                        "error": err.to_string()
                    })),
                )
                    .into_response();
            }
        };

        for image in &old_images {
            let _ = tokio_fs::remove_file(format!(
                "{}/{}",
                uploads_dir(),
                image.url.trim_start_matches("/uploads/")
            ))
            .await;
        }

        if let Err(err) = ProductImageEntity::delete_many()
            .filter(product_image::Column::ProductId.eq(id))
            .exec(&txn)
            .await
        {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating product",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }

        let image_rows: Vec<product_image::ActiveModel> = uploaded
            .iter()
            .map(|image| product_image::ActiveModel {
                product_id: Set(id),
                url: Set(image.url.clone()),
                public_id: Set(image.public_id.clone()),
                ..Default::default()
            })
            .collect();

        if let Err(err) = ProductImageEntity::insert_many(image_rows).exec(&txn).await {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating product",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }

        if let Some(first) = uploaded.first() {
            active.main_image_url = Set(Some(first.url.clone()));
            active.main_image_public_id = Set(Some(first.public_id.clone()));
        }
    } else if let Some(main_image) = payload.main_image {
        active.main_image_url = Set(Some(main_image.url));
        active.main_image_public_id = Set(Some(main_image.public_id));
    }

    active.updated_at = Set(Utc::now());

    let updated = match sea_orm::ActiveModelTrait::update(active, &txn).await {
        Ok(updated) => updated,
        Err(err) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating product",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let response = match product_response(&txn, updated).await {
        Ok(response) => response,
        Err(err) => {
            let _ = txn.rollback().await;
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Error updating product",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    match txn.commit().await {
        Ok(_) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error updating product",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

async fn delete_product(
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
                    "message": "Error deleting product",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    let product = match ProductEntity::find_by_id(id).one(&txn).await {
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
                    "message": "Error deleting product",
                    "error": err.to_string()
                })),
            )
                .into_response();
        }
    };

    // Best effort cleanup of stored files; the rows cascade with the product.
    if let Ok(images) = ProductImageEntity::find()
        .filter(product_image::Column::ProductId.eq(id))
        .all(&txn)
        .await
    {
        for image in images {
            let _ = tokio_fs::remove_file(format!(
                "{}/{}",
                uploads_dir(),
                image.url.trim_start_matches("/uploads/")
            ))
            .await;
        }
    }

    let active: product::ActiveModel = product.into();
    if let Err(err) = sea_orm::ActiveModelTrait::delete(active, &txn).await {
        let _ = txn.rollback().await;
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Error deleting product",
                "error": err.to_string()
            })),
        )
            .into_response();
    }

    match txn.commit().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "message": "Product deleted"
            })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "message": "Error deleting product",
                "error": err.to_string()
            })),
        )
            .into_response(),
    }
}

//multipart handling
fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(Option<String>, Vec<StoredImage>), Response> {
    let mut data: Option<String> = None;
    let mut images: Vec<StoredImage> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Malformed multipart body",
                        "error": err.to_string()
                    })),
                )
                    .into_response());
            }
        };

        if field.name() == Some("data") {
            data = match field.text().await {
                Ok(text) => Some(text),
                Err(err) => {
                    return Err((
                        StatusCode::BAD_REQUEST,
                        Json(json!({
                            "message": "Malformed multipart body",
                            "error": err.to_string()
                        })),
                    )
                        .into_response());
                }
            };
            continue;
        }

        let content_type = match field.content_type() {
            Some(content_type) => content_type.to_owned(),
            None => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Content type is not set"
                    })),
                )
                    .into_response());
            }
        };

        let extension = match allowed_content_types().get(content_type.as_str()) {
            Some(&extension) => extension,
            None => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Unsupported content type"
                    })),
                )
                    .into_response());
            }
        };

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Failed to read file bytes",
                        "error": err.to_string()
                    })),
                )
                    .into_response());
            }
        };

        if bytes.len() > file_size_limit() {
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({
                    "message": "Payload too large"
                })),
            )
                .into_response());
        }

        let id = Uuid::new_v4().to_string();
        let file_name = format!("{}.{}", id, extension);

        if let Err(err) = tokio_fs::create_dir_all(uploads_dir()).await {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to upload file to the server",
                    "error": err.to_string()
                })),
            )
                .into_response());
        }

        if let Err(err) = tokio_fs::write(format!("{}/{}", uploads_dir(), file_name), &bytes).await
        {
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Failed to upload file to the server",
                    "error": err.to_string()
                })),
            )
                .into_response());
        }

        images.push(StoredImage {
            url: format!("/uploads/{}", file_name),
            public_id: id,
        });
    }

    Ok((data, images))
}

fn allowed_content_types() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("image/jpeg", "jpg"),
        ("image/png", "png"),
        ("image/webp", "webp"),
    ])
}

//response assembly
pub(crate) async fn product_response<C: ConnectionTrait>(
    conn: &C,
    product: product::Model,
) -> Result<ProductResponse, DbErr> {
    let images = ProductImageEntity::find()
        .filter(product_image::Column::ProductId.eq(product.id))
        .all(conn)
        .await?;

    let reviews = ReviewEntity::find()
        .filter(review::Column::ProductId.eq(product.id))
        .all(conn)
        .await?;

    Ok(ProductResponse::new(product, images, reviews))
}

pub(crate) async fn product_responses<C: ConnectionTrait>(
    conn: &C,
    products: Vec<product::Model>,
) -> Result<Vec<ProductResponse>, DbErr> {
    let ids: Vec<i32> = products.iter().map(|product| product.id).collect();

    let mut images_by_product: HashMap<i32, Vec<product_image::Model>> = HashMap::new();
    for image in ProductImageEntity::find()
        .filter(product_image::Column::ProductId.is_in(ids.clone()))
        .all(conn)
        .await?
    {
        images_by_product
            .entry(image.product_id)
            .or_default()
            .push(image);
    }

    let mut reviews_by_product: HashMap<i32, Vec<review::Model>> = HashMap::new();
    for review in ReviewEntity::find()
        .filter(review::Column::ProductId.is_in(ids))
        .all(conn)
        .await?
    {
        reviews_by_product
            .entry(review.product_id)
            .or_default()
            .push(review);
    }

    Ok(products
        .into_iter()
        .map(|product| {
            let images = images_by_product.remove(&product.id).unwrap_or_default();
            let reviews = reviews_by_product.remove(&product.id).unwrap_or_default();
            ProductResponse::new(product, images, reviews)
        })
        .collect())
}

//structs
#[derive(Deserialize)]
struct GetProductsQuery {
    keyword: Option<String>,
    page: Option<u64>,
    limit: Option<u64>,
    category: Option<String>,
    #[serde(rename = "minPrice")]
    min_price: Option<f32>,
    #[serde(rename = "maxPrice")]
    max_price: Option<f32>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateProductPayload {
    name: Localized,
    description: Localized,
    category: Localized,
    price: f32,
    brand: Option<String>,
    colors: Option<Vec<String>>,
    storage: Option<Vec<String>>,
    sizes: Option<Vec<String>>,
    stock: Option<i32>,
    is_featured: Option<bool>,
    discount: Option<f32>,
    images: Option<Vec<ImagePayload>>,
    main_image: Option<ImagePayload>,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct UpdateProductPayload {
    name: Option<Localized>,
    description: Option<Localized>,
    category: Option<Localized>,
    price: Option<f32>,
    brand: Option<String>,
    colors: Option<Vec<String>>,
    storage: Option<Vec<String>>,
    sizes: Option<Vec<String>>,
    stock: Option<i32>,
    is_featured: Option<bool>,
    discount: Option<f32>,
    main_image: Option<ImagePayload>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
struct ImagePayload {
    url: String,
    public_id: String,
}

#[derive(Clone, Debug)]
struct StoredImage {
    url: String,
    public_id: String,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: i32,
    pub name: Localized,
    pub description: Localized,
    pub category: Localized,
    pub price: f32,
    pub brand: String,
    pub colors: Option<Value>,
    pub storage: Option<Value>,
    pub sizes: Option<Value>,
    pub main_image: Option<ImageResponse>,
    pub images: Vec<ImageResponse>,
    pub stock: i32,
    pub rating: f32,
    pub num_reviews: i32,
    pub reviews: Vec<ReviewResponse>,
    pub is_featured: bool,
    pub discount: f32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Clone, Debug)]
pub struct ImageResponse {
    pub url: String,
    pub public_id: String,
}

impl ProductResponse {
    fn new(
        product: product::Model,
        images: Vec<product_image::Model>,
        reviews: Vec<review::Model>,
    ) -> ProductResponse {
        let main_image = match (product.main_image_url, product.main_image_public_id) {
            (Some(url), Some(public_id)) => Some(ImageResponse { url, public_id }),
            (Some(url), None) => Some(ImageResponse {
                url,
                public_id: String::new(),
            }),
            _ => None,
        };

        ProductResponse {
            id: product.id,
            name: Localized::new(product.name_en, product.name_ar),
            description: Localized::new(product.description_en, product.description_ar),
            category: Localized::new(product.category_en, product.category_ar),
            price: product.price,
            brand: product.brand,
            colors: product.colors,
            storage: product.storage,
            sizes: product.sizes,
            main_image,
            images: images
                .into_iter()
                .map(|image| ImageResponse {
                    url: image.url,
                    public_id: image.public_id,
                })
                .collect(),
            stock: product.stock,
            rating: product.rating,
            num_reviews: product.num_reviews,
            reviews: reviews.into_iter().map(ReviewResponse::new).collect(),
            is_featured: product.is_featured,
            discount: product.discount,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}
