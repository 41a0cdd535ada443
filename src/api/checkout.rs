use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::api::NameField;

const STRIPE_SESSIONS_URL: &str = "https://api.stripe.com/v1/checkout/sessions";

// The promo table the cart understands. Validation happens here on the
// server so a made-up code is rejected before money moves.
static PROMO_CODES: Lazy<HashMap<&'static str, f32>> =
    Lazy::new(|| HashMap::from([("MEGA10", 10.0), ("MEGA20", 20.0)]));

pub(crate) fn promo_discount(code: &str) -> Option<f32> {
    PROMO_CODES.get(code).copied()
}

//ROUTERS
pub fn checkout_router() -> Router {
    Router::new().route("/create-checkout-session", post(create_checkout_session))
}

//ROUTES
async fn create_checkout_session(Json(payload): Json<CheckoutPayload>) -> Response {
    let items = payload.items.unwrap_or_default();
    if items.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "No items provided in the request body."
            })),
        )
            .into_response();
    }

    let secret_key = match std::env::var("STRIPE_SECRET_KEY") {
        Ok(key) => key,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Stripe is not configured"
                })),
            )
                .into_response();
        }
    };

    let client_url =
        std::env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

    // Redirects land back on the locale the shopper was browsing in.
    let base = match payload.locale.as_deref() {
        Some(locale) if locale == "en" || locale == "ar" => format!("{}/{}", client_url, locale),
        _ => client_url,
    };

    let mut params: Vec<(String, String)> = vec![
        ("mode".to_owned(), "payment".to_owned()),
        (
            "success_url".to_owned(),
            format!("{}/success?session_id={{CHECKOUT_SESSION_ID}}", base),
        ),
        ("cancel_url".to_owned(), format!("{}/cart", base)),
    ];

    for (index, item) in items.iter().enumerate() {
        let name = item
            .name
            .clone()
            .map(|name| name.into_localized().en)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "Unnamed Product".to_owned());

        let unit_amount = unit_amount(item);
        let quantity = item.quantity.filter(|&q| q > 0).unwrap_or(1);

        params.push((
            format!("line_items[{}][price_data][currency]", index),
            "egp".to_owned(),
        ));
        params.push((
            format!("line_items[{}][price_data][product_data][name]", index),
            name,
        ));
        params.push((
            format!("line_items[{}][price_data][unit_amount]", index),
            unit_amount.to_string(),
        ));
        params.push((
            format!("line_items[{}][quantity]", index),
            quantity.to_string(),
        ));
    }

    // The order details ride along in metadata so the confirmation page can
    // reconstruct what was bought.
    if let Some(order_data) = payload.order_data {
        params.push(("metadata[orderData]".to_owned(), order_data.to_string()));
    }

    let client = reqwest::Client::new();
    let response = match client
        .post(STRIPE_SESSIONS_URL)
        .bearer_auth(&secret_key)
        .form(&params)
        .send()
        .await
    {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, "stripe request failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to create checkout session"
                })),
            )
                .into_response();
        }
    };

    let status = response.status();
    let body: Value = match response.json().await {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(error = %err, "stripe response was not json");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to create checkout session"
                })),
            )
                .into_response();
        }
    };

    if !status.is_success() {
        let message = body
            .pointer("/error/message")
            .and_then(Value::as_str)
            .unwrap_or("Failed to create checkout session")
            .to_owned();
        tracing::error!(status = %status, message = %message, "stripe rejected session");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": message })),
        )
            .into_response();
    }

    match body.get("url").and_then(Value::as_str) {
        Some(url) => (StatusCode::OK, Json(json!({ "url": url }))).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Failed to create checkout session"
            })),
        )
            .into_response(),
    }
}

// A positive discountPrice wins; otherwise the percentage discount comes off
// the list price. Stripe takes the amount in piastres.
fn unit_amount(item: &CheckoutItem) -> i64 {
    let unit_price = match item.discount_price {
        Some(discount_price) if discount_price > 0.0 => discount_price,
        _ => item.price * (1.0 - item.discount.unwrap_or(0.0) / 100.0),
    };
    (unit_price * 100.0).round().max(0.0) as i64
}

//structs
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct CheckoutPayload {
    items: Option<Vec<CheckoutItem>>,
    locale: Option<String>,
    order_data: Option<Value>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
struct CheckoutItem {
    name: Option<NameField>,
    price: f32,
    discount_price: Option<f32>,
    discount: Option<f32>,
    quantity: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::{unit_amount, CheckoutItem};

    fn item(price: f32, discount_price: Option<f32>, discount: Option<f32>) -> CheckoutItem {
        CheckoutItem {
            name: None,
            price,
            discount_price,
            discount,
            quantity: None,
        }
    }

    #[test]
    fn list_price_converts_to_piastres() {
        assert_eq!(unit_amount(&item(499.5, None, None)), 49950);
    }

    #[test]
    fn positive_discount_price_wins_over_percentage() {
        assert_eq!(unit_amount(&item(100.0, Some(80.0), Some(50.0))), 8000);
    }

    #[test]
    fn zero_discount_price_falls_back_to_percentage() {
        assert_eq!(unit_amount(&item(200.0, Some(0.0), Some(10.0))), 18000);
    }

    #[test]
    fn amount_never_goes_negative() {
        assert_eq!(unit_amount(&item(50.0, None, Some(150.0))), 0);
    }
}
