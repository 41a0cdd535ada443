mod common;

use common::{register_and_login, spawn_app, TestApp};
use serde_json::{json, Value};

async fn fill_cart(app: &TestApp, token: &str) {
    let res = app
        .client
        .put(format!("{}/api/users/me/cart", app.address))
        .bearer_auth(token)
        .json(&json!({
            "cart": [
                {
                    "productId": 1,
                    "name": { "en": "Phone", "ar": "هاتف" },
                    "price": 100.0,
                    "quantity": 2
                },
                {
                    "productId": 2,
                    "name": { "en": "Case", "ar": "غطاء" },
                    "price": 10.0,
                    "quantity": 1
                }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn order_belongs_to_the_token_holder_and_clears_the_cart() {
    //1. Boot the app and fill a user's cart
    let app = spawn_app().await;
    let (user_id, token) = register_and_login(&app, "buyer@example.com", None).await;
    fill_cart(&app, &token).await;

    //2. Create an order; the body tries to claim another user
    let res = app
        .client
        .post(format!("{}/api/orders", app.address))
        .bearer_auth(&token)
        .json(&json!({
            "userId": 9999,
            "method": "Cash on Delivery",
            "address": {
                "street": "1 Main St",
                "city": "Cairo",
                "country": "Egypt"
            },
            "phone": "0100000000"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 201);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);

    //3. The order is owned by the token holder, not the body
    let order = &body["order"];
    assert_eq!(order["user"].as_i64().unwrap() as i32, user_id);
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["paymentStatus"], "Unpaid");
    assert_eq!(order["total"], 210.0);
    assert_eq!(order["items"].as_array().unwrap().len(), 2);

    //4. Placing the order emptied the cart
    let res = app
        .client
        .get(format!("{}/api/users/me/cart", app.address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let cart: Value = res.json().await.unwrap();
    assert!(cart.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_cart_and_empty_body_cannot_order() {
    let app = spawn_app().await;
    let (_, token) = register_and_login(&app, "buyer2@example.com", None).await;

    let res = app
        .client
        .post(format!("{}/api/orders", app.address))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "No order items");
}

#[tokio::test]
async fn order_access_is_owner_or_admin() {
    //1. One buyer places an order
    let app = spawn_app().await;
    let (buyer_id, buyer) = register_and_login(&app, "buyer3@example.com", None).await;
    let (_, stranger) = register_and_login(&app, "stranger@example.com", None).await;
    let (_, admin) = register_and_login(&app, "admin@example.com", Some("admin")).await;
    fill_cart(&app, &buyer).await;

    let res = app
        .client
        .post(format!("{}/api/orders", app.address))
        .bearer_auth(&buyer)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let body: Value = res.json().await.unwrap();
    let order_id = body["order"]["id"].as_i64().unwrap();

    //2. The owner and the admin can read it
    for token in [&buyer, &admin] {
        let res = app
            .client
            .get(format!("{}/api/orders/{}", app.address, order_id))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
    }

    //3. A stranger is turned away
    let res = app
        .client
        .get(format!("{}/api/orders/{}", app.address, order_id))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Access denied");

    //4. Order history is likewise owner-or-admin
    let res = app
        .client
        .get(format!("{}/api/orders/user/{}", app.address, buyer_id))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    let res = app
        .client
        .get(format!("{}/api/orders/user/{}", app.address, buyer_id))
        .bearer_auth(&buyer)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["orders"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn status_updates_accept_any_known_value_in_any_order() {
    //1. Place an order
    let app = spawn_app().await;
    let (_, buyer) = register_and_login(&app, "buyer4@example.com", None).await;
    let (_, admin) = register_and_login(&app, "admin2@example.com", Some("admin")).await;
    fill_cart(&app, &buyer).await;

    let res = app
        .client
        .post(format!("{}/api/orders", app.address))
        .bearer_auth(&buyer)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let order_id = body["order"]["id"].as_i64().unwrap();

    //2. Jumping straight to Delivered is accepted, and so is going back
    for status in ["Delivered", "Pending", "Cancelled"] {
        let res = app
            .client
            .put(format!("{}/api/orders/{}/status", app.address, order_id))
            .bearer_auth(&admin)
            .json(&json!({ "status": status }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["order"]["status"], status);
    }

    //3. An unknown value is rejected
    let res = app
        .client
        .put(format!("{}/api/orders/{}/status", app.address, order_id))
        .bearer_auth(&admin)
        .json(&json!({ "status": "Teleported" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid status");

    //4. Non-admins cannot touch status at all
    let res = app
        .client
        .put(format!("{}/api/orders/{}/status", app.address, order_id))
        .bearer_auth(&buyer)
        .json(&json!({ "status": "Shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
}

#[tokio::test]
async fn promo_codes_are_validated_server_side() {
    //1. A known code discounts the total and is stored on the order
    let app = spawn_app().await;
    let (_, buyer) = register_and_login(&app, "buyer5@example.com", None).await;
    fill_cart(&app, &buyer).await;

    let res = app
        .client
        .post(format!("{}/api/orders", app.address))
        .bearer_auth(&buyer)
        .json(&json!({ "promoCode": "MEGA10" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order"]["promoCode"], "MEGA10");
    assert_eq!(body["order"]["promoDiscount"], 10.0);
    assert_eq!(body["order"]["total"], 189.0);

    //2. An unknown code is rejected outright
    fill_cart(&app, &buyer).await;
    let res = app
        .client
        .post(format!("{}/api/orders", app.address))
        .bearer_auth(&buyer)
        .json(&json!({ "promoCode": "TOTALLYFAKE" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Invalid promo code");
}

#[tokio::test]
async fn admin_list_attaches_buyer_details() {
    //1. Two buyers order, an admin lists everything
    let app = spawn_app().await;
    let (_, first) = register_and_login(&app, "buyer6a@example.com", None).await;
    let (_, second) = register_and_login(&app, "buyer6b@example.com", None).await;
    let (_, admin) = register_and_login(&app, "admin3@example.com", Some("admin")).await;

    for token in [&first, &second] {
        fill_cart(&app, token).await;
        let res = app
            .client
            .post(format!("{}/api/orders", app.address))
            .bearer_auth(token)
            .json(&json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201);
    }

    //2. The admin list shows who placed each order
    let res = app
        .client
        .get(format!("{}/api/orders", app.address))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 2);
    for order in orders {
        assert!(order["user"]["email"].as_str().unwrap().contains("buyer6"));
    }

    //3. A regular user is turned away from the full list
    let res = app
        .client
        .get(format!("{}/api/orders", app.address))
        .bearer_auth(&first)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    //4. The admin can delete an order
    let order_id = orders[0]["id"].as_i64().unwrap();
    let res = app
        .client
        .delete(format!("{}/api/orders/{}", app.address, order_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = app
        .client
        .get(format!("{}/api/orders/{}", app.address, order_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}
