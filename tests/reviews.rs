mod common;

use common::{create_product, register_and_login, spawn_app};
use serde_json::{json, Value};

async fn product_detail(app: &common::TestApp, product_id: i32) -> Value {
    let res = app
        .client
        .get(format!("{}/api/products/{}", app.address, product_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    res.json().await.unwrap()
}

#[tokio::test]
async fn first_review_sets_the_rating() {
    //1. Seed a product and a shopper
    let app = spawn_app().await;
    let (_, admin) = register_and_login(&app, "admin@example.com", Some("admin")).await;
    let product_id = create_product(&app, &admin, "Headphones", 120.0).await;
    let (_, token) = register_and_login(&app, "rev1@example.com", None).await;

    //2. Post a 4-star review
    let res = app
        .client
        .post(format!("{}/api/products/{}/reviews", app.address, product_id))
        .bearer_auth(&token)
        .json(&json!({
            "rating": 4.0,
            "comment": { "en": "Solid sound", "ar": "صوت ممتاز" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Review added");

    //3. The aggregate equals the single rating
    let product = product_detail(&app, product_id).await;
    assert_eq!(product["rating"], 4.0);
    assert_eq!(product["numReviews"], 1);
    assert_eq!(product["reviews"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn repeat_review_updates_instead_of_duplicating() {
    //1. Seed a product and one reviewer
    let app = spawn_app().await;
    let (_, admin) = register_and_login(&app, "admin2@example.com", Some("admin")).await;
    let product_id = create_product(&app, &admin, "Keyboard", 60.0).await;
    let (_, token) = register_and_login(&app, "rev2@example.com", None).await;

    //2. Review twice with different ratings
    for rating in [2.0, 5.0] {
        let res = app
            .client
            .post(format!("{}/api/products/{}/reviews", app.address, product_id))
            .bearer_auth(&token)
            .json(&json!({ "rating": rating }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201);
    }

    //3. Still one review, carrying the latest rating
    let product = product_detail(&app, product_id).await;
    assert_eq!(product["numReviews"], 1);
    assert_eq!(product["rating"], 5.0);
}

#[tokio::test]
async fn two_reviewers_average_out() {
    //1. Seed a product and two shoppers
    let app = spawn_app().await;
    let (_, admin) = register_and_login(&app, "admin3@example.com", Some("admin")).await;
    let product_id = create_product(&app, &admin, "Monitor", 300.0).await;
    let (_, first) = register_and_login(&app, "rev3a@example.com", None).await;
    let (_, second) = register_and_login(&app, "rev3b@example.com", None).await;

    //2. Ratings of 2 and 4
    for (token, rating) in [(&first, 2.0), (&second, 4.0)] {
        let res = app
            .client
            .post(format!("{}/api/products/{}/reviews", app.address, product_id))
            .bearer_auth(token)
            .json(&json!({ "rating": rating }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201);
    }

    //3. The aggregate is the mean
    let product = product_detail(&app, product_id).await;
    assert_eq!(product["numReviews"], 2);
    assert_eq!(product["rating"], 3.0);
}

#[tokio::test]
async fn deleting_the_last_review_resets_aggregates() {
    //1. Seed a product with a single review
    let app = spawn_app().await;
    let (_, admin) = register_and_login(&app, "admin4@example.com", Some("admin")).await;
    let product_id = create_product(&app, &admin, "Speaker", 90.0).await;
    let (_, token) = register_and_login(&app, "rev4@example.com", None).await;

    let res = app
        .client
        .post(format!("{}/api/products/{}/reviews", app.address, product_id))
        .bearer_auth(&token)
        .json(&json!({ "rating": 5.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let body: Value = res.json().await.unwrap();
    let review_id = body["review"]["id"].as_i64().unwrap();

    //2. The author deletes it
    let res = app
        .client
        .delete(format!(
            "{}/api/products/{}/reviews/{}",
            app.address, product_id, review_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    //3. The product goes back to zero
    let product = product_detail(&app, product_id).await;
    assert_eq!(product["rating"], 0.0);
    assert_eq!(product["numReviews"], 0);
}

#[tokio::test]
async fn only_author_or_admin_may_delete_a_review() {
    //1. Seed a product reviewed by one user
    let app = spawn_app().await;
    let (_, admin) = register_and_login(&app, "admin5@example.com", Some("admin")).await;
    let product_id = create_product(&app, &admin, "Tablet", 250.0).await;
    let (_, author) = register_and_login(&app, "rev5a@example.com", None).await;
    let (_, stranger) = register_and_login(&app, "rev5b@example.com", None).await;

    let res = app
        .client
        .post(format!("{}/api/products/{}/reviews", app.address, product_id))
        .bearer_auth(&author)
        .json(&json!({ "rating": 3.0 }))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let review_id = body["review"]["id"].as_i64().unwrap();

    //2. A different shopper is turned away
    let res = app
        .client
        .delete(format!(
            "{}/api/products/{}/reviews/{}",
            app.address, product_id, review_id
        ))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Not authorized");

    //3. The admin may remove it
    let res = app
        .client
        .delete(format!(
            "{}/api/products/{}/reviews/{}",
            app.address, product_id, review_id
        ))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
}

#[tokio::test]
async fn out_of_range_rating_is_rejected() {
    let app = spawn_app().await;
    let (_, admin) = register_and_login(&app, "admin6@example.com", Some("admin")).await;
    let product_id = create_product(&app, &admin, "Mouse", 25.0).await;
    let (_, token) = register_and_login(&app, "rev6@example.com", None).await;

    for rating in [0.0, 6.0] {
        let res = app
            .client
            .post(format!("{}/api/products/{}/reviews", app.address, product_id))
            .bearer_auth(&token)
            .json(&json!({ "rating": rating }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 400);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["message"], "Rating must be between 1 and 5");
    }
}
