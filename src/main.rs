use sea_orm::Database;
use std::sync::Arc;

use mega_mart_backend::api::create_api_router;
use mega_mart_backend::entities::setup_schema;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://megamart.db?mode=rwc".to_owned());

    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to the database");

    setup_schema(&db).await.expect("Failed to set up schema");

    let shared_db = Arc::new(db);
    let app = create_api_router(shared_db);

    let port = std::env::var("PORT").unwrap_or_else(|_| "4000".to_owned());
    let addr = format!("0.0.0.0:{}", port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    tracing::info!(%addr, "server listening");

    axum::serve(listener, app).await.expect("Server crashed");
}
