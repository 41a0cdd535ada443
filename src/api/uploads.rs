use axum::{
    body::Body,
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

// uuid dot extension, nothing else. Keeps traversal attempts out of the
// uploads directory.
static FILE_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F-]{36}\.[a-zA-Z0-9]{1,8}$").unwrap());

pub(crate) fn uploads_dir() -> String {
    std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_owned())
}

/// 5 MiB per uploaded image.
pub(crate) fn file_size_limit() -> usize {
    5 * 1024 * 1024
}

//ROUTERS
pub fn uploads_router() -> Router {
    Router::new().route("/uploads/:file", get(serve_upload))
}

//ROUTES
async fn serve_upload(Path(file): Path<String>) -> Response {
    if !FILE_NAME_REGEX.is_match(&file) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Invalid file name"
            })),
        )
            .into_response();
    }

    let path = format!("{}/{}", uploads_dir(), file);
    let handle = match File::open(&path).await {
        Ok(handle) => handle,
        Err(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "message": "File not found"
                })),
            )
                .into_response();
        }
    };

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let stream = ReaderStream::new(handle);

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime.as_ref().to_owned())],
        Body::from_stream(stream),
    )
        .into_response()
}
