use axum::{routing::get, Router};
use std::sync::Arc;
use crate::AppState;

pub mod crud;
pub mod types;
pub mod upload;

pub use crud::*;
pub use types::*;
pub use upload::*;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_documents))
        .route("/upload", get(get_upload_status).post(upload_document))
        .route("/{id}", get(get_document_by_id))
}
