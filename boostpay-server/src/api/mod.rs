//! HTTP API.
//!
//! # Endpoints
//!
//! - `POST /api/notify` – email the operator about a submitted payment

mod notify;

use crate::state::AppState;
use axum::{Router, routing::post};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/notify", post(notify::notify))
}
