//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod participation;
pub mod pool;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(pool::routes())
        .merge(participation::routes())
        .merge(admin::routes())
}
