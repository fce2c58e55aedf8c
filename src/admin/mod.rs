//! Reporting API over the counter table.
//!
//! # Routes
//! - `GET /admin/status`: version, downstream target, table
//! - `GET /admin/hits`: every counter record, sorted by path
//! - `GET /admin/hits/{*path}`: one record (zero if unseen); `/admin/hits/` is the root path
//! - `GET /admin/viewer`: HTML table of the records

pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::store::CounterStore;
use self::handlers::*;

/// State shared by the reporting handlers.
#[derive(Clone)]
pub struct AdminState {
    pub store: Arc<dyn CounterStore>,
    pub table: String,
    pub target: String,
    pub title: String,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/hits", get(list_hits))
        .route("/admin/hits/", get(get_root_hits))
        .route("/admin/hits/{*path}", get(get_hits))
        .route("/admin/viewer", get(viewer))
        .with_state(state)
}
