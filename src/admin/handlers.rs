use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::store::{CounterRecord, StoreError};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub table: String,
    pub downstream: String,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        table: state.table.clone(),
        downstream: state.target.clone(),
    })
}

pub async fn list_hits(State(state): State<AdminState>) -> Result<Json<Vec<CounterRecord>>, Response> {
    state.store.list_all().await.map(Json).map_err(store_failure)
}

pub async fn get_hits(
    State(state): State<AdminState>,
    Path(path): Path<String>,
) -> Result<Json<CounterRecord>, Response> {
    lookup(&state, format!("/{}", path)).await
}

/// `/admin/hits/` addresses the root path, which the wildcard cannot capture.
pub async fn get_root_hits(State(state): State<AdminState>) -> Result<Json<CounterRecord>, Response> {
    lookup(&state, "/".to_string()).await
}

async fn lookup(state: &AdminState, path: String) -> Result<Json<CounterRecord>, Response> {
    let hits = state.store.get(&path).await.map_err(store_failure)?;
    Ok(Json(CounterRecord { path, hits }))
}

pub async fn viewer(State(state): State<AdminState>) -> Result<Html<String>, Response> {
    let records = state.store.list_all().await.map_err(store_failure)?;
    Ok(Html(render_table(&state.title, &records)))
}

fn store_failure(e: StoreError) -> Response {
    tracing::error!(error = %e, "Counter store read failed");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({ "error": "counter_unavailable", "message": e.to_string() })),
    )
        .into_response()
}

fn render_table(title: &str, records: &[CounterRecord]) -> String {
    let title = escape(title);
    let mut rows = String::new();
    for record in records {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(&record.path),
            record.hits
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body><h1>{title}</h1>\n<table>\n<tr><th>path</th><th>hits</th></tr>\n{rows}</table></body></html>\n",
        title = title,
        rows = rows
    )
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
