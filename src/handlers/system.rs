// handlers/system.rs - service descriptor and health check

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::database::models::tables;
use crate::error::ApiError;
use crate::middleware::DbPool;

/// GET /
pub async fn root() -> Json<Value> {
    let resources: Vec<String> = tables::ALL
        .iter()
        .map(|table| format!("/api/{}", table.resource))
        .chain([
            "/api/estabelecimentos".to_string(),
            "/api/estabelecimentos-relatorio".to_string(),
        ])
        .collect();

    Json(json!({
        "name": "Saúde API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Cadastro de estabelecimentos de saúde e tabelas de referência",
        "endpoints": {
            "home": "/",
            "health": "/health",
            "resources": resources,
        }
    }))
}

/// GET /health
pub async fn health(Extension(DbPool(pool)): Extension<DbPool>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let version = env!("CARGO_PKG_VERSION");

    match DatabaseManager::health_check(&pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "version": version,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            let mut body = json!({
                "status": "degraded",
                "timestamp": now,
                "version": version,
                "database": "unavailable"
            });
            if crate::is_development!() {
                body["database_error"] = json!(e.to_string());
            }
            (StatusCode::SERVICE_UNAVAILABLE, Json(body))
        }
    }
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Rota não encontrada")
}
