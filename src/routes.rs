use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Extension};
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::database::models::{tables, LookupTable};
use crate::handlers::{estabelecimento, lookup, relatorio, system};
use crate::middleware::DbPool;

/// Full application router with global middleware
pub fn app(pool: PgPool, config: &AppConfig) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health));

    for table in tables::ALL.iter().copied() {
        router = router.nest(&format!("/api/{}", table.resource), lookup_routes(table));
    }

    router
        .nest("/api/estabelecimentos", estabelecimento_routes())
        .nest("/api/estabelecimentos-relatorio", relatorio_routes())
        .fallback(system::not_found)
        // Global middleware, outermost first
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.security.cors_origins))
                .layer(TimeoutLayer::new(Duration::from_secs(config.api.request_timeout_secs)))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
                .layer(Extension(DbPool(pool))),
        )
}

fn lookup_routes(table: &'static LookupTable) -> Router {
    let mut router = Router::new()
        .route("/", get(lookup::list).post(lookup::create))
        .route("/paginated", get(lookup::paginated))
        .route("/check-existing", get(lookup::check_existing))
        .route(
            "/:id",
            get(lookup::show).put(lookup::update).delete(lookup::delete),
        );

    for key in table.key_checks.iter().copied() {
        router = router.route(
            &format!("/check-existing-{}", key),
            get(lookup::check_existing_key).layer(Extension(lookup::KeyParam(key))),
        );
    }

    if let Some(group) = &table.group {
        router = router.route(&format!("/{}/:parent_id", group.segment), get(lookup::by_group));
    }

    router.layer(Extension(table))
}

fn estabelecimento_routes() -> Router {
    Router::new()
        .route("/", get(estabelecimento::list).post(estabelecimento::create))
        .route("/paginated", get(estabelecimento::paginated))
        .route("/check-duplicate", post(estabelecimento::check_duplicate))
        // Dropdown options
        .route("/tipo-estabelecimento", get(estabelecimento::tipos_estabelecimento))
        .route("/natureza", get(estabelecimento::naturezas))
        .route("/turnos", get(estabelecimento::turnos))
        .route("/tipo-habilitacao", get(estabelecimento::habilitacoes))
        .route("/tipo-qualificacao", get(estabelecimento::qualificacoes))
        .route(
            "/:id",
            get(estabelecimento::show)
                .put(estabelecimento::update)
                .delete(estabelecimento::delete),
        )
}

fn relatorio_routes() -> Router {
    Router::new()
        .route("/", get(relatorio::list))
        .route("/paginated", get(relatorio::paginated))
        .route("/export", get(relatorio::export))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}
