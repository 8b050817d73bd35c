use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE, ORIGIN},
        HeaderName, HeaderValue, Method,
    },
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::database::{PgAdministratorRepository, PgProductRepository};
use crate::handlers::{auth, fallback, health, products, upload};
use crate::middleware::bearer_token_middleware;
use crate::services::{AuthService, ProductService, ThrottlePolicy, UploadService};

/// Shared services handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub products: ProductService,
    pub uploads: UploadService,
    pub public_base_url: String,
}

impl AppState {
    /// Wire the Postgres-backed services from configuration
    pub fn from_config(config: &AppConfig, pool: PgPool) -> Self {
        Self {
            auth: AuthService::new(
                Arc::new(PgAdministratorRepository::new(pool.clone())),
                ThrottlePolicy::from(&config.security),
                config.security.bcrypt_cost,
            ),
            products: ProductService::new(Arc::new(PgProductRepository::new(pool))),
            uploads: UploadService::new(&config.upload.dir, config.upload.max_file_bytes),
            public_base_url: config.server.public_base_url.clone(),
        }
    }
}

/// Build the complete router: JSON API under /api, uploaded images, health
/// and the admin SPA as the catch-all.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let spa_index = config.server.static_dir.join("index.html");
    let spa = ServeDir::new(&config.server.static_dir).fallback(ServeFile::new(spa_index));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api", api_routes(config.security.require_token))
        .nest_service("/uploads", ServeDir::new(&config.upload.dir))
        .fallback_service(spa)
        .layer(DefaultBodyLimit::max(config.request_body_limit()))
        .layer(cors_layer(&config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes(require_token: bool) -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(product_routes(require_token))
        .merge(gated(upload_routes(), require_token))
        .fallback(fallback::api_not_found)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/health", get(auth::auth_health))
}

fn product_routes(require_token: bool) -> Router<AppState> {
    let reads = Router::new()
        .route("/productos", get(products::list))
        .route("/productos/buscar", get(products::search))
        .route("/productos/categorias", get(products::categories))
        .route("/productos/:id", get(products::get));

    let writes = Router::new()
        .route("/productos", post(products::create))
        .route("/productos/:id", put(products::update).delete(products::delete));

    reads.merge(gated(writes, require_token))
}

fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload/imagen", post(upload::upload_image).delete(upload::delete_image))
        .route("/upload/status", get(upload::status))
}

/// Put the bearer token check in front of a route group when enabled
fn gated(router: Router<AppState>, require_token: bool) -> Router<AppState> {
    if require_token {
        router.route_layer(middleware::from_fn(bearer_token_middleware))
    } else {
        router
    }
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origin = if security.cors_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = security
            .cors_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::PATCH,
            Method::HEAD,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-requested-with"),
            ACCEPT,
            ORIGIN,
        ])
        .expose_headers([AUTHORIZATION, CONTENT_DISPOSITION])
        .max_age(Duration::from_secs(3600))
}
