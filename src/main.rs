use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::CorsLayer;

use studyportal::core::auth::{AuthApiState, AuthService, JwtConfig, JwtService, auth_api_router};
use studyportal::core::checkin::{CheckInApiState, checkin_api_router};
use studyportal::core::config::Config;
use studyportal::core::db::{
    CheckInRepository, DbConfig, PgPool, UserRepository, connect_with_retry, health_check,
    run_migrations,
};

#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Required configuration; refuse to start without it
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let jwt_service = JwtService::new(JwtConfig::new(&config.jwt_secret).with_env_overrides());

    // Bounded startup retry against the database
    let db_config = DbConfig::new(config.database_url.clone());
    let pool = match connect_with_retry(&db_config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Giving up on database connection: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        tracing::error!("Migration failure: {}", e);
        std::process::exit(1);
    }

    let auth_service = AuthService::new(UserRepository::new(pool.clone()), jwt_service);

    let auth_api = auth_api_router(AuthApiState {
        auth_service: auth_service.clone(),
    });
    let checkin_api = checkin_api_router(CheckInApiState {
        auth_service,
        check_in_repo: CheckInRepository::new(pool.clone()),
    });

    let app = Router::new()
        .route("/health", get(health_handler).with_state(pool.clone()))
        .merge(auth_api)
        .merge(checkin_api)
        .layer(cors_layer(config.allowed_origin.as_deref()));

    let addr = config.bind_addr();
    tracing::info!("Server is running on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    // Release the store connection before exiting
    pool.close().await;
    tracing::info!("Disconnected from database");
}

/// CORS layer: a single configured origin with credentials, or
/// permissive when no origin is configured
fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    match allowed_origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
        None => CorsLayer::permissive(),
    }
}

/// GET /health
async fn health_handler(State(pool): State<PgPool>) -> impl IntoResponse {
    match health_check(&pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ok" })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unavailable" })),
            )
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
