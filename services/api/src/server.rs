use crate::cli::ServeArgs;
use crate::infra::{cors_layer, panic_response, request_logger, shutdown_signal, AppState};
use crate::routes::with_applicant_routes;
use applicant_tracker::applicants::schema::ensure_schema;
use applicant_tracker::applicants::{
    connect_pool, ApplicantService, InMemoryApplicantRepository, InMemoryPageCache,
    PgApplicantRepository, RedisPageCache,
};
use applicant_tracker::config::AppConfig;
use applicant_tracker::error::AppError;
use applicant_tracker::telemetry;
use axum::{middleware, Extension, Router};
use axum_prometheus::PrometheusMetricLayer;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let routes = if args.in_memory {
        in_memory_routes(&config)
    } else {
        backed_routes(&config).await?
    };

    let app = routes
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(middleware::from_fn(request_logger))
        .layer(cors_layer());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "applicant tracker ready");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    readiness_flag.store(false, Ordering::Release);
    info!("server stopped");
    Ok(())
}

/// Postgres store and Redis page cache. Redis being down only degrades listing.
async fn backed_routes(config: &AppConfig) -> Result<Router, AppError> {
    let pool = connect_pool(&config.database).await?;
    ensure_schema(&pool).await?;
    info!(
        host = %config.database.host,
        database = %config.database.name,
        "connected to postgres"
    );

    let cache = RedisPageCache::new(&config.cache)?;
    match cache.ping().await {
        Ok(()) => info!(host = %config.cache.host, "connected to redis"),
        Err(err) => warn!(error = %err, "redis unavailable, listing will bypass the cache"),
    }

    let service = ApplicantService::with_policy(
        Arc::new(PgApplicantRepository::new(pool)),
        Arc::new(cache),
        config.cache.policy,
    );
    Ok(with_applicant_routes(Arc::new(service)))
}

fn in_memory_routes(config: &AppConfig) -> Router {
    info!("using in-memory applicant store and page cache");
    let service = ApplicantService::with_policy(
        Arc::new(InMemoryApplicantRepository::default()),
        Arc::new(InMemoryPageCache::default()),
        config.cache.policy,
    );
    with_applicant_routes(Arc::new(service))
}
