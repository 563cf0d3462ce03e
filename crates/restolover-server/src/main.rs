mod api;
mod middleware;

use std::sync::Arc;

use restolover_core::{Environment, KeywordTables};
use restolover_geocoder::GeocoderClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState, NearbySettings},
    middleware::{AuthState, RateLimitState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(restolover_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let keywords = match &config.keywords_path {
        Some(path) => restolover_core::load_keyword_tables(path)?,
        None => KeywordTables::builtin(),
    };
    tracing::info!(
        specialities = keywords.specialities().len(),
        cities = keywords.cities().len(),
        "keyword tables loaded"
    );

    let pool_config = restolover_db::PoolConfig::from_app_config(&config);
    let pool = restolover_db::connect_pool(&config.database_url, pool_config).await?;
    restolover_db::run_migrations(&pool).await?;

    let geocoder =
        GeocoderClient::with_base_url(config.geocoder_timeout_secs, &config.geocoder_base_url)?;

    let auth = AuthState::from_env(matches!(config.env, Environment::Development))?;
    let state = AppState {
        pool,
        keywords: Arc::new(keywords),
        geocoder,
        nearby: NearbySettings::from_app_config(&config),
    };
    let rate_limit = RateLimitState::from_app_config(&config);
    let app = build_app(state, auth, rate_limit, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "restolover server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
