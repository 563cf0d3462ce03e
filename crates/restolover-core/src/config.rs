use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_radius = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(
                var,
                format!("must be a positive number of meters, got {value}"),
            ));
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("RESTOLOVER_ENV", "development"));

    let bind_addr = parse_addr("RESTOLOVER_BIND_ADDR", "0.0.0.0:3001")?;
    let log_level = or_default("RESTOLOVER_LOG_LEVEL", "info");
    let keywords_path = lookup("RESTOLOVER_KEYWORDS_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let db_max_connections = parse_u32("RESTOLOVER_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("RESTOLOVER_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("RESTOLOVER_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let nearby_default_radius_m = parse_radius("RESTOLOVER_NEARBY_RADIUS_M", "2000")?;
    let nearby_max_radius_m = parse_radius("RESTOLOVER_NEARBY_MAX_RADIUS_M", "50000")?;
    if nearby_default_radius_m > nearby_max_radius_m {
        return Err(invalid(
            "RESTOLOVER_NEARBY_RADIUS_M",
            format!("default radius {nearby_default_radius_m} exceeds maximum {nearby_max_radius_m}"),
        ));
    }

    let rate_limit_max_requests = parse_u32("RESTOLOVER_RATE_LIMIT_MAX_REQUESTS", "120")?;
    if rate_limit_max_requests == 0 {
        return Err(invalid(
            "RESTOLOVER_RATE_LIMIT_MAX_REQUESTS",
            "must be at least 1".to_string(),
        ));
    }
    let rate_limit_window_secs = parse_u64("RESTOLOVER_RATE_LIMIT_WINDOW_SECS", "60")?;
    if rate_limit_window_secs == 0 {
        return Err(invalid(
            "RESTOLOVER_RATE_LIMIT_WINDOW_SECS",
            "must be at least 1".to_string(),
        ));
    }

    let geocoder_base_url = or_default(
        "RESTOLOVER_GEOCODER_BASE_URL",
        "https://api-adresse.data.gouv.fr",
    );
    let geocoder_timeout_secs = parse_u64("RESTOLOVER_GEOCODER_TIMEOUT_SECS", "10")?;

    let cors_origins = or_default(
        "RESTOLOVER_CORS_ORIGINS",
        "http://localhost:3000,http://localhost:3001",
    )
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(ToOwned::to_owned)
    .collect();

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        keywords_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        nearby_default_radius_m,
        nearby_max_radius_m,
        rate_limit_max_requests,
        rate_limit_window_secs,
        geocoder_base_url,
        geocoder_timeout_secs,
        cors_origins,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
