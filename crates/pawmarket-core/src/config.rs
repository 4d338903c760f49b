use crate::app_config::{AppConfig, Environment};
use crate::geo::GeoPoint;
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
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
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

    let parse_amount = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let value = or_default(var, default)
            .parse::<i64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value < 0 {
            return Err(invalid(var, "must not be negative".to_string()));
        }
        Ok(value)
    };

    let parse_coord = |var: &str, default: &str, bound: f64| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !value.is_finite() || value.abs() > bound {
            return Err(invalid(var, format!("must be within ±{bound}")));
        }
        Ok(value)
    };

    let api_base_url = require("PAWMARKET_API_BASE_URL")?;
    let api_token = lookup("PAWMARKET_API_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());

    let env = parse_environment(&or_default("PAWMARKET_ENV", "development"))?;

    let bind_addr = parse_addr("PAWMARKET_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PAWMARKET_LOG_LEVEL", "info");
    let cart_path = PathBuf::from(or_default("PAWMARKET_CART_PATH", "./.pawmarket/cart.json"));

    let free_shipping_threshold = parse_amount("PAWMARKET_FREE_SHIPPING_THRESHOLD", "39990")?;
    let fallback_shipping_fee = parse_amount("PAWMARKET_FALLBACK_SHIPPING_FEE", "2990")?;
    let origin = GeoPoint::new(
        parse_coord("PAWMARKET_ORIGIN_LAT", "-33.4489", 90.0)?,
        parse_coord("PAWMARKET_ORIGIN_LON", "-70.6693", 180.0)?,
    );

    let request_timeout_secs = parse_u64("PAWMARKET_REQUEST_TIMEOUT_SECS", "15")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "PAWMARKET_REQUEST_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let max_retries = parse_u32("PAWMARKET_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("PAWMARKET_RETRY_BACKOFF_BASE_MS", "500")?;

    let exempt_emails = or_default("PAWMARKET_EXEMPT_EMAILS", "")
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    let exempt_payment_method = or_default("PAWMARKET_EXEMPT_PAYMENT_METHOD", "test_bypass");

    Ok(AppConfig {
        api_base_url,
        api_token,
        env,
        bind_addr,
        log_level,
        cart_path,
        free_shipping_threshold,
        fallback_shipping_fee,
        origin,
        request_timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        exempt_emails,
        exempt_payment_method,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PAWMARKET_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
