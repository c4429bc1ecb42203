//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PAZAR_API_BASE_URL` - Base URL of the API gateway (e.g., <http://localhost:8080/api>)
//!
//! ## Optional
//! - `PAZAR_REVALIDATE_DEBOUNCE_MS` - Coupon revalidation quiescence window (default: 500)
//! - `PAZAR_CATALOG_CACHE_TTL_SECS` - Product catalog snapshot TTL (default: 300)
//! - `PAZAR_CATALOG_PAGE_SIZE` - `limit` sent to the product listing (default: 1000)

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the API gateway fronting the remote services.
    pub api_base_url: Url,
    /// Quiescence window for coupon revalidation after cart mutations.
    pub revalidate_debounce: Duration,
    /// How long a product catalog snapshot may be served from cache.
    pub catalog_cache_ttl: Duration,
    /// Page size requested from the product listing endpoint.
    pub catalog_page_size: u32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("PAZAR_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PAZAR_API_BASE_URL".to_string(), e.to_string())
            })?;

        let revalidate_debounce = Duration::from_millis(parse_env_or_default(
            "PAZAR_REVALIDATE_DEBOUNCE_MS",
            500,
        )?);
        let catalog_cache_ttl =
            Duration::from_secs(parse_env_or_default("PAZAR_CATALOG_CACHE_TTL_SECS", 300)?);
        let catalog_page_size = parse_env_or_default("PAZAR_CATALOG_PAGE_SIZE", 1000)?;

        Ok(Self {
            api_base_url,
            revalidate_debounce,
            catalog_cache_ttl,
            catalog_page_size,
        })
    }

    /// Configuration for a gateway at `base_url` with default tuning.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base_url` is not a valid URL.
    pub fn for_gateway(base_url: &str) -> Result<Self, ConfigError> {
        let api_base_url = base_url.parse::<Url>().map_err(|e| {
            ConfigError::InvalidEnvVar("PAZAR_API_BASE_URL".to_string(), e.to_string())
        })?;
        Ok(Self {
            api_base_url,
            revalidate_debounce: Duration::from_millis(500),
            catalog_cache_ttl: Duration::from_secs(300),
            catalog_page_size: 1000,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an environment variable with a default value.
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
