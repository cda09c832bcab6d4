//! Cart client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CARTSYNC_BASE_URL` - Base URL of the cart backend (e.g., `https://api.example.com/api/`)
//!
//! ## Optional
//! - `CARTSYNC_COMPANY` - Tenant/company identifier (default: 1)
//! - `CARTSYNC_LOCATION` - Store/warehouse code (default: 1)
//! - `CARTSYNC_IP_ADDRESS` - Originating IP placeholder sent on add (default: 0.0.0.0)
//! - `CARTSYNC_TIMEOUT_SECS` - Whole-request timeout (default: 30)
//! - `CARTSYNC_CONNECT_TIMEOUT_SECS` - TCP connect timeout (default: 10)
//! - `CARTSYNC_CART_PROCEDURE` - Stored procedure listing a cart (default: `GetCartDetails`)
//! - `CARTSYNC_CODE_ADDED` - `ResponseCode` for a newly added line (default: 1)
//! - `CARTSYNC_CODE_UPDATED` - `ResponseCode` for a quantity bump (default: 2)
//! - `CARTSYNC_CODE_OUT_OF_STOCK` - `ResponseCode` for out of stock (default: 3)
//! - `CARTSYNC_REACHABILITY_INTERVAL_SECS` - Reachability poll period (default: 10)

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_COMPANY: &str = "1";
const DEFAULT_LOCATION: &str = "1";
const DEFAULT_IP_ADDRESS: &str = "0.0.0.0";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CART_PROCEDURE: &str = "GetCartDetails";
const DEFAULT_REACHABILITY_INTERVAL_SECS: u64 = 10;

/// Errors raised while loading configuration or building a client from it.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Cannot build endpoint {name} from base URL: {reason}")]
    InvalidEndpoint { name: String, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Backend `ResponseCode` values for add-to-cart.
///
/// These are not documented as stable across backend deployments, so they
/// are configuration rather than constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCodes {
    /// A new cart line was created.
    pub added: i64,
    /// An existing line for the same item had its quantity updated.
    pub updated: i64,
    /// The item cannot be added because it is out of stock.
    pub out_of_stock: i64,
}

impl Default for ResponseCodes {
    fn default() -> Self {
        Self {
            added: 1,
            updated: 2,
            out_of_stock: 3,
        }
    }
}

/// Cart client configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Backend base URL, always ending in `/`
    pub base_url: Url,
    /// `Company` tenant identifier
    pub company: String,
    /// `Location` store/warehouse code
    pub location: String,
    /// `IpAddress` placeholder sent on add
    pub ip_address: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Stored procedure that lists a cart
    pub cart_procedure: String,
    /// Add-to-cart response code mapping
    pub response_codes: ResponseCodes,
    /// How often the reachability monitor probes the backend
    pub reachability_interval: Duration,
}

impl CartConfig {
    /// Create a configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            company: DEFAULT_COMPANY.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            ip_address: DEFAULT_IP_ADDRESS.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            cart_procedure: DEFAULT_CART_PROCEDURE.to_string(),
            response_codes: ResponseCodes::default(),
            reachability_interval: Duration::from_secs(DEFAULT_REACHABILITY_INTERVAL_SECS),
        }
    }

    /// Set the tenant and store codes.
    #[must_use]
    pub fn with_tenant(mut self, company: impl Into<String>, location: impl Into<String>) -> Self {
        self.company = company.into();
        self.location = location.into();
        self
    }

    /// Set the whole-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the add-to-cart response code mapping.
    #[must_use]
    pub const fn with_response_codes(mut self, codes: ResponseCodes) -> Self {
        self.response_codes = codes;
        self
    }

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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let raw_base_url = env.required("CARTSYNC_BASE_URL")?;
        let base_url = Url::parse(&raw_base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CARTSYNC_BASE_URL".to_string(), e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "CARTSYNC_BASE_URL".to_string(),
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        let defaults = ResponseCodes::default();
        let response_codes = ResponseCodes {
            added: env.parsed_or("CARTSYNC_CODE_ADDED", defaults.added)?,
            updated: env.parsed_or("CARTSYNC_CODE_UPDATED", defaults.updated)?,
            out_of_stock: env.parsed_or("CARTSYNC_CODE_OUT_OF_STOCK", defaults.out_of_stock)?,
        };
        if response_codes.added == response_codes.updated
            || response_codes.added == response_codes.out_of_stock
            || response_codes.updated == response_codes.out_of_stock
        {
            return Err(ConfigError::InvalidEnvVar(
                "CARTSYNC_CODE_*".to_string(),
                "added, updated and out-of-stock codes must be distinct".to_string(),
            ));
        }

        Ok(Self {
            base_url: with_trailing_slash(base_url),
            company: env.or_default("CARTSYNC_COMPANY", DEFAULT_COMPANY),
            location: env.or_default("CARTSYNC_LOCATION", DEFAULT_LOCATION),
            ip_address: env.or_default("CARTSYNC_IP_ADDRESS", DEFAULT_IP_ADDRESS),
            timeout: env.seconds_or("CARTSYNC_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            connect_timeout: env
                .seconds_or("CARTSYNC_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
            cart_procedure: env.or_default("CARTSYNC_CART_PROCEDURE", DEFAULT_CART_PROCEDURE),
            response_codes,
            reachability_interval: env.seconds_or(
                "CARTSYNC_REACHABILITY_INTERVAL_SECS",
                DEFAULT_REACHABILITY_INTERVAL_SECS,
            )?,
        })
    }

    /// Resolve an endpoint name against the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` does not form a valid URL.
    pub fn endpoint(&self, name: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(name)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get a required variable; blank counts as missing.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    fn seconds_or(&self, key: &str, default: u64) -> Result<Duration, ConfigError> {
        let secs: u64 = self.parsed_or(key, default)?;
        if secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be at least 1 second".to_string(),
            ));
        }
        Ok(Duration::from_secs(secs))
    }
}
