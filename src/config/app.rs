//! Application settings loaded from environment variables.
//!
//! `.env` is loaded by `main` before [`AppConfig::from_env`] runs, so values can come
//! from either source. Parsing goes through [`AppConfig::from_lookup`] so tests can feed
//! a plain map instead of mutating the process environment.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Origins allowed to call the API from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// `*`
    Any,
    /// Explicit list of http(s) origins, possibly empty
    List(Vec<String>),
}

impl CorsOrigins {
    /// Parses `CORS_ALLOWED_WEBSITES`: `*`, or a comma separated list where only
    /// `http://` and `https://` entries are kept.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "*" {
            return Self::Any;
        }
        Self::List(
            raw.split(',')
                .map(str::trim)
                .filter(|site| site.starts_with("http://") || site.starts_with("https://"))
                .map(ToString::to_string)
                .collect(),
        )
    }
}

/// Runtime configuration of the service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `SeaORM` connection string
    pub database_url: String,
    /// Address the HTTP server binds to
    pub listen: SocketAddr,
    /// Whether `/admin/*` routes are mounted
    pub enable_admin_routes: bool,
    /// Key granting admin access
    pub admin_api_key: Option<String>,
    /// Key material for encrypting external account passwords
    pub encryption_password: String,
    /// Root directory of the slide blob store
    pub upload_folder: PathBuf,
    /// Browser origins allowed by CORS
    pub cors_origins: CorsOrigins,
    /// Base URL of the story gateway, `None` disables posting
    pub story_gateway_url: Option<String>,
    /// Timeout for each gateway request
    pub story_gateway_timeout: Duration,
    /// Optional TOML file with extra statuses to seed
    pub status_catalog: Option<PathBuf>,
}

fn parse_bool(value: Option<String>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

impl AppConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns [`Error::Config`] when `ENCRYPTION_PASSWORD` is missing, when admin routes
    /// are enabled without `ADMIN_API_KEY`, or when a numeric/address value is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let encryption_password = non_empty("ENCRYPTION_PASSWORD").ok_or_else(|| Error::Config {
            message: "ENCRYPTION_PASSWORD is not set".to_string(),
        })?;

        let enable_admin_routes = parse_bool(lookup("ENABLE_ADMIN_ROUTES"));
        let admin_api_key = non_empty("ADMIN_API_KEY");
        if enable_admin_routes && admin_api_key.is_none() {
            return Err(Error::Config {
                message: "ENABLE_ADMIN_ROUTES is set but ADMIN_API_KEY is missing".to_string(),
            });
        }

        let host = non_empty("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = non_empty("PORT").unwrap_or_else(|| "5000".to_string());
        let listen: SocketAddr = format!("{host}:{port}").parse().map_err(|e| Error::Config {
            message: format!("Invalid HOST/PORT '{host}:{port}': {e}"),
        })?;

        let timeout_secs = match non_empty("STORY_GATEWAY_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| Error::Config {
                message: format!("Invalid STORY_GATEWAY_TIMEOUT_SECS '{raw}': {e}"),
            })?,
            None => 30,
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            listen,
            enable_admin_routes,
            admin_api_key,
            encryption_password,
            upload_folder: non_empty("UPLOAD_FOLDER")
                .map_or_else(|| PathBuf::from("./instance/nightlines"), PathBuf::from),
            cors_origins: CorsOrigins::parse(&lookup("CORS_ALLOWED_WEBSITES").unwrap_or_default()),
            story_gateway_url: non_empty("STORY_GATEWAY_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            story_gateway_timeout: Duration::from_secs(timeout_secs),
            status_catalog: non_empty("STATUS_CATALOG").map(PathBuf::from),
        })
    }

    /// Same as [`AppConfig::from_lookup`] over a map, handy in tests.
    pub fn from_map(values: &HashMap<&str, &str>) -> Result<Self> {
        Self::from_lookup(|key| values.get(key).map(|v| (*v).to_string()))
    }
}
