use std::fmt;

use axum::http::HeaderValue;
use formgate_core::extract::parse_column_list;
use formgate_storage::StorageConfig;

/// Default CORS origin (any).
pub const DEFAULT_CORS_ALLOW_ORIGIN: &str = "*";

/// Default preflight cache lifetime in seconds.
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86_400;

/// Default request body limit (25 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Target database settings.
#[derive(Clone)]
pub struct NotionConfig {
    pub database_id: String,
    pub integration_token: String,
    /// Columns that must be present in every submission.
    pub required_columns: Vec<String>,
}

impl fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionConfig")
            .field("database_id", &self.database_id)
            .field("integration_token", &"<redacted>")
            .field("required_columns", &self.required_columns)
            .finish()
    }
}

/// Values of the CORS headers attached to every response.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allow_origin: String,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: DEFAULT_CORS_ALLOW_ORIGIN.to_string(),
            max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
        }
    }
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Maximum accepted request body in bytes.
    pub max_upload_bytes: usize,
    pub notion: NotionConfig,
    pub cors: CorsConfig,
    /// Attachment storage. `None` disables uploads.
    pub storage: Option<StorageConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                    | Default         |
    /// |----------------------------|-----------------|
    /// | `HOST`                     | `0.0.0.0`       |
    /// | `PORT`                     | `3000`          |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`            |
    /// | `MAX_UPLOAD_BYTES`         | `26214400`      |
    /// | `NOTION_DATABASE_ID`       | required        |
    /// | `NOTION_INTEGRATION_TOKEN` | required        |
    /// | `NOTION_REQUIRED_COLUMNS`  | empty           |
    /// | `CORS_ALLOW_ORIGIN`        | `*`             |
    /// | `CORS_MAX_AGE`             | `86400`         |
    /// | `R2_BUCKET`                | unset           |
    /// | `R2_BUCKET_URL`            | unset           |
    /// | `R2_ENDPOINT`              | unset           |
    /// | `R2_REGION`                | `auto`          |
    /// | `R2_ACCESS_KEY_ID`         | unset           |
    /// | `R2_SECRET_ACCESS_KEY`     | unset           |
    ///
    /// Uploads are enabled only when both `R2_BUCKET` and `R2_BUCKET_URL`
    /// are set. Empty values count as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&var, "PORT", "a valid port", 3000u16)?;
        let request_timeout_secs =
            parse_or(&var, "REQUEST_TIMEOUT_SECS", "a whole number of seconds", 30u64)?;
        let max_upload_bytes = parse_or(
            &var,
            "MAX_UPLOAD_BYTES",
            "a byte count",
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;

        let notion = NotionConfig {
            database_id: var("NOTION_DATABASE_ID")
                .ok_or(ConfigError::Missing("NOTION_DATABASE_ID"))?,
            integration_token: var("NOTION_INTEGRATION_TOKEN")
                .ok_or(ConfigError::Missing("NOTION_INTEGRATION_TOKEN"))?,
            required_columns: var("NOTION_REQUIRED_COLUMNS")
                .map(|list| parse_column_list(&list))
                .unwrap_or_default(),
        };

        let allow_origin = var("CORS_ALLOW_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ALLOW_ORIGIN.into());
        if HeaderValue::from_str(&allow_origin).is_err() {
            return Err(ConfigError::Invalid {
                name: "CORS_ALLOW_ORIGIN",
                expected: "a valid header value",
                value: allow_origin,
            });
        }
        let cors = CorsConfig {
            allow_origin,
            max_age_secs: parse_or(&var, "CORS_MAX_AGE", "a whole number of seconds", DEFAULT_CORS_MAX_AGE_SECS)?,
        };

        let storage = match (var("R2_BUCKET"), var("R2_BUCKET_URL")) {
            (Some(bucket), Some(public_base_url)) => {
                let mut storage = StorageConfig::new(bucket, public_base_url);
                storage.endpoint_url = var("R2_ENDPOINT");
                if let Some(region) = var("R2_REGION") {
                    storage.region = region;
                }
                storage.access_key_id = var("R2_ACCESS_KEY_ID");
                storage.secret_access_key = var("R2_SECRET_ACCESS_KEY");
                Some(storage)
            }
            _ => None,
        };

        Ok(Self {
            host,
            port,
            request_timeout_secs,
            max_upload_bytes,
            notion,
            cors,
            storage,
        })
    }
}

fn parse_or<T, F>(var: &F, name: &'static str, expected: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
