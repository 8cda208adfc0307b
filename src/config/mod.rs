use anyhow::Context;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    /// Public origin the short links live under, used for QR payloads
    pub public_base_url: String,
    pub allowed_origins: Vec<String>,
    pub slugs: SlugConfig,
    pub cache: CacheConfig,
    /// Requests per minute per client IP on the management API; 0 disables
    pub rate_limit_per_minute: u32,
    pub redirect_status: RedirectMode,
    pub frontend: FrontendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlugConfig {
    pub length: usize,
    /// Generated-slug attempts before giving up on a create
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub max_entries: u64,
    pub ttl_secs: u64,
    pub flush_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    /// Directory with a built frontend to serve for unmatched paths
    pub static_dir: Option<String>,
}

/// Status code used for `/r/{slug}` redirects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedirectMode {
    /// 302 Found
    #[default]
    Found,
    /// 307 Temporary Redirect
    Temporary,
    /// 308 Permanent Redirect
    Permanent,
}

impl RedirectMode {
    pub fn status_code(self) -> StatusCode {
        match self {
            RedirectMode::Found => StatusCode::FOUND,
            RedirectMode::Temporary => StatusCode::TEMPORARY_REDIRECT,
            RedirectMode::Permanent => StatusCode::PERMANENT_REDIRECT,
        }
    }
}

impl FromStr for RedirectMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "302" | "found" => Ok(RedirectMode::Found),
            "307" | "temporary" => Ok(RedirectMode::Temporary),
            "308" | "permanent" => Ok(RedirectMode::Permanent),
            other => anyhow::bail!("unsupported redirect status '{other}'"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                backend: DatabaseBackend::Sqlite,
                url: "sqlite://./shorty.db".to_string(),
                max_connections: 10,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            public_base_url: "http://localhost:8080".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://shorty.local".to_string(),
            ],
            slugs: SlugConfig {
                length: 6,
                max_attempts: 5,
            },
            cache: CacheConfig {
                max_entries: 10_000,
                ttl_secs: 300,
                flush_interval_secs: 5,
            },
            rate_limit_per_minute: 100,
            redirect_status: RedirectMode::default(),
            frontend: FrontendConfig { static_dir: None },
        }
    }
}

/// Parse an optional numeric env var, failing loudly on garbage
fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres"
                );
                DatabaseBackend::Sqlite
            }
        };

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| defaults.database.url.clone());
        let max_connections =
            env_parse("DATABASE_MAX_CONNECTIONS", defaults.database.max_connections)?;

        let host = std::env::var("HOST").unwrap_or_else(|_| defaults.server.host.clone());
        let port = env_parse("PORT", defaults.server.port)?;

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|_| defaults.public_base_url.clone());

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|_| defaults.allowed_origins.clone());

        let slug_length = env_parse("SLUG_LENGTH", defaults.slugs.length)?;
        if !(1..=crate::slug::MAX_SLUG_LENGTH).contains(&slug_length) {
            anyhow::bail!(
                "SLUG_LENGTH must be between 1 and {}",
                crate::slug::MAX_SLUG_LENGTH
            );
        }
        let slug_max_attempts = env_parse("SLUG_MAX_ATTEMPTS", defaults.slugs.max_attempts)?.max(1);

        let cache = CacheConfig {
            max_entries: env_parse("CACHE_MAX_ENTRIES", defaults.cache.max_entries)?,
            ttl_secs: env_parse("CACHE_TTL_SECS", defaults.cache.ttl_secs)?,
            flush_interval_secs: env_parse(
                "CACHE_FLUSH_INTERVAL_SECS",
                defaults.cache.flush_interval_secs,
            )?,
        };

        let rate_limit_per_minute =
            env_parse("RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute)?;

        let redirect_status = match std::env::var("REDIRECT_STATUS") {
            Ok(raw) => raw.parse::<RedirectMode>().unwrap_or_else(|e| {
                tracing::warn!("{e}, falling back to 302. Supported values: 302, 307, 308");
                RedirectMode::default()
            }),
            Err(_) => RedirectMode::default(),
        };

        let frontend_static_dir = std::env::var("FRONTEND_STATIC_DIR").ok();

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            server: ServerConfig { host, port },
            public_base_url,
            allowed_origins,
            slugs: SlugConfig {
                length: slug_length,
                max_attempts: slug_max_attempts,
            },
            cache,
            rate_limit_per_minute,
            redirect_status,
            frontend: FrontendConfig {
                static_dir: frontend_static_dir,
            },
        })
    }
}
