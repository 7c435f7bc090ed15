use std::path::PathBuf;

/// Returns the base path that anchors all filesystem lookups
/// (model artifacts, training data, forecast output).
///
/// Defaults to the current directory; override with `FORECAST_BASE_PATH`.
#[must_use]
pub fn get_base_path() -> PathBuf {
    dotenvy::dotenv().ok();

    std::env::var("FORECAST_BASE_PATH").map_or_else(|_| PathBuf::from("."), PathBuf::from)
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for model artifacts and data files.
    pub base_path: PathBuf,

    /// Database connection settings.
    pub db: DbConfig,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Every variable has a default, so loading never fails:
    /// - `FORECAST_BASE_PATH`: filesystem anchor (default `.`)
    /// - `DB_HOST`: database host (default `localhost`)
    /// - `DB_USER`: database user (default `root`)
    /// - `DB_PASS`: database password (default `yourpassword`)
    /// - `DB_NAME`: database name (default `crypto_forecast`)
    /// - `DB_DISABLED`: when set to anything non-empty, persistence is
    ///   replaced by a no-op sink that always reports failure
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_path: get_base_path(),
            db: DbConfig::from_env(),
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,

    /// When true, the service runs without a database and persistence
    /// degrades to a logged no-op.
    pub disabled: bool,
}

impl DbConfig {
    /// Loads database settings from environment variables, falling back
    /// to the documented defaults.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: env_or("DB_HOST", "localhost"),
            user: env_or("DB_USER", "root"),
            password: env_or("DB_PASS", "yourpassword"),
            database: env_or("DB_NAME", "crypto_forecast"),
            disabled: std::env::var("DB_DISABLED").is_ok_and(|v| !v.is_empty()),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
