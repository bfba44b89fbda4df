use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_DATABASE_URL: &str = "sqlite://bom.db?mode=rwc";
const DEFAULT_CATALOG_BACKEND: &str = "in-memory";
const DEFAULT_MAX_DEPTH: u32 = 5;
const DEFAULT_MAX_DEPTH_LIMIT: u32 = 50;
const DEFAULT_MAX_NODES: usize = 10_000;
const DEFAULT_EXPLOSION_TIMEOUT_MS: u64 = 10_000;

/// Where parts and BOM links are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum CatalogBackend {
    InMemory,
    Database,
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Catalog backend: "in-memory" or "database"
    #[serde(default = "default_catalog_backend")]
    #[validate(custom = "validate_catalog_backend")]
    pub catalog_backend: String,

    /// Database connection URL, used by the database backend
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// JSON catalog loaded into the in-memory backend on startup
    #[serde(default)]
    pub catalog_seed_path: Option<String>,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB connect timeout (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// Create the catalog tables on startup if they do not exist
    #[serde(default)]
    pub auto_create_schema: bool,

    /// Display depth used when a request does not name one
    #[serde(default = "default_max_depth")]
    #[validate(range(min = 1))]
    pub default_max_depth: u32,

    /// Largest maxDepth accepted from callers
    #[serde(default = "default_max_depth_limit")]
    #[validate(range(min = 1))]
    pub max_depth_limit: u32,

    /// Per-call node budget
    #[serde(default = "default_max_nodes")]
    #[validate(range(min = 1))]
    pub max_nodes: usize,

    /// Per-request explosion deadline (milliseconds)
    #[serde(default = "default_explosion_timeout_ms")]
    #[validate(range(min = 1))]
    pub explosion_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            catalog_backend: default_catalog_backend(),
            database_url: default_database_url(),
            catalog_seed_path: None,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            auto_create_schema: false,
            default_max_depth: default_max_depth(),
            max_depth_limit: default_max_depth_limit(),
            max_nodes: default_max_nodes(),
            explosion_timeout_ms: default_explosion_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Gets database URL reference
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Parsed catalog backend; validation guarantees one of the known values
    pub fn catalog_backend(&self) -> CatalogBackend {
        self.catalog_backend
            .parse()
            .unwrap_or(CatalogBackend::InMemory)
    }

    pub fn explosion_timeout(&self) -> Duration {
        Duration::from_millis(self.explosion_timeout_ms)
    }

    /// Full validation: field rules plus cross-field constraints
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        self.validate()?;
        self.validate_additional_constraints()
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.default_max_depth > self.max_depth_limit {
            let mut err = ValidationError::new("default_max_depth_above_limit");
            err.message = Some(
                format!(
                    "default_max_depth ({}) must not exceed max_depth_limit ({})",
                    self.default_max_depth, self.max_depth_limit
                )
                .into(),
            );
            errors.add("default_max_depth", err);
        }

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_min_connections_above_max");
            err.message = Some("db_min_connections must not exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default value functions
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_catalog_backend() -> String {
    DEFAULT_CATALOG_BACKEND.to_string()
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    2
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

fn default_max_depth_limit() -> u32 {
    DEFAULT_MAX_DEPTH_LIMIT
}

fn default_max_nodes() -> usize {
    DEFAULT_MAX_NODES
}

fn default_explosion_timeout_ms() -> u64 {
    DEFAULT_EXPLOSION_TIMEOUT_MS
}

fn validate_catalog_backend(value: &str) -> Result<(), ValidationError> {
    match value.parse::<CatalogBackend>() {
        Ok(_) => Ok(()),
        Err(_) => {
            let mut err = ValidationError::new("catalog_backend");
            err.message = Some("Must be one of: in-memory, database".into());
            Err(err)
        }
    }
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("bom_explosion={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Same as [`load_config`] with an explicit config directory
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("host", DEFAULT_HOST)?
        .set_default("port", i64::from(DEFAULT_PORT))?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate_all().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!(
        backend = %app_config.catalog_backend(),
        "Configuration loaded successfully"
    );
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
        writeln!(file, "{}", content).unwrap();
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate_all().is_ok());
        assert_eq!(cfg.catalog_backend(), CatalogBackend::InMemory);
        assert_eq!(cfg.default_max_depth, 5);
        assert_eq!(cfg.max_nodes, 10_000);
        assert_eq!(cfg.explosion_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let cfg = AppConfig {
            catalog_backend: "redis".into(),
            ..AppConfig::default()
        };
        let errors = cfg.validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("catalog_backend"));
    }

    #[test]
    fn backend_parsing_ignores_case() {
        let cfg = AppConfig {
            catalog_backend: "Database".into(),
            ..AppConfig::default()
        };
        assert!(cfg.validate_all().is_ok());
        assert_eq!(cfg.catalog_backend(), CatalogBackend::Database);
    }

    #[test]
    fn default_depth_must_fit_under_limit() {
        let cfg = AppConfig {
            default_max_depth: 60,
            ..AppConfig::default()
        };
        let errors = cfg.validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("default_max_depth"));
    }

    #[test]
    fn zero_budgets_are_rejected() {
        let cfg = AppConfig {
            max_nodes: 0,
            explosion_timeout_ms: 0,
            ..AppConfig::default()
        };
        let errors = cfg.validate_all().unwrap_err();
        assert!(errors.field_errors().contains_key("max_nodes"));
        assert!(errors.field_errors().contains_key("explosion_timeout_ms"));
    }

    #[test]
    fn loads_layered_file_config() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
                port = 9090
                catalog_backend = "database"
                database_url = "postgres://localhost/bom"
                max_depth_limit = 20
            "#,
        );

        let cfg = load_config_from(dir.path()).unwrap();
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.catalog_backend(), CatalogBackend::Database);
        assert_eq!(cfg.database_url(), "postgres://localhost/bom");
        assert_eq!(cfg.max_depth_limit, 20);
        assert_eq!(cfg.default_max_depth, 5);
    }

    #[test]
    fn invalid_file_config_fails_validation() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "default.toml", r#"log_level = "loud""#);

        let result = load_config_from(dir.path());
        assert!(matches!(result, Err(AppConfigError::Validation(_))));
    }
}
