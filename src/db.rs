use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::entities::{bom_link, part};
use crate::errors::ServiceError;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 16,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the catalog database
pub async fn establish_connection(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Configuring catalog database connection"
    );

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .sqlx_logging(false);

    let pool = Database::connect(opt).await.map_err(|e| {
        error!("Failed to connect to catalog database: {}", e);
        ServiceError::DatabaseError(e)
    })?;

    info!("Catalog database connection pool established");
    Ok(pool)
}

/// Creates the `parts` and `bom_links` tables from the entity definitions
/// when they do not exist yet.
pub async fn create_schema(db: &DbPool) -> Result<(), ServiceError> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut parts = schema.create_table_from_entity(part::Entity);
    let mut links = schema.create_table_from_entity(bom_link::Entity);

    for stmt in [parts.if_not_exists(), links.if_not_exists()] {
        db.execute(backend.build(&*stmt)).await.map_err(|e| {
            error!("Failed to create catalog schema: {}", e);
            ServiceError::DatabaseError(e)
        })?;
    }

    info!("Catalog schema is in place");
    Ok(())
}
