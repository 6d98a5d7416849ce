use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::app_config::DatabaseConfig;

/// Postgres pool plus the embedded schema migrations.
#[derive(Clone)]
pub struct DbClient {
    pub pool: PgPool,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;
        tracing::info!(
            "Postgres pool ready (max {} connections)",
            config.max_connections
        );
        Ok(Self { pool })
    }

    /// Apply `migrations/` in order; already-applied files are skipped.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        let migrator = sqlx::migrate!("../migrations");
        tracing::info!("Applying up to {} schema migrations", migrator.iter().count());
        migrator.run(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_schema_limits_users_to_one_default_card() {
        let migrator = sqlx::migrate!("../migrations");
        let constraint = migrator
            .iter()
            .find(|m| m.sql.contains("one_default_method_per_user"))
            .unwrap();
        assert!(constraint.sql.contains("WHERE (is_default)"));
        assert!(constraint.version > 1);
    }
}
