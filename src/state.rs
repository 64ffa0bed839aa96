use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sqlx::PgPool;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub orm: DatabaseConnection,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            orm,
            config: Arc::new(config),
        }
    }

    /// The sqlx pool underneath the ORM connection, for raw queries.
    pub fn pool(&self) -> &PgPool {
        self.orm.get_postgres_connection_pool()
    }
}
