use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::AppError;

/// Connect to the database without running migrations.
pub async fn connect_db(database_url: &str) -> Result<DatabaseConnection, AppError> {
    let mut options = ConnectOptions::new(database_url.to_string());
    // A pooled in-memory SQLite would give every connection its own database.
    if database_url.contains(":memory:") {
        options.max_connections(1);
    }

    let conn = Database::connect(options)
        .await
        .map_err(|e| AppError::db(format!("Failed to connect to database: {e}")))?;
    Ok(conn)
}

/// Connect and bring the schema up to date. Single entrypoint used by both
/// the server binary and the test state builder.
pub async fn bootstrap_db(database_url: &str) -> Result<DatabaseConnection, AppError> {
    let conn = connect_db(database_url).await?;
    Migrator::up(&conn, None)
        .await
        .map_err(|e| AppError::db(format!("Failed to run migrations: {e}")))?;
    Ok(conn)
}
