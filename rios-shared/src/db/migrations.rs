/// Schema migrations
///
/// SQL files live in `migrations/` at the workspace root and are embedded at
/// compile time.

use sqlx::{migrate::MigrateDatabase, postgres::PgPool, Postgres};
use tracing::{debug, error, info};

/// Applies every pending migration
///
/// # Errors
///
/// Returns an error if a migration fails; the failing migration is rolled back.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations");

    sqlx::migrate!("../migrations")
        .run(pool)
        .await
        .inspect_err(|e| error!(error = %e, "Migration failed"))?;

    info!("Database schema is up to date");
    Ok(())
}

/// Creates the database when it does not exist yet (development only)
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
    } else {
        info!("Database does not exist, creating it");
        Postgres::create_database(database_url).await?;
    }

    Ok(())
}
