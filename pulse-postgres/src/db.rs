use pulse_config::shared::{IntoConnectOptions, PgConnectionConfig};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

/// Connects to the events database with a pool of at most `max_connections`.
///
/// The pool eagerly opens one connection so an unreachable database fails here, at startup,
/// instead of on the first insert.
pub async fn connect_to_events_database(
    config: &PgConnectionConfig,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let options = config.with_db();

    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    info!(
        host = %config.host,
        port = config.port,
        database = %config.name,
        max_connections,
        "connected to events database"
    );

    Ok(pool)
}
