//! Throwaway databases for tests that need a real Postgres.
//!
//! The server is located through `TESTS_DATABASE_HOST`, `TESTS_DATABASE_PORT`,
//! `TESTS_DATABASE_USERNAME` and `TESTS_DATABASE_PASSWORD`, defaulting to a local
//! `postgres` superuser.

use std::time::{SystemTime, UNIX_EPOCH};

use pulse_config::shared::{IntoConnectOptions, PgConnectionConfig, TlsConfig};
use secrecy::SecretString;
use sqlx::{Connection, Executor, PgConnection, PgPool};

use crate::schema::bootstrap_events_table;

/// Builds a connection config pointing at a fresh, uniquely named database.
pub fn test_connection_config() -> PgConnectionConfig {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();

    PgConnectionConfig {
        host: env_or("TESTS_DATABASE_HOST", "localhost"),
        port: env_or("TESTS_DATABASE_PORT", "5432")
            .parse()
            .expect("TESTS_DATABASE_PORT must be a port number"),
        name: format!("pulse_test_{}_{nanos}", std::process::id()),
        username: env_or("TESTS_DATABASE_USERNAME", "postgres"),
        password: std::env::var("TESTS_DATABASE_PASSWORD")
            .ok()
            .map(SecretString::new),
        tls: TlsConfig::disabled(),
    }
}

/// Creates the database described by `config`, bootstraps the events table and returns a pool.
///
/// # Panics
/// Panics if the server is unreachable or the database cannot be created.
pub async fn create_events_database(config: &PgConnectionConfig) -> PgPool {
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"create database "{}";"#, config.name))
        .await
        .expect("Failed to create database");

    let pool = PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to connect to Postgres");
    bootstrap_events_table(&pool)
        .await
        .expect("Failed to bootstrap the events table");

    pool
}

/// Drops the database described by `config`, terminating its connections first.
///
/// Never panics so cleanup cannot mask the original test failure.
pub async fn drop_events_database(config: &PgConnectionConfig) {
    let mut connection = match PgConnection::connect_with(&config.without_db()).await {
        Ok(connection) => connection,
        Err(e) => {
            eprintln!("warning: failed to connect to Postgres for cleanup: {e}");
            return;
        }
    };

    if let Err(e) = connection
        .execute(&*format!(
            r#"
            select pg_terminate_backend(pg_stat_activity.pid)
            from pg_stat_activity
            where pg_stat_activity.datname = '{}'
            and pid <> pg_backend_pid();"#,
            config.name
        ))
        .await
    {
        eprintln!(
            "warning: failed to terminate connections for database {}: {}",
            config.name, e
        );
    }

    if let Err(e) = connection
        .execute(&*format!(r#"drop database if exists "{}";"#, config.name))
        .await
    {
        eprintln!("warning: failed to drop database {}: {}", config.name, e);
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}
