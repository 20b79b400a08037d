//! Time-boxed database handle.
//!
//! The server keeps one `DatabaseConnection` in a single-entry `moka` cache.
//! The entry expires after the configured TTL (five minutes by default) and
//! is dropped early by [`ConnectionCache::invalidate`] when a request sees a
//! connection-class error, so the next request reconnects.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use localfish_shared::config::DatabaseConfig;
use moka::future::Cache;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, RuntimeErr};

type ConnectFuture = Pin<Box<dyn Future<Output = Result<DatabaseConnection, DbErr>> + Send>>;
type Connector = Arc<dyn Fn() -> ConnectFuture + Send + Sync>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Cached database handle, shared by all requests.
#[derive(Clone)]
pub struct ConnectionCache {
    cache: Cache<(), DatabaseConnection>,
    connector: Connector,
    ttl: Duration,
}

impl std::fmt::Debug for ConnectionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCache")
            .field("ttl", &self.ttl)
            .field("connected", &self.cache.contains_key(&()))
            .finish_non_exhaustive()
    }
}

impl ConnectionCache {
    /// Creates a cache that connects with the given database settings.
    ///
    /// No connection is opened until the first [`get`](Self::get).
    #[must_use]
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = connect_options(config);
        Self::with_connector(Duration::from_secs(config.connection_ttl_secs), move || {
            Database::connect(options.clone())
        })
    }

    /// Creates a cache around a custom connect function.
    #[must_use]
    pub fn with_connector<F, Fut>(ttl: Duration, connect: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<DatabaseConnection, DbErr>> + Send + 'static,
    {
        let connector: Connector = Arc::new(move || Box::pin(connect()));
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(ttl)
            .build();

        Self {
            cache,
            connector,
            ttl,
        }
    }

    /// Returns the cached connection, connecting first if there is none.
    ///
    /// Concurrent callers share a single connect attempt. A failed attempt
    /// is not cached.
    ///
    /// # Errors
    ///
    /// Returns `DbErr::Conn` if the database cannot be reached.
    pub async fn get(&self) -> Result<DatabaseConnection, DbErr> {
        let connector = Arc::clone(&self.connector);
        self.cache
            .try_get_with((), async move {
                tracing::info!("Opening database connection");
                connector().await
            })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Database connection failed");
                DbErr::Conn(RuntimeErr::Internal(e.to_string()))
            })
    }

    /// Drops the cached connection so the next `get` reconnects.
    pub async fn invalidate(&self) {
        tracing::warn!("Invalidating cached database connection");
        self.cache.invalidate(&()).await;
    }

    /// How long a connection is reused.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(CONNECT_TIMEOUT)
        .sqlx_logging(false);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_cache(ttl: Duration) -> (ConnectionCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = ConnectionCache::with_connector(ttl, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(MockDatabase::new(DatabaseBackend::Postgres).into_connection()) }
        });
        (cache, calls)
    }

    #[tokio::test]
    async fn test_connection_is_reused() {
        let (cache, calls) = counting_cache(Duration::from_secs(300));

        cache.get().await.unwrap();
        cache.get().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_reconnect() {
        let (cache, calls) = counting_cache(Duration::from_secs(300));

        cache.get().await.unwrap();
        cache.invalidate().await;
        cache.get().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_connection_is_replaced() {
        let (cache, calls) = counting_cache(Duration::from_millis(50));

        cache.get().await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        cache.get().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_connect_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = ConnectionCache::with_connector(Duration::from_secs(300), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(DbErr::Conn(RuntimeErr::Internal("refused".to_string()))) }
        });

        assert!(matches!(cache.get().await, Err(DbErr::Conn(_))));
        assert!(matches!(cache.get().await, Err(DbErr::Conn(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_new_reads_ttl_from_config() {
        let config = DatabaseConfig {
            url: "postgres://localhost/localfish".to_string(),
            max_connections: 5,
            min_connections: 1,
            connection_ttl_secs: 120,
        };
        let cache = ConnectionCache::new(&config);
        assert_eq!(cache.ttl(), Duration::from_secs(120));
    }
}
