//! Redis backend

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError, RedisResult};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::cache::{CacheBackend, ConnectionEvent};
use crate::domain::DomainError;

/// Configuration for the Redis backend
#[derive(Debug, Clone)]
pub struct RedisBackendConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379/0")
    pub url: String,
    /// Key prefix for namespacing
    pub key_prefix: Option<String>,
    /// Upper bound for establishing the connection
    pub connect_timeout: Duration,
    /// Upper bound for a single command
    pub command_timeout: Duration,
    /// Delay between reconnect attempts after a connection failure
    pub reconnect_interval: Duration,
}

impl Default for RedisBackendConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: None,
            connect_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(5),
            reconnect_interval: Duration::from_secs(1),
        }
    }
}

impl RedisBackendConfig {
    /// Creates a new configuration with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Sets the key prefix
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }
}

/// Redis backend over a multiplexed `ConnectionManager`.
///
/// A failed `connect` and connection-class command failures (including
/// command timeouts) start a background recovery task. It publishes
/// `Reconnecting`, then retries every `reconnect_interval`: it opens a new
/// connection when none is held (publishing `Connected`), or PINGs the
/// existing one, and publishes `Ready` once the server answers.
/// `disconnect` stops recovery.
pub struct RedisBackend {
    config: RedisBackendConfig,
    connection: Arc<RwLock<Option<ConnectionManager>>>,
    events: broadcast::Sender<ConnectionEvent>,
    recovering: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisBackend {
    /// Creates a backend; no connection is made until `connect`
    pub fn new(config: RedisBackendConfig) -> Self {
        let (events, _) = broadcast::channel(32);

        Self {
            config,
            connection: Arc::new(RwLock::new(None)),
            events,
            recovering: Arc::new(AtomicBool::new(false)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(RedisBackendConfig::new(url))
    }

    fn prefix_key(&self, key: &str) -> String {
        match &self.config.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }

    fn connection(&self) -> Result<ConnectionManager, DomainError> {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| DomainError::cache("Redis connection is not open"))
    }

    /// Runs one command under the command timeout
    async fn run<T, F>(&self, op: &str, key: &str, command: F) -> Result<T, DomainError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.config.command_timeout, command).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if is_connection_error(&e) {
                    self.report_connection_error(e.to_string());
                }
                Err(DomainError::cache(format!(
                    "Failed to {} '{}': {}",
                    op, key, e
                )))
            }
            Err(_) => {
                let message = format!(
                    "Timed out after {:?} trying to {} '{}'",
                    self.config.command_timeout, op, key
                );
                self.report_connection_error(message.clone());
                Err(DomainError::cache(message))
            }
        }
    }

    fn report_connection_error(&self, message: String) {
        warn!(error = %message, "Redis connection error");
        let _ = self.events.send(ConnectionEvent::Error(message));
        self.start_recovery();
    }

    /// Spawns the recovery task unless one is running or the backend was closed
    fn start_recovery(&self) {
        if self.closed.load(Ordering::SeqCst) || self.recovering.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let connection = self.connection.clone();
        let events = self.events.clone();
        let recovering = self.recovering.clone();
        let closed = self.closed.clone();

        let client = match open_client(&config) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Redis recovery not started");
                self.recovering.store(false, Ordering::SeqCst);
                return;
            }
        };

        tokio::spawn(async move {
            let _ = events.send(ConnectionEvent::Reconnecting);

            loop {
                tokio::time::sleep(config.reconnect_interval).await;

                if closed.load(Ordering::SeqCst) {
                    break;
                }

                let current = connection
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();

                let recovered = match current {
                    Some(mut conn) => {
                        let ping = tokio::time::timeout(
                            config.command_timeout,
                            redis::cmd("PING").query_async::<String>(&mut conn),
                        )
                        .await;
                        matches!(ping, Ok(Ok(_)))
                    }
                    None => match open_connection(client.clone(), &config).await {
                        Ok(manager) => {
                            if closed.load(Ordering::SeqCst) {
                                break;
                            }
                            *connection.write().unwrap_or_else(PoisonError::into_inner) = Some(manager);
                            let _ = events.send(ConnectionEvent::Connected);
                            true
                        }
                        Err(e) => {
                            debug!(error = %e, "Redis connection attempt failed");
                            false
                        }
                    },
                };

                if recovered {
                    info!("Redis answered again after connection error");
                    let _ = events.send(ConnectionEvent::Ready);
                    break;
                }

                debug!("Redis still unreachable, retrying");
            }

            recovering.store(false, Ordering::SeqCst);
        });
    }

    async fn scan(&self, conn: &mut ConnectionManager, pattern: &str) -> Result<Vec<String>, DomainError> {
        let mut cursor = 0u64;
        let mut found = Vec::new();

        loop {
            let (next, keys): (u64, Vec<String>) = self
                .run(
                    "scan",
                    pattern,
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(pattern)
                        .arg("COUNT")
                        .arg(100)
                        .query_async(&mut *conn),
                )
                .await?;

            found.extend(keys);
            cursor = next;

            if cursor == 0 {
                break;
            }
        }

        Ok(found)
    }
}

fn open_client(config: &RedisBackendConfig) -> Result<Client, DomainError> {
    Client::open(config.url.as_str())
        .map_err(|e| DomainError::cache(format!("Failed to create Redis client: {}", e)))
}

async fn open_connection(
    client: Client,
    config: &RedisBackendConfig,
) -> Result<ConnectionManager, DomainError> {
    tokio::time::timeout(config.connect_timeout, ConnectionManager::new(client))
        .await
        .map_err(|_| {
            DomainError::cache(format!(
                "Timed out after {:?} connecting to Redis",
                config.connect_timeout
            ))
        })?
        .map_err(|e| DomainError::cache(format!("Failed to connect to Redis: {}", e)))
}

fn is_connection_error(error: &RedisError) -> bool {
    error.is_connection_dropped()
        || error.is_connection_refusal()
        || error.is_io_error()
        || error.is_timeout()
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn connect(&self) -> Result<(), DomainError> {
        if self.is_open() {
            return Ok(());
        }

        self.closed.store(false, Ordering::SeqCst);

        let client = open_client(&self.config)?;

        let manager = match open_connection(client, &self.config).await {
            Ok(manager) => manager,
            Err(e) => {
                // Keep trying in the background; success is reported as Connected/Ready
                self.start_recovery();
                return Err(e);
            }
        };

        *self
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(manager);

        info!(prefix = ?self.config.key_prefix, "Redis connection established");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DomainError> {
        self.closed.store(true, Ordering::SeqCst);

        let previous = self
            .connection
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if previous.is_some() {
            info!("Redis connection closed");
        }

        Ok(())
    }

    fn is_open(&self) -> bool {
        self.connection
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection()?;

        self.run("get", key, conn.get(&prefixed_key)).await
    }

    async fn set_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection()?;

        match ttl {
            Some(ttl) => {
                let ttl_secs = ttl.as_secs().max(1);
                self.run("set", key, conn.set_ex(&prefixed_key, value, ttl_secs))
                    .await
            }
            None => self.run("set", key, conn.set(&prefixed_key, value)).await,
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection()?;

        let deleted: i32 = self.run("delete", key, conn.del(&prefixed_key)).await?;
        Ok(deleted > 0)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        let prefixed_pattern = self.prefix_key(pattern);
        let mut conn = self.connection()?;

        // SCAN rather than KEYS so a large keyspace does not block the server
        let keys = self.scan(&mut conn, &prefixed_pattern).await?;

        let mut total_deleted = 0usize;
        for chunk in keys.chunks(100) {
            let deleted: i32 = self
                .run("delete", pattern, conn.del(chunk))
                .await?;
            total_deleted += deleted as usize;
        }

        Ok(total_deleted)
    }

    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection()?;

        self.run("check existence of", key, conn.exists(&prefixed_key))
            .await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, DomainError> {
        let prefixed_key = self.prefix_key(key);
        let mut conn = self.connection()?;

        let ttl_secs = ttl.as_secs().max(1) as i64;

        self.run("update TTL for", key, conn.expire(&prefixed_key, ttl_secs))
            .await
    }

    async fn clear(&self) -> Result<(), DomainError> {
        // With a prefix only our own keys are removed; otherwise the whole database
        match &self.config.key_prefix {
            Some(_) => {
                self.delete_pattern("*").await?;
            }
            None => {
                let mut conn = self.connection()?;
                self.run("flush", "*", redis::cmd("FLUSHDB").query_async::<()>(&mut conn))
                    .await?;
            }
        }

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
