//! Shared MongoDB connection handle
//!
//! One `MongoConnection` exists per process. It is opened once at startup,
//! cloned into every component that needs data access, and closed on shutdown.
//! A closed handle is never reopened: every data access afterwards fails with
//! `DomainError::Unavailable`.

use std::sync::Arc;

use bson::doc;
use mongodb::{options::ClientOptions, Client, Collection, Database};
use serde::Serialize;
use tokio::sync::watch;

use crate::config::Config;
use crate::error::{ConnectionError, DomainError};

/// Database used when neither `MONGO_DB_NAME` nor the connection string names one
const DEFAULT_DATABASE: &str = "test";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// How strictly query filters are checked against the document schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Filters on unknown fields are rejected
    Strict,
    /// Filters are passed through to MongoDB as given
    #[default]
    Relaxed,
}

impl QueryMode {
    pub fn check_fields<'a>(
        self,
        fields: impl IntoIterator<Item = &'a str>,
        known: &[&str],
    ) -> Result<(), DomainError> {
        if self == QueryMode::Relaxed {
            return Ok(());
        }

        let unknown: Vec<&str> = fields
            .into_iter()
            .filter(|field| !known.contains(field))
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(format!(
                "Unknown filter fields: {}",
                unknown.join(", ")
            )))
        }
    }
}

#[derive(Clone)]
pub struct MongoConnection {
    inner: Arc<Inner>,
}

struct Inner {
    client: Client,
    database: Database,
    query_mode: QueryMode,
    state: watch::Sender<ConnectionState>,
}

impl MongoConnection {
    /// Connect with relaxed query filtering, the process-wide default.
    pub async fn connect(config: &Config) -> Result<Self, ConnectionError> {
        Self::connect_with(config, QueryMode::Relaxed).await
    }

    /// Open the client and verify the server answers a `ping`.
    ///
    /// Single attempt: the server selection timeout bounds how long this waits.
    pub async fn connect_with(
        config: &Config,
        query_mode: QueryMode,
    ) -> Result<Self, ConnectionError> {
        tracing::info!("Connecting to MongoDB...");
        let connection = Self::open(config, query_mode).await?;

        if let Err(e) = connection.inner.database.run_command(doc! { "ping": 1 }).await {
            tracing::error!("MongoDB connection failed: {}", e);
            connection.close(true).await;
            return Err(ConnectionError::Unreachable(e));
        }

        connection.inner.state.send_replace(ConnectionState::Open);
        tracing::info!(
            database = %connection.inner.database.name(),
            "MongoDB connection established"
        );
        Ok(connection)
    }

    async fn open(config: &Config, query_mode: QueryMode) -> Result<Self, ConnectionError> {
        let mut options = ClientOptions::parse(config.mongo_db_url.as_str())
            .await
            .map_err(ConnectionError::InvalidUri)?;
        options.server_selection_timeout = Some(config.connect_timeout);
        options
            .app_name
            .get_or_insert_with(|| env!("CARGO_PKG_NAME").to_string());

        let client = Client::with_options(options).map_err(ConnectionError::InvalidUri)?;
        let database = match &config.mongo_db_name {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };

        let (state, _) = watch::channel(ConnectionState::Connecting);

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                database,
                query_mode,
                state,
            }),
        })
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Watch the connection state (used by the health endpoint)
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn query_mode(&self) -> QueryMode {
        self.inner.query_mode
    }

    pub fn database(&self) -> Result<&Database, DomainError> {
        match self.state() {
            ConnectionState::Open => Ok(&self.inner.database),
            state => Err(DomainError::Unavailable(format!(
                "MongoDB connection is {:?}",
                state
            ))),
        }
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Result<Collection<T>, DomainError> {
        Ok(self.database()?.collection(name))
    }

    /// Close the connection. Closing an already closed handle does nothing.
    ///
    /// With `immediate`, outstanding cursors and sessions are not waited for.
    pub async fn close(&self, immediate: bool) {
        let previous = self.inner.state.send_replace(ConnectionState::Closed);
        if previous == ConnectionState::Closed {
            tracing::debug!("MongoDB connection already closed");
            return;
        }

        self.inner.client.clone().shutdown().immediate(immediate).await;

        if previous == ConnectionState::Open {
            tracing::info!("MongoDB connection closed due to application termination");
        }
    }
}

#[cfg(test)]
impl MongoConnection {
    /// Build an open handle without contacting a server.
    ///
    /// The driver connects lazily, so this is enough for lifecycle tests.
    pub async fn detached(query_mode: QueryMode) -> Self {
        let config = crate::test_utils::test_config("mongodb://127.0.0.1:1/unit");
        let connection = Self::open(&config, query_mode).await.unwrap();
        connection.inner.state.send_replace(ConnectionState::Open);
        connection
    }
}
