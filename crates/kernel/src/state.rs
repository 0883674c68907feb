//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::db;
use crate::models::{Question, Session};
use crate::query::{EntityStore, FieldRegistry, PgEntityStore, QueryService};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap. Generic over the entity
/// store so the same router runs on PostgreSQL or in memory.
pub struct AppState<S = PgEntityStore> {
    inner: Arc<AppStateInner<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppStateInner<S> {
    /// Field catalogs of every entity type, shared by all query services.
    registry: Arc<FieldRegistry>,

    store: Arc<S>,

    questions: QueryService<Question, S>,

    sessions: QueryService<Session, S>,
}

impl AppState<PgEntityStore> {
    /// Connect to PostgreSQL, apply migrations and build the services.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = db::create_pool(config)
            .await
            .context("failed to create database pool")?;
        db::run_migrations(&pool).await?;

        let store = PgEntityStore::new(pool, config.query_statement_timeout);
        info!(
            timeout_ms = config.query_timeout_millis(),
            "PostgreSQL entity store ready"
        );

        Ok(Self::with_store(Arc::new(store)))
    }
}

impl<S: EntityStore> AppState<S> {
    /// Build the state over an existing store, with a fresh registry.
    pub fn with_store(store: Arc<S>) -> Self {
        let registry = Arc::new(FieldRegistry::new());

        let questions = QueryService::new(Arc::clone(&registry), Arc::clone(&store))
            .with_default_order("created_at", false);
        let sessions = QueryService::new(Arc::clone(&registry), Arc::clone(&store))
            .with_default_order("start_time", false);

        Self {
            inner: Arc::new(AppStateInner {
                registry,
                store,
                questions,
                sessions,
            }),
        }
    }

    pub fn registry(&self) -> &Arc<FieldRegistry> {
        &self.inner.registry
    }

    pub fn questions(&self) -> &QueryService<Question, S> {
        &self.inner.questions
    }

    pub fn sessions(&self) -> &QueryService<Session, S> {
        &self.inner.sessions
    }

    /// Check if the backing store is reachable.
    pub async fn store_healthy(&self) -> bool {
        self.inner.store.healthy().await
    }
}
