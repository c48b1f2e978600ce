//! Startup phase: prove both stores answer before any request is served.
//!
//! Each store moves `Unconnected -> Connecting -> Connected | Failed`.
//! The relational store gets a bounded, fixed-interval retry; the cache store
//! gets exactly one attempt. The relational store must be connected before the
//! cache store is tried. Nothing here exits the process: failures come back
//! as [`BootstrapError`] and the entry point decides what to do.

use crate::services::store::{
    CacheConnector, GreetingStore, RelationalConnector, StoreError, VisitCounter,
};
use service_core::retry::{retry_fixed, RetryPolicy, Sleeper};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("relational store unreachable after {attempts} attempt(s): {last}")]
    RelationalUnavailable {
        attempts: u32,
        #[source]
        last: StoreError,
    },

    #[error("cache store unreachable: {0}")]
    CacheUnavailable(#[source] StoreError),
}

/// Live, verified handles to both stores. Only [`bootstrap`] builds one, so a
/// handler can never see a store that skipped its liveness check.
#[derive(Clone)]
pub struct StoreHandles {
    greetings: Arc<dyn GreetingStore>,
    visits: Arc<dyn VisitCounter>,
}

impl StoreHandles {
    pub fn greetings(&self) -> &dyn GreetingStore {
        self.greetings.as_ref()
    }

    pub fn visits(&self) -> &dyn VisitCounter {
        self.visits.as_ref()
    }

    /// Release both stores. Called once the server has stopped.
    pub async fn close(&self) {
        self.visits.close().await;
        self.greetings.close().await;
    }
}

/// Open the relational store and confirm it answers, retrying per `policy`.
#[instrument(skip_all, fields(store = "postgres", max_attempts = policy.max_attempts))]
pub async fn connect_relational(
    connector: &dyn RelationalConnector,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<Arc<dyn GreetingStore>, BootstrapError> {
    info!("Connecting to relational store");

    let result: Result<Arc<dyn GreetingStore>, StoreError> =
        retry_fixed(policy, sleeper, "connect_relational", |attempt| async move {
            info!(attempt, "Relational store connection attempt");
            let store = connector.connect().await?;
            if let Err(e) = store.ping().await {
                store.close().await;
                return Err(e);
            }
            Ok(store)
        })
        .await;

    match result {
        Ok(store) => {
            info!("Successfully connected to the relational store");
            Ok(store)
        }
        Err(last) => {
            error!(kind = last.kind(), "Failed to connect to the relational store");
            Err(BootstrapError::RelationalUnavailable {
                attempts: policy.max_attempts.max(1),
                last,
            })
        }
    }
}

/// Open the cache store and confirm it answers. One attempt, no retry.
#[instrument(skip_all, fields(store = "redis"))]
pub async fn connect_cache(
    connector: &dyn CacheConnector,
) -> Result<Arc<dyn VisitCounter>, BootstrapError> {
    info!("Connecting to cache store");

    let store = connector.connect().await.map_err(|e| {
        error!(kind = e.kind(), "Failed to connect to the cache store");
        BootstrapError::CacheUnavailable(e)
    })?;

    if let Err(e) = store.ping().await {
        error!(kind = e.kind(), "Cache store did not answer PING");
        store.close().await;
        return Err(BootstrapError::CacheUnavailable(e));
    }

    info!("Successfully connected to the cache store");
    Ok(store)
}

/// Run the whole startup phase: relational first, then cache.
pub async fn bootstrap(
    relational: &dyn RelationalConnector,
    cache: &dyn CacheConnector,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<StoreHandles, BootstrapError> {
    let greetings = connect_relational(relational, policy, sleeper).await?;

    let visits = match connect_cache(cache).await {
        Ok(visits) => visits,
        Err(e) => {
            greetings.close().await;
            return Err(e);
        }
    };

    Ok(StoreHandles { greetings, visits })
}
