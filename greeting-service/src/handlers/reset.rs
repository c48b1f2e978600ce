use crate::bootstrap::StoreHandles;
use crate::handlers::store_failure;
use crate::models::SEED_MESSAGE;
use crate::services::{metrics::record_reset, StoreError};
use crate::startup::AppState;
use askama::Template;
use axum::extract::State;
use service_core::error::AppError;
use tracing::{info, instrument};

#[derive(Template)]
#[template(path = "reset.html")]
pub struct ResetTemplate {}

/// `GET /init-db`
pub async fn reset_state(State(state): State<AppState>) -> Result<ResetTemplate, AppError> {
    match reset_stores(&state.stores).await {
        Ok(()) => {
            record_reset("ok");
            Ok(ResetTemplate {})
        }
        Err(e) => {
            record_reset("error");
            Err(e.into())
        }
    }
}

/// Recreate the greetings table with one seed row, then zero the counter.
///
/// Steps run in order and stop at the first failure without undoing earlier
/// ones. A failure on the counter leaves the freshly seeded table in place.
#[instrument(skip_all)]
pub async fn reset_stores(stores: &StoreHandles) -> Result<(), StoreError> {
    let greetings = stores.greetings();
    greetings.drop_table().await.map_err(store_failure)?;
    greetings.create_table().await.map_err(store_failure)?;
    greetings
        .insert_greeting(SEED_MESSAGE)
        .await
        .map_err(store_failure)?;

    stores.visits().reset().await.map_err(store_failure)?;

    info!("Greeting table reseeded and visit counter reset");
    Ok(())
}
