use crate::bootstrap::StoreHandles;
use crate::handlers::store_failure;
use crate::models::GreetingPage;
use crate::services::{metrics::record_visit, StoreError};
use crate::startup::AppState;
use axum::extract::State;
use service_core::error::AppError;
use tracing::instrument;

/// `GET /`
pub async fn greeting_view(State(state): State<AppState>) -> Result<GreetingPage, AppError> {
    view_greeting(&state.stores).await.map_err(AppError::from)
}

/// Count the visit, then read the greeting.
///
/// The counter goes first: if the cache fails the greeting is never read. If
/// the greeting read fails afterwards the increment stands, so the count may
/// run ahead of pages actually rendered.
#[instrument(skip_all)]
pub async fn view_greeting(stores: &StoreHandles) -> Result<GreetingPage, StoreError> {
    let visits = stores.visits().increment().await.map_err(store_failure)?;
    record_visit();

    let message = stores
        .greetings()
        .fetch_greeting()
        .await
        .map_err(store_failure)?;

    Ok(GreetingPage::new(message, visits))
}
