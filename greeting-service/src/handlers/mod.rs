pub mod greeting;
pub mod health;
pub mod reset;

pub use greeting::{greeting_view, view_greeting};
pub use health::{health_check, metrics_handler};
pub use reset::{reset_state, reset_stores};

use crate::services::{metrics::record_store_error, StoreError};

/// Count a failed store call and hand the error back unchanged. Logging
/// happens once, when the error becomes the response.
fn store_failure(err: StoreError) -> StoreError {
    record_store_error(err.store(), err.operation());
    err
}
