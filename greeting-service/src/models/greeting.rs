//! Greeting record and the page rendered from it.

use askama::Template;

/// Message inserted by a reset.
pub const SEED_MESSAGE: &str = "Hello from the PostgreSQL database, served by Rust!";

/// Shown when the greetings table is missing or empty.
pub const PLACEHOLDER_MESSAGE: &str = "no greeting configured yet";

/// Cache key holding the visit counter.
pub const VISITS_KEY: &str = "visits";

/// What `GET /` renders: the stored message (or placeholder) and the visit
/// count captured for this request.
#[derive(Debug, Clone, PartialEq, Eq, Template)]
#[template(path = "greeting.html")]
pub struct GreetingPage {
    pub message: String,
    pub visits: i64,
}

impl GreetingPage {
    pub fn new(message: Option<String>, visits: i64) -> Self {
        Self {
            message: message.unwrap_or_else(|| PLACEHOLDER_MESSAGE.to_string()),
            visits,
        }
    }
}
