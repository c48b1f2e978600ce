pub mod greeting;

pub use greeting::{GreetingPage, PLACEHOLDER_MESSAGE, SEED_MESSAGE, VISITS_KEY};
