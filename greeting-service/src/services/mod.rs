//! Services module for greeting-service.

pub mod database;
pub mod metrics;
pub mod redis;
pub mod store;

pub use self::database::{Database, PostgresConnector};
pub use self::metrics::{get_metrics, init_metrics};
pub use self::redis::{RedisConnector, RedisService};
pub use self::store::{CacheConnector, GreetingStore, RelationalConnector, StoreError, VisitCounter};
