mod cache;
mod config;
mod format;
mod payload;

pub use cache::Cache;
pub use config::CacheConfig;
pub use payload::{Payload, PayloadKind};
