mod backend;
mod config;
mod publisher;

pub use backend::BackendError;
pub use config::ConfigError;
pub use publisher::{Phase, PublisherError};
