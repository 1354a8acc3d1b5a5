pub mod backend;
pub mod config;
pub mod error;
pub mod publish;
pub(crate) mod utils;

pub use config::{Config, PublisherSettings};
pub use error::{BackendError, ConfigError, Phase, PublisherError};
pub use publish::{PublishReport, Publisher, publish};
