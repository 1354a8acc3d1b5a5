use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ConfigError {
    /// Every required key that was absent or blank, in declaration order.
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    #[error("failed to extract configuration: {0}")]
    Extract(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Extract(Box::new(e))
    }
}
