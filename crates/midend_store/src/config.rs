//! Store configuration.

/// Configuration for a [`Store`](crate::Store).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Install the [`ErrorLogger`](crate::ErrorLogger) middleware first in the chain.
    pub log_errors: bool,
}

impl StoreConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables error logging.
    #[must_use]
    pub fn with_log_errors(mut self, enabled: bool) -> Self {
        self.log_errors = enabled;
        self
    }
}
