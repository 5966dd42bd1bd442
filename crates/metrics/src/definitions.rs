//! Metric name and label definitions.

/// Crypto dispatch metrics
pub mod crypto {
    /// Number of plugins in the active registry
    pub const PLUGINS_LOADED: &str = "strongroom_crypto_plugins_loaded";
    /// Total number of calls handed to a plugin
    pub const DISPATCH_TOTAL: &str = "strongroom_crypto_dispatch_total";
    /// Time spent inside the selected plugin, in seconds
    pub const DISPATCH_DURATION_SECONDS: &str = "strongroom_crypto_dispatch_duration_seconds";
    /// Errors returned by the selected plugin
    pub const BACKEND_ERRORS_TOTAL: &str = "strongroom_crypto_backend_errors_total";
    /// Requests for a format no plugin supports
    pub const UNSUPPORTED_TOTAL: &str = "strongroom_crypto_unsupported_total";
    /// Decrypts rejected for missing input or empty output
    pub const NO_DATA_TOTAL: &str = "strongroom_crypto_no_data_total";
}

/// Common label keys used across metrics
pub mod labels {
    pub const DIRECTION: &str = "direction";
    pub const PLUGIN: &str = "plugin";
    pub const STAGE: &str = "stage";
}

