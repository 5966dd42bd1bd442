//! Crypto dispatch error types.

/// Errors produced by the router, the plugin catalog, and plugins themselves.
///
/// Plugins return this type too, so a backend failure reaches the caller of
/// [`CryptoRouter`](crate::CryptoRouter) exactly as the plugin produced it.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No registered plugin supports the secret's format on encrypt.
    #[error("crypto mime type of '{mime_type}' not supported")]
    MimeTypeNotSupported { mime_type: String },

    /// No registered plugin supports the requested accept format on decrypt.
    #[error("crypto accept of '{accept}' not supported")]
    AcceptNotSupported { accept: String },

    /// The secret has no encrypted payload, or the selected plugin produced
    /// no plaintext.
    #[error("no secret information available for mime type of {mime_type}")]
    NoSecretOrData { mime_type: String },

    /// A requested plugin could not be instantiated.
    #[error("failed to load crypto plugin '{name}' from '{namespace}': {reason}")]
    PluginLoad {
        namespace: String,
        name: String,
        reason: String,
        /// The factory's own error, when it was the factory that failed.
        #[source]
        source: Option<Box<Error>>,
    },

    /// Encryption or decryption failed (tampered data, wrong key, wrong tenant).
    #[error("cipher error: {0}")]
    Cipher(String),

    /// Invalid plugin settings.
    #[error("invalid plugin settings: {0}")]
    Config(String),

    /// Failure raised inside a backend (HSM, KMS, ...).
    #[error("{plugin} backend error: {source}")]
    Backend {
        plugin: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn mime_type_not_supported(mime_type: impl Into<String>) -> Self {
        Self::MimeTypeNotSupported {
            mime_type: mime_type.into(),
        }
    }

    #[must_use]
    pub fn accept_not_supported(accept: impl Into<String>) -> Self {
        Self::AcceptNotSupported {
            accept: accept.into(),
        }
    }

    #[must_use]
    pub fn no_secret_or_data(mime_type: impl Into<String>) -> Self {
        Self::NoSecretOrData {
            mime_type: mime_type.into(),
        }
    }

    #[must_use]
    pub fn plugin_load(
        namespace: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::PluginLoad {
            namespace: namespace.into(),
            name: name.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// A factory returned `source` while building the plugin.
    #[must_use]
    pub fn plugin_factory_failed(
        namespace: impl Into<String>,
        name: impl Into<String>,
        source: Error,
    ) -> Self {
        Self::PluginLoad {
            namespace: namespace.into(),
            name: name.into(),
            reason: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn backend(
        plugin: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            plugin: plugin.into(),
            source: Box::new(source),
        }
    }

    /// Returns `true` for either direction's "no plugin supports this format".
    #[must_use]
    pub fn is_not_supported(&self) -> bool {
        matches!(
            self,
            Self::MimeTypeNotSupported { .. } | Self::AcceptNotSupported { .. }
        )
    }

    #[must_use]
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoSecretOrData { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
