//! Format-based selection and delegation to crypto plugins.
//!
//! Both directions scan the registry in registration order and hand the
//! call to the first plugin whose `supports` returns true. Decrypt adds two
//! checks around the delegation: a secret with nothing to decrypt is rejected
//! before any plugin is consulted, and a plugin that hands back no plaintext
//! is reported as missing data rather than success.

use std::collections::BTreeMap;

use {tracing::debug, zeroize::Zeroizing};

#[cfg(feature = "metrics")]
use strongroom_metrics::{counter, crypto as crypto_metrics, gauge, histogram, labels};

use crate::{
    catalog::{PluginCatalog, PluginSettings},
    error::{Error, Result},
    registry::{PluginRegistry, Selection},
    secret::{EncryptedDatum, Secret, Tenant},
};

/// Dispatches encrypt/decrypt to the first capable plugin.
///
/// Holds no mutable state, so one router can serve any number of concurrent
/// callers (share it behind an `Arc`).
#[derive(Debug, Clone)]
pub struct CryptoRouter {
    registry: PluginRegistry,
}

impl CryptoRouter {
    pub fn new(registry: PluginRegistry) -> Self {
        #[cfg(feature = "metrics")]
        gauge!(crypto_metrics::PLUGINS_LOADED).set(registry.len() as f64);

        Self { registry }
    }

    /// Load `names` from `namespace` in `catalog` and route over them.
    pub fn from_catalog<S: AsRef<str>>(
        catalog: &PluginCatalog,
        namespace: &str,
        names: &[S],
        settings: &BTreeMap<String, PluginSettings>,
    ) -> Result<Self> {
        Ok(Self::new(catalog.load(namespace, names, settings)?))
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Encrypt `unencrypted` with the first plugin supporting
    /// `secret.mime_type`.
    ///
    /// The plugin's result, success or error, is returned as is.
    pub async fn encrypt(
        &self,
        unencrypted: &[u8],
        secret: &Secret,
        tenant: &Tenant,
    ) -> Result<EncryptedDatum> {
        let plugin = match self.registry.select(&secret.mime_type) {
            Selection::Matched { position, plugin } => {
                debug!(
                    plugin = plugin.name(),
                    position,
                    mime_type = %secret.mime_type,
                    "routing encrypt"
                );
                plugin
            },
            Selection::NoneMatched => {
                #[cfg(feature = "metrics")]
                counter!(crypto_metrics::UNSUPPORTED_TOTAL, labels::DIRECTION => "encrypt")
                    .increment(1);
                return Err(Error::mime_type_not_supported(&secret.mime_type));
            },
        };

        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();

        let result = plugin.encrypt(unencrypted, secret, tenant).await;

        #[cfg(feature = "metrics")]
        record_dispatch("encrypt", plugin.name(), started, result.is_ok());

        result
    }

    /// Decrypt `secret` into the `accept` representation.
    ///
    /// Fails with [`Error::NoSecretOrData`] when `secret` is absent or has
    /// no encrypted payload (checked before any plugin is asked), and when
    /// the selected plugin returns an empty plaintext.
    pub async fn decrypt(
        &self,
        accept: &str,
        secret: Option<&Secret>,
        tenant: &Tenant,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let Some(secret) = secret.filter(|s| s.has_encrypted_data()) else {
            #[cfg(feature = "metrics")]
            counter!(crypto_metrics::NO_DATA_TOTAL, labels::STAGE => "input").increment(1);
            return Err(Error::no_secret_or_data(accept));
        };

        let plugin = match self.registry.select(accept) {
            Selection::Matched { position, plugin } => {
                debug!(plugin = plugin.name(), position, accept, "routing decrypt");
                plugin
            },
            Selection::NoneMatched => {
                #[cfg(feature = "metrics")]
                counter!(crypto_metrics::UNSUPPORTED_TOTAL, labels::DIRECTION => "decrypt")
                    .increment(1);
                return Err(Error::accept_not_supported(accept));
            },
        };

        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();

        let result = plugin.decrypt(accept, secret, tenant).await;

        #[cfg(feature = "metrics")]
        record_dispatch("decrypt", plugin.name(), started, result.is_ok());

        let plaintext = result?;
        if plaintext.is_empty() {
            debug!(plugin = plugin.name(), accept, "plugin returned no plaintext");
            #[cfg(feature = "metrics")]
            counter!(crypto_metrics::NO_DATA_TOTAL, labels::STAGE => "output").increment(1);
            return Err(Error::no_secret_or_data(accept));
        }

        Ok(plaintext)
    }
}

#[cfg(feature = "metrics")]
fn record_dispatch(
    direction: &'static str,
    plugin: &str,
    started: std::time::Instant,
    ok: bool,
) {
    let plugin = plugin.to_string();
    counter!(
        crypto_metrics::DISPATCH_TOTAL,
        labels::DIRECTION => direction,
        labels::PLUGIN => plugin.clone()
    )
    .increment(1);
    histogram!(
        crypto_metrics::DISPATCH_DURATION_SECONDS,
        labels::DIRECTION => direction
    )
    .record(started.elapsed().as_secs_f64());
    if !ok {
        counter!(
            crypto_metrics::BACKEND_ERRORS_TOTAL,
            labels::DIRECTION => direction,
            labels::PLUGIN => plugin
        )
        .increment(1);
    }
}
