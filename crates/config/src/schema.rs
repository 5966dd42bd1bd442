//! Config schema types.

use std::collections::BTreeMap;

use {
    serde::{Deserialize, Serialize},
    strongroom_crypto::{DEFAULT_NAMESPACE, PluginSettings},
};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrongroomConfig {
    pub crypto: CryptoConfig,
}

/// Which crypto plugins to load, in which order, and with what settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Catalog namespace the plugin names are looked up in.
    pub namespace: String,
    /// Plugin names in priority order. The first plugin supporting a format
    /// handles it.
    pub enabled_plugins: Vec<String>,
    /// Per-plugin settings keyed by plugin name, passed through to the
    /// plugin's factory untouched.
    pub plugins: BTreeMap<String, serde_json::Value>,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.into(),
            enabled_plugins: vec!["software".into()],
            plugins: BTreeMap::new(),
        }
    }
}

// Plugin settings routinely hold key material, so only their names are shown.
impl std::fmt::Debug for CryptoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoConfig")
            .field("namespace", &self.namespace)
            .field("enabled_plugins", &self.enabled_plugins)
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CryptoConfig {
    /// Settings for every configured plugin, in the form the catalog expects.
    pub fn plugin_settings(&self) -> BTreeMap<String, PluginSettings> {
        self.plugins
            .iter()
            .map(|(name, value)| (name.clone(), PluginSettings::new(value.clone())))
            .collect()
    }
}
