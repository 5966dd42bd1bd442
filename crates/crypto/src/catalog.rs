//! Named plugin factories and the loader that turns a namespace plus an
//! ordered list of names into a [`PluginRegistry`].
//!
//! Nothing is discovered at runtime: every factory is registered explicitly
//! at startup, and `load` only instantiates what the caller asks for, in the
//! order it asks for it.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Arc,
};

use {
    serde::de::DeserializeOwned,
    serde_json::Value,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    plugin::CryptoPlugin,
    registry::PluginRegistry,
    software::{self, SoftwareCryptoPlugin},
};

/// Namespace the built-in plugins are registered under.
pub const DEFAULT_NAMESPACE: &str = "strongroom.crypto.plugin";

/// Settings handed to a factory when its plugin is instantiated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginSettings(Value);

impl PluginSettings {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Deserialize into a plugin specific settings struct.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T> {
        let value = match &self.0 {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other.clone(),
        };
        serde_json::from_value(value).map_err(|e| Error::Config(e.to_string()))
    }
}

impl From<Value> for PluginSettings {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Builds a live plugin from its settings.
pub trait PluginFactory: Send + Sync {
    fn create(&self, settings: &PluginSettings) -> Result<Arc<dyn CryptoPlugin>>;
}

impl<F> PluginFactory for F
where
    F: Fn(&PluginSettings) -> Result<Arc<dyn CryptoPlugin>> + Send + Sync,
{
    fn create(&self, settings: &PluginSettings) -> Result<Arc<dyn CryptoPlugin>> {
        self(settings)
    }
}

/// Table of plugin factories keyed by namespace and name.
#[derive(Default)]
pub struct PluginCatalog {
    factories: HashMap<String, BTreeMap<String, Arc<dyn PluginFactory>>>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog with the built-in plugins under [`DEFAULT_NAMESPACE`].
    pub fn with_builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register(
            DEFAULT_NAMESPACE,
            software::NAME,
            |settings: &PluginSettings| -> Result<Arc<dyn CryptoPlugin>> {
                Ok(Arc::new(SoftwareCryptoPlugin::from_settings(settings)?))
            },
        );
        catalog
    }

    /// Register a factory. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(
        &mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        factory: impl PluginFactory + 'static,
    ) -> &mut Self {
        let namespace = namespace.into();
        let name = name.into();
        let previous = self
            .factories
            .entry(namespace.clone())
            .or_default()
            .insert(name.clone(), Arc::new(factory));
        if previous.is_some() {
            warn!(%namespace, %name, "crypto plugin factory replaced");
        }
        self
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.factories
            .get(namespace)
            .is_some_and(|names| names.contains_key(name))
    }

    /// Names registered in `namespace`, sorted.
    pub fn available(&self, namespace: &str) -> Vec<&str> {
        self.factories
            .get(namespace)
            .map(|names| names.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Instantiate `names` from `namespace`, in order.
    ///
    /// Fails on the first name that is unknown, listed twice, or whose
    /// factory errors. Nothing is retried and no other plugin is substituted.
    pub fn load<S: AsRef<str>>(
        &self,
        namespace: &str,
        names: &[S],
        settings: &BTreeMap<String, PluginSettings>,
    ) -> Result<PluginRegistry> {
        let empty = PluginSettings::default();
        let mut seen = HashSet::new();
        let mut builder = PluginRegistry::builder().with_namespace(namespace);

        for name in names {
            let name = name.as_ref();
            if !seen.insert(name) {
                return Err(Error::plugin_load(namespace, name, "listed more than once"));
            }

            let factory = self
                .factories
                .get(namespace)
                .and_then(|names| names.get(name))
                .ok_or_else(|| Error::plugin_load(namespace, name, "no such plugin"))?;

            let plugin_settings = settings.get(name).unwrap_or(&empty);
            let plugin = factory
                .create(plugin_settings)
                .map_err(|e| Error::plugin_factory_failed(namespace, name, e))?;

            if plugin.name() != name {
                debug!(
                    requested = name,
                    reported = plugin.name(),
                    "crypto plugin reports a different name"
                );
            }
            info!(%namespace, plugin = name, "crypto plugin loaded");
            builder.register(plugin);
        }

        debug!(%namespace, count = names.len(), "crypto plugins loaded");
        builder.build()
    }
}
