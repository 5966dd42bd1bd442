//! Ordered, immutable collection of live crypto plugins.

use std::{collections::HashSet, fmt, sync::Arc};

use tracing::info;

use crate::{
    error::{Error, Result},
    plugin::CryptoPlugin,
};

/// Outcome of scanning the registry for a format.
pub enum Selection<'a> {
    /// The first plugin (in registration order) that supports the format.
    Matched {
        position: usize,
        plugin: &'a Arc<dyn CryptoPlugin>,
    },
    /// Every plugin was asked and none supports the format.
    NoneMatched,
}

impl Selection<'_> {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    /// Name of the selected plugin, if any.
    pub fn plugin_name(&self) -> Option<&str> {
        match self {
            Self::Matched { plugin, .. } => Some(plugin.name()),
            Self::NoneMatched => None,
        }
    }
}

/// Plugins in registration order. Order is the tie-break when several
/// plugins support the same format: the earliest one wins.
///
/// There is no way to add or remove a plugin once built.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Arc<[Arc<dyn CryptoPlugin>]>,
}

impl PluginRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Plugins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn CryptoPlugin>> {
        self.plugins.iter()
    }

    /// Plugin names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|p| p.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CryptoPlugin>> {
        self.iter().find(|p| p.name() == name)
    }

    /// Scan in order and stop at the first plugin that supports `mime_type`.
    pub fn select(&self, mime_type: &str) -> Selection<'_> {
        self.iter()
            .enumerate()
            .find(|(_, plugin)| plugin.supports(mime_type))
            .map_or(Selection::NoneMatched, |(position, plugin)| {
                Selection::Matched { position, plugin }
            })
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

/// Collects plugins before freezing them into a [`PluginRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    namespace: String,
    plugins: Vec<Arc<dyn CryptoPlugin>>,
}

impl RegistryBuilder {
    /// Namespace reported in load errors.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Append a plugin after all previously registered ones.
    pub fn register(&mut self, plugin: Arc<dyn CryptoPlugin>) -> &mut Self {
        self.plugins.push(plugin);
        self
    }

    #[must_use]
    pub fn with_plugin(mut self, plugin: Arc<dyn CryptoPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Freeze the registry. Two plugins sharing a name are rejected.
    pub fn build(self) -> Result<PluginRegistry> {
        let mut seen = HashSet::new();
        for plugin in &self.plugins {
            if !seen.insert(plugin.name().to_string()) {
                return Err(Error::plugin_load(
                    &self.namespace,
                    plugin.name(),
                    "registered more than once",
                ));
            }
        }
        info!(
            namespace = %self.namespace,
            plugins = ?self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "crypto plugin registry built"
        );
        Ok(PluginRegistry {
            plugins: self.plugins.into(),
        })
    }
}
