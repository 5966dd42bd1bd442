//! Plugin-routed encryption and decryption of secrets.
//!
//! A [`CryptoRouter`] holds an ordered [`PluginRegistry`] of
//! [`CryptoPlugin`] backends and sends each encrypt/decrypt to the first
//! plugin that supports the requested format. Registries are built once,
//! either by hand through [`PluginRegistry::builder`] or from a
//! [`PluginCatalog`] of named factories, and never change afterwards.

pub mod catalog;
pub mod error;
pub mod plugin;
pub mod registry;
pub mod router;
pub mod secret;
pub mod software;

pub use {
    catalog::{DEFAULT_NAMESPACE, PluginCatalog, PluginFactory, PluginSettings},
    error::{Error, Result},
    plugin::CryptoPlugin,
    registry::{PluginRegistry, RegistryBuilder, Selection},
    router::CryptoRouter,
    secret::{EncryptedDatum, Secret, Tenant},
    software::SoftwareCryptoPlugin,
};
