//! Secret, encrypted datum, and tenant types passed through the router.
//!
//! These are owned by the caller. The router only reads
//! [`Secret::mime_type`] and whether any encrypted data is attached;
//! everything else is for the plugins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A secret as seen by the crypto layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Format identifier used to pick a plugin on encrypt.
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bit_length: Option<u32>,
    /// Encrypted payloads, oldest first.
    #[serde(default)]
    pub encrypted_data: Vec<EncryptedDatum>,
}

impl Secret {
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_encrypted_data(mut self, datum: EncryptedDatum) -> Self {
        self.encrypted_data.push(datum);
        self
    }

    /// `true` when at least one datum carries a non-empty cypher text.
    pub fn has_encrypted_data(&self) -> bool {
        self.encrypted_data.iter().any(|d| !d.cypher_text.is_empty())
    }

    /// The most recently attached datum.
    pub fn latest_datum(&self) -> Option<&EncryptedDatum> {
        self.encrypted_data.last()
    }
}

/// Output of a plugin's encrypt: the cypher text plus whatever the backend
/// needs to decrypt it later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedDatum {
    /// Name of the plugin that produced this datum.
    pub plugin: String,
    pub mime_type: String,
    #[serde(with = "b64")]
    pub cypher_text: Vec<u8>,
    /// Key references, cipher tags, IVs... Backend specific.
    #[serde(default)]
    pub kek_meta: BTreeMap<String, String>,
}

impl EncryptedDatum {
    pub fn new(
        plugin: impl Into<String>,
        mime_type: impl Into<String>,
        cypher_text: Vec<u8>,
    ) -> Self {
        Self {
            plugin: plugin.into(),
            mime_type: mime_type.into(),
            cypher_text,
            kek_meta: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.kek_meta.insert(key.into(), value.into());
        self
    }
}

/// Caller identity. Opaque to the router.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
}

impl Tenant {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

mod b64 {
    use {
        base64::Engine,
        serde::{Deserialize, Deserializer, Serializer},
    };

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(serde::de::Error::custom)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_without_data_has_no_payload() {
        let secret = Secret::new("text/plain");
        assert!(!secret.has_encrypted_data());
        assert!(secret.latest_datum().is_none());
    }

    #[test]
    fn empty_cypher_text_does_not_count_as_data() {
        let secret = Secret::new("text/plain")
            .with_encrypted_data(EncryptedDatum::new("x", "text/plain", vec![]));
        assert!(!secret.has_encrypted_data());
    }

    #[test]
    fn latest_datum_is_the_last_attached() {
        let secret = Secret::new("text/plain")
            .with_encrypted_data(EncryptedDatum::new("a", "text/plain", b"old".to_vec()))
            .with_encrypted_data(EncryptedDatum::new("b", "text/plain", b"new".to_vec()));
        assert!(secret.has_encrypted_data());
        assert_eq!(secret.latest_datum().unwrap().plugin, "b");
    }

    #[test]
    fn cypher_text_serializes_as_base64() {
        let datum = EncryptedDatum::new("software", "text/plain", vec![0xde, 0xad, 0xbe, 0xef])
            .with_meta("cipher", "xchacha20poly1305");
        let json = serde_json::to_value(&datum).unwrap();
        assert_eq!(json["cypher_text"], "3q2+7w==");
        assert_eq!(json["kek_meta"]["cipher"], "xchacha20poly1305");

        let back: EncryptedDatum = serde_json::from_value(json).unwrap();
        assert_eq!(back, datum);
    }

    #[test]
    fn secret_json_defaults_missing_fields() {
        let secret: Secret = serde_json::from_str(r#"{"mime_type":"text/plain"}"#).unwrap();
        assert_eq!(secret.mime_type, "text/plain");
        assert!(secret.encrypted_data.is_empty());
        assert!(secret.name.is_none());
    }
}
