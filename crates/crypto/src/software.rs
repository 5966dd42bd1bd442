//! Software-only crypto plugin: a single key-encryption key held in memory.
//!
//! Cypher text layout:
//!
//! ```text
//! [version: 1 byte][nonce: 24 bytes][XChaCha20-Poly1305 ciphertext + tag]
//! ```
//!
//! The tenant id is bound as associated data, so a datum encrypted for one
//! tenant cannot be decrypted under another.

use {
    async_trait::async_trait,
    base64::Engine,
    chacha20poly1305::{
        XChaCha20Poly1305, XNonce,
        aead::{Aead, KeyInit, Payload},
    },
    rand::RngCore,
    serde::Deserialize,
    tracing::debug,
    zeroize::Zeroizing,
};

use crate::{
    catalog::PluginSettings,
    error::{Error, Result},
    plugin::CryptoPlugin,
    secret::{EncryptedDatum, Secret, Tenant},
};

/// Registration name of the software plugin.
pub const NAME: &str = "software";

/// Formats handled when the settings do not say otherwise.
pub const DEFAULT_MIME_TYPES: &[&str] = &["text/plain", "application/octet-stream"];

/// KEK length in bytes.
pub const KEY_LEN: usize = 32;

/// First byte of every cypher text this plugin writes.
pub const VERSION: u8 = 0x01;

const ALGORITHM: &str = "xchacha20poly1305";
const NONCE_LEN: usize = 24;

#[derive(Deserialize)]
struct SoftwareSettings {
    /// Base64 encoded 32-byte key-encryption key.
    kek: String,
    #[serde(default)]
    mime_types: Option<Vec<String>>,
}

/// Encrypts with a locally held KEK.
pub struct SoftwareCryptoPlugin {
    kek: Zeroizing<[u8; KEY_LEN]>,
    mime_types: Vec<String>,
}

impl SoftwareCryptoPlugin {
    pub fn new(kek: [u8; KEY_LEN]) -> Self {
        Self {
            kek: Zeroizing::new(kek),
            mime_types: DEFAULT_MIME_TYPES.iter().map(|m| (*m).to_string()).collect(),
        }
    }

    /// Build from catalog settings: `{"kek": "<base64>", "mime_types": [...]}`.
    pub fn from_settings(settings: &PluginSettings) -> Result<Self> {
        let parsed: SoftwareSettings = settings.parse()?;
        let encoded = Zeroizing::new(parsed.kek);
        let decoded = Zeroizing::new(
            base64::engine::general_purpose::STANDARD.decode(encoded.as_bytes())?,
        );
        let kek: Zeroizing<[u8; KEY_LEN]> = Zeroizing::new(
            decoded.as_slice().try_into().map_err(|_| {
                Error::Config(format!("kek must be {KEY_LEN} bytes, got {}", decoded.len()))
            })?,
        );

        let plugin = Self::new(*kek);
        Ok(match parsed.mime_types {
            Some(types) if !types.is_empty() => plugin.with_mime_types(types),
            _ => plugin,
        })
    }

    /// Replace the handled formats.
    #[must_use]
    pub fn with_mime_types<I, S>(mut self, mime_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mime_types = mime_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn mime_types(&self) -> &[String] {
        &self.mime_types
    }

    fn aead(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new((&*self.kek).into())
    }

    /// Seal `plaintext` for `tenant` into the versioned layout.
    fn seal(&self, plaintext: &[u8], tenant: &Tenant) -> Result<Vec<u8>> {
        let mut nonce = XNonce::default();
        rand::rng().fill_bytes(nonce.as_mut_slice());

        let sealed = self
            .aead()
            .encrypt(&nonce, Payload {
                msg: plaintext,
                aad: tenant.id.as_bytes(),
            })
            .map_err(|e| Error::Cipher(e.to_string()))?;

        let mut out = Vec::with_capacity(1 + NONCE_LEN + sealed.len());
        out.push(VERSION);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    /// Reverse of [`seal`](Self::seal). `cypher_text` must not be empty.
    fn open(&self, cypher_text: &[u8], tenant: &Tenant) -> Result<Vec<u8>> {
        let Some((&version, rest)) = cypher_text.split_first() else {
            return Err(Error::Cipher("cypher text is empty".into()));
        };
        if version != VERSION {
            return Err(Error::Cipher(format!(
                "unsupported cipher version: {version:#04x}, expected {VERSION:#04x}"
            )));
        }
        let Some((nonce, sealed)) = rest.split_at_checked(NONCE_LEN) else {
            return Err(Error::Cipher("cypher text truncated".into()));
        };
        let nonce: &XNonce = nonce.into();

        self.aead()
            .decrypt(nonce, Payload {
                msg: sealed,
                aad: tenant.id.as_bytes(),
            })
            .map_err(|e| Error::Cipher(e.to_string()))
    }
}

#[async_trait]
impl CryptoPlugin for SoftwareCryptoPlugin {
    fn name(&self) -> &str {
        NAME
    }

    // MIME types compare case-insensitively.
    fn supports(&self, mime_type: &str) -> bool {
        self.mime_types
            .iter()
            .any(|m| m.eq_ignore_ascii_case(mime_type))
    }

    async fn encrypt(
        &self,
        unencrypted: &[u8],
        secret: &Secret,
        tenant: &Tenant,
    ) -> Result<EncryptedDatum> {
        let cypher_text = self.seal(unencrypted, tenant)?;

        debug!(tenant = %tenant.id, bytes = unencrypted.len(), "software plugin encrypted secret");

        Ok(EncryptedDatum::new(NAME, &secret.mime_type, cypher_text)
            .with_meta("cipher", ALGORITHM)
            .with_meta("version", format!("{VERSION:#04x}")))
    }

    async fn decrypt(
        &self,
        accept: &str,
        secret: &Secret,
        tenant: &Tenant,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let datum = secret
            .encrypted_data
            .iter()
            .rev()
            .find(|d| d.plugin == NAME)
            .filter(|d| !d.cypher_text.is_empty())
            .ok_or_else(|| Error::no_secret_or_data(accept))?;

        Ok(Zeroizing::new(self.open(&datum.cypher_text, tenant)?))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const KEK: [u8; KEY_LEN] = [0x07; KEY_LEN];

    fn tenant(id: &str) -> Tenant {
        Tenant::new(id)
    }

    #[test]
    fn supports_default_formats_case_insensitively() {
        let plugin = SoftwareCryptoPlugin::new(KEK);
        assert!(plugin.supports("text/plain"));
        assert!(plugin.supports("Application/Octet-Stream"));
        assert!(!plugin.supports("application/pkcs8"));
    }

    #[test]
    fn mime_types_can_be_replaced() {
        let plugin = SoftwareCryptoPlugin::new(KEK).with_mime_types(["application/pkcs8"]);
        assert!(plugin.supports("application/pkcs8"));
        assert!(!plugin.supports("text/plain"));
    }

    #[tokio::test]
    async fn encrypt_then_decrypt_for_same_tenant() {
        let plugin = SoftwareCryptoPlugin::new(KEK);
        let secret = Secret::new("text/plain");

        let datum = plugin
            .encrypt(b"hunter2", &secret, &tenant("acme"))
            .await
            .unwrap();
        assert_eq!(datum.plugin, NAME);
        assert_eq!(datum.mime_type, "text/plain");
        assert_eq!(datum.cypher_text[0], VERSION);
        assert_eq!(datum.kek_meta["cipher"], "xchacha20poly1305");

        let secret = secret.with_encrypted_data(datum);
        let plaintext = plugin
            .decrypt("text/plain", &secret, &tenant("acme"))
            .await
            .unwrap();
        assert_eq!(plaintext.as_slice(), b"hunter2");
    }

    #[tokio::test]
    async fn other_tenant_cannot_decrypt() {
        let plugin = SoftwareCryptoPlugin::new(KEK);
        let datum = plugin
            .encrypt(b"hunter2", &Secret::new("text/plain"), &tenant("acme"))
            .await
            .unwrap();
        let secret = Secret::new("text/plain").with_encrypted_data(datum);

        let err = plugin
            .decrypt("text/plain", &secret, &tenant("globex"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cipher(_)));
    }

    #[tokio::test]
    async fn datum_from_another_plugin_is_not_used() {
        let plugin = SoftwareCryptoPlugin::new(KEK);
        let secret = Secret::new("text/plain")
            .with_encrypted_data(EncryptedDatum::new("hsm", "text/plain", b"opaque".to_vec()));

        let err = plugin
            .decrypt("text/plain", &secret, &tenant("acme"))
            .await
            .unwrap_err();
        assert!(err.is_no_data());
    }

    #[tokio::test]
    async fn unknown_version_tag_is_rejected() {
        let plugin = SoftwareCryptoPlugin::new(KEK);
        let secret = Secret::new("text/plain")
            .with_encrypted_data(EncryptedDatum::new(NAME, "text/plain", vec![0x7f; 64]));

        let err = plugin
            .decrypt("text/plain", &secret, &tenant("acme"))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "cipher error: unsupported cipher version: 0x7f, expected 0x01"
        );
    }

    #[test]
    fn empty_plaintext_still_carries_nonce_and_tag() {
        let plugin = SoftwareCryptoPlugin::new(KEK);
        let sealed = plugin.seal(b"", &tenant("acme")).unwrap();
        assert_eq!(sealed.len(), 1 + NONCE_LEN + 16);
        assert!(plugin.open(&sealed, &tenant("acme")).unwrap().is_empty());
    }

    #[test]
    fn nonces_are_fresh_per_call() {
        let plugin = SoftwareCryptoPlugin::new(KEK);
        let a = plugin.seal(b"same", &tenant("acme")).unwrap();
        let b = plugin.seal(b"same", &tenant("acme")).unwrap();
        assert_ne!(a[1..=NONCE_LEN], b[1..=NONCE_LEN]);
    }

    #[test]
    fn other_kek_cannot_open() {
        let sealed = SoftwareCryptoPlugin::new(KEK)
            .seal(b"secret", &tenant("acme"))
            .unwrap();
        let err = SoftwareCryptoPlugin::new([0x08; KEY_LEN])
            .open(&sealed, &tenant("acme"))
            .unwrap_err();
        assert!(matches!(err, Error::Cipher(_)));
    }

    #[test]
    fn truncated_cypher_text_is_rejected() {
        let plugin = SoftwareCryptoPlugin::new(KEK);
        let sealed = plugin.seal(b"secret", &tenant("acme")).unwrap();
        let err = plugin.open(&sealed[..NONCE_LEN], &tenant("acme")).unwrap_err();
        assert_eq!(err.to_string(), "cipher error: cypher text truncated");
        assert!(plugin.open(&sealed[..NONCE_LEN + 8], &tenant("acme")).is_err());
    }

    #[tokio::test]
    async fn empty_software_datum_is_no_data() {
        let plugin = SoftwareCryptoPlugin::new(KEK);
        let secret = Secret::new("text/plain")
            .with_encrypted_data(EncryptedDatum::new(NAME, "text/plain", Vec::new()));
        let err = plugin
            .decrypt("text/plain", &secret, &tenant("acme"))
            .await
            .unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn settings_require_a_32_byte_kek() {
        let short = PluginSettings::new(serde_json::json!({ "kek": "AAAA" }));
        assert!(matches!(
            SoftwareCryptoPlugin::from_settings(&short),
            Err(Error::Config(_))
        ));

        let missing = PluginSettings::new(serde_json::json!({}));
        assert!(SoftwareCryptoPlugin::from_settings(&missing).is_err());
    }

    #[test]
    fn settings_override_mime_types() {
        let kek = base64::engine::general_purpose::STANDARD.encode(KEK);
        let settings = PluginSettings::new(serde_json::json!({
            "kek": kek,
            "mime_types": ["application/x-pem-file"],
        }));
        let plugin = SoftwareCryptoPlugin::from_settings(&settings).unwrap();
        assert_eq!(plugin.mime_types(), ["application/x-pem-file"]);
    }
}
