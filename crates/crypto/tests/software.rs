#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;

use base64::Engine;

use strongroom_crypto::{
    CryptoRouter, DEFAULT_NAMESPACE, Error, PluginCatalog, PluginSettings, Secret, Tenant,
};

fn settings(mime_types: Option<&[&str]>) -> BTreeMap<String, PluginSettings> {
    let kek = base64::engine::general_purpose::STANDARD.encode([0x42u8; 32]);
    let mut value = serde_json::json!({ "kek": kek });
    if let Some(types) = mime_types {
        value["mime_types"] = serde_json::json!(types);
    }
    BTreeMap::from([("software".to_string(), PluginSettings::new(value))])
}

fn software_router() -> CryptoRouter {
    CryptoRouter::from_catalog(
        &PluginCatalog::with_builtin(),
        DEFAULT_NAMESPACE,
        &["software"],
        &settings(None),
    )
    .unwrap()
}

#[tokio::test]
async fn secret_survives_a_json_round_trip() {
    let router = software_router();
    let tenant = Tenant::new("acme");

    let secret = Secret::new("text/plain").with_name("db-password");
    let datum = router
        .encrypt(b"correct horse battery staple", &secret, &tenant)
        .await
        .unwrap();
    assert_eq!(datum.plugin, "software");
    assert_eq!(datum.kek_meta["cipher"], "xchacha20poly1305");

    let stored = serde_json::to_string(&secret.with_encrypted_data(datum)).unwrap();
    let loaded: Secret = serde_json::from_str(&stored).unwrap();

    let plaintext = router
        .decrypt("text/plain", Some(&loaded), &tenant)
        .await
        .unwrap();
    assert_eq!(plaintext.as_slice(), b"correct horse battery staple");
}

#[tokio::test]
async fn empty_payload_round_trips_to_missing_data() {
    let router = software_router();
    let tenant = Tenant::new("acme");

    let secret = Secret::new("application/octet-stream");
    let datum = router.encrypt(b"", &secret, &tenant).await.unwrap();
    // The datum still carries the version tag, nonce and auth tag.
    assert!(!datum.cypher_text.is_empty());

    let err = router
        .decrypt(
            "application/octet-stream",
            Some(&secret.with_encrypted_data(datum)),
            &tenant,
        )
        .await
        .unwrap_err();
    assert!(err.is_no_data());
}

#[tokio::test]
async fn tampered_cypher_text_is_a_backend_failure() {
    let router = software_router();
    let tenant = Tenant::new("acme");

    let secret = Secret::new("text/plain");
    let mut datum = router.encrypt(b"payload", &secret, &tenant).await.unwrap();
    let last = datum.cypher_text.len() - 1;
    datum.cypher_text[last] ^= 0xff;

    let err = router
        .decrypt("text/plain", Some(&secret.with_encrypted_data(datum)), &tenant)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cipher(_)));
    assert!(!err.is_not_supported());
}

#[tokio::test]
async fn configured_formats_replace_the_defaults() {
    let router = CryptoRouter::from_catalog(
        &PluginCatalog::with_builtin(),
        DEFAULT_NAMESPACE,
        &["software"],
        &settings(Some(&["application/pkcs8"])),
    )
    .unwrap();
    let tenant = Tenant::new("acme");

    assert!(
        router
            .encrypt(b"key", &Secret::new("application/pkcs8"), &tenant)
            .await
            .is_ok()
    );
    let err = router
        .encrypt(b"key", &Secret::new("text/plain"), &tenant)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MimeTypeNotSupported { .. }));
}

#[test]
fn unknown_plugin_name_fails_to_load() {
    let err = CryptoRouter::from_catalog(
        &PluginCatalog::with_builtin(),
        DEFAULT_NAMESPACE,
        &["software", "pkcs11"],
        &settings(None),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "failed to load crypto plugin 'pkcs11' from 'strongroom.crypto.plugin': no such plugin"
    );
}
