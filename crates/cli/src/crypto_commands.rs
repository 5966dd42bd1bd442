//! `encrypt` and `decrypt` commands.

use std::path::PathBuf;

use {
    anyhow::Context,
    clap::Args,
    strongroom_crypto::{CryptoRouter, Secret, Tenant},
    tokio::io::{AsyncReadExt, AsyncWriteExt},
    tracing::info,
    zeroize::Zeroizing,
};

#[derive(Args)]
pub struct EncryptArgs {
    /// Format of the input, used to pick the plugin.
    #[arg(long, default_value = "text/plain")]
    pub mime_type: String,
    /// Tenant the secret belongs to.
    #[arg(long, env = "STRONGROOM_TENANT")]
    pub tenant: String,
    /// Optional secret name recorded in the output.
    #[arg(long)]
    pub name: Option<String>,
    /// Read plaintext from this file instead of stdin.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Args)]
pub struct DecryptArgs {
    /// Format the plaintext is wanted in, used to pick the plugin.
    #[arg(long, default_value = "text/plain")]
    pub accept: String,
    /// Tenant the secret belongs to.
    #[arg(long, env = "STRONGROOM_TENANT")]
    pub tenant: String,
    /// Read the secret JSON from this file instead of stdin.
    #[arg(long)]
    pub input: Option<PathBuf>,
}

pub async fn handle_encrypt(args: EncryptArgs, router: &CryptoRouter) -> anyhow::Result<()> {
    let plaintext = read_input(args.input.as_ref()).await?;
    let mut secret = Secret::new(args.mime_type);
    if let Some(name) = args.name {
        secret = secret.with_name(name);
    }

    let secret = encrypt_secret(router, secret, &Tenant::new(args.tenant), &plaintext).await?;

    let mut json = serde_json::to_vec_pretty(&secret)?;
    json.push(b'\n');
    tokio::io::stdout().write_all(&json).await?;
    Ok(())
}

pub async fn handle_decrypt(args: DecryptArgs, router: &CryptoRouter) -> anyhow::Result<()> {
    let raw = read_input(args.input.as_ref()).await?;
    let secret: Secret = serde_json::from_slice(&raw).context("input is not a secret document")?;

    let plaintext = router
        .decrypt(&args.accept, Some(&secret), &Tenant::new(args.tenant))
        .await?;

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&plaintext).await?;
    stdout.flush().await?;
    Ok(())
}

/// Encrypt `plaintext` and attach the resulting datum to `secret`.
async fn encrypt_secret(
    router: &CryptoRouter,
    secret: Secret,
    tenant: &Tenant,
    plaintext: &[u8],
) -> anyhow::Result<Secret> {
    let datum = router.encrypt(plaintext, &secret, tenant).await?;
    info!(
        plugin = %datum.plugin,
        mime_type = %secret.mime_type,
        tenant = %tenant.id,
        "secret encrypted"
    );
    Ok(secret.with_encrypted_data(datum))
}

async fn read_input(path: Option<&PathBuf>) -> anyhow::Result<Zeroizing<Vec<u8>>> {
    let mut buf = Zeroizing::new(Vec::new());
    match path {
        Some(path) => {
            let mut file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open {}", path.display()))?;
            file.read_to_end(&mut buf).await?;
        },
        None => {
            tokio::io::stdin().read_to_end(&mut buf).await?;
        },
    }
    Ok(buf)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use {
        base64::Engine,
        strongroom_crypto::{DEFAULT_NAMESPACE, PluginCatalog, PluginSettings},
    };

    use super::*;

    fn router() -> CryptoRouter {
        let kek = base64::engine::general_purpose::STANDARD.encode([3u8; 32]);
        let settings = BTreeMap::from([(
            "software".to_string(),
            PluginSettings::new(serde_json::json!({ "kek": kek })),
        )]);
        CryptoRouter::from_catalog(
            &PluginCatalog::with_builtin(),
            DEFAULT_NAMESPACE,
            &["software"],
            &settings,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn encrypted_document_decrypts_after_reparsing() {
        let router = router();
        let tenant = Tenant::new("acme");

        let secret = encrypt_secret(
            &router,
            Secret::new("text/plain").with_name("api-token"),
            &tenant,
            b"tok_123",
        )
        .await
        .unwrap();
        let document = serde_json::to_vec_pretty(&secret).unwrap();

        let parsed: Secret = serde_json::from_slice(&document).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("api-token"));
        let plaintext = router
            .decrypt("text/plain", Some(&parsed), &tenant)
            .await
            .unwrap();
        assert_eq!(plaintext.as_slice(), b"tok_123");
    }

    #[tokio::test]
    async fn unsupported_format_is_an_error() {
        let err = encrypt_secret(
            &router(),
            Secret::new("image/png"),
            &Tenant::new("acme"),
            b"png",
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "crypto mime type of 'image/png' not supported");
    }

    #[tokio::test]
    async fn read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        std::fs::write(&path, b"hello").unwrap();
        assert_eq!(read_input(Some(&path)).await.unwrap().as_slice(), b"hello");
    }

    #[tokio::test]
    async fn read_input_missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let err = read_input(Some(&path)).await.unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
    }
}
