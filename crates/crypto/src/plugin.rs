//! The capability trait every crypto backend implements.

use {async_trait::async_trait, zeroize::Zeroizing};

use crate::{
    error::Result,
    secret::{EncryptedDatum, Secret, Tenant},
};

/// A crypto backend: software, HSM, external KMS...
///
/// The router calls [`supports`](Self::supports) to pick a plugin and then
/// trusts the answer: once a plugin says yes, its `encrypt`/`decrypt` is
/// invoked without any further check. Implementations are shared across
/// concurrent callers and must be safe for that.
#[async_trait]
pub trait CryptoPlugin: Send + Sync {
    /// Registration name, recorded in every [`EncryptedDatum`] this plugin emits.
    fn name(&self) -> &str;

    /// Whether this plugin handles the given format identifier.
    ///
    /// Must be free of side effects; the router may call it any number of
    /// times, in any order.
    fn supports(&self, mime_type: &str) -> bool;

    /// Encrypt `unencrypted` for `tenant`.
    async fn encrypt(
        &self,
        unencrypted: &[u8],
        secret: &Secret,
        tenant: &Tenant,
    ) -> Result<EncryptedDatum>;

    /// Decrypt `secret` into the `accept` representation.
    async fn decrypt(
        &self,
        accept: &str,
        secret: &Secret,
        tenant: &Tenant,
    ) -> Result<Zeroizing<Vec<u8>>>;
}
