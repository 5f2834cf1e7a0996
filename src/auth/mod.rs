pub mod key_store;

pub use key_store::{KeyStore, KeyStoreError};

use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Random bytes behind each issued tenant key (256 bits).
pub const API_KEY_BYTES: usize = 32;

/// Generate a URL-safe random API key.
pub fn generate_api_key() -> String {
    let mut token = [0u8; API_KEY_BYTES];
    OsRng.fill_bytes(&mut token);
    general_purpose::URL_SAFE_NO_PAD.encode(token)
}

/// Mint a fresh key for `tenant` and commit it through the key store,
/// replacing any previous key.
pub async fn issue_tenant_key(keys: &KeyStore, tenant: &str) -> Result<String, KeyStoreError> {
    let api_key = generate_api_key();
    keys.persist(tenant, &api_key).await?;
    tracing::info!(tenant = %tenant, persisted = keys.persists_to_disk(), "issued tenant API key");
    Ok(api_key)
}

/// Constant-time comparison of a presented secret against the expected one.
///
/// Both sides are hashed to fixed-length digests first, so the comparison
/// time does not depend on either length.
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided.as_slice().ct_eq(expected.as_slice()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_url_safe_and_unique() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert_ne!(a, b);
        // 32 bytes -> 43 base64 chars without padding
        assert_eq!(a.len(), 43);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[tokio::test]
    async fn reissue_replaces_previous_key() {
        let keys = KeyStore::new(None, None, None);
        let first = issue_tenant_key(&keys, "acme").await.unwrap();
        let second = issue_tenant_key(&keys, "acme").await.unwrap();
        assert_ne!(first, second);
        assert_eq!(keys.resolve_required_key("acme").await, Some(second));
    }

    #[test]
    fn secrets_match_exact_only() {
        assert!(secrets_match("k1", "k1"));
        assert!(!secrets_match("k2", "k1"));
        assert!(!secrets_match("k", "k1"));
        assert!(!secrets_match("", "k1"));
        assert!(!secrets_match("K1", "k1"));
        assert!(!secrets_match("k1-and-then-some", "k1"));
        assert!(secrets_match("", ""));
    }
}
