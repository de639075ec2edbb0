//! Key derivation and the cipher used to protect stored third-party access tokens.
//!
//! The master secret and salt are stretched with PBKDF2-HMAC-SHA256 into a
//! 32-byte key, which is then used as a Fernet key. Fernet tokens are
//! authenticated, versioned and time-stamped, so a token encrypted under one
//! key will fail to decrypt under any other.

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE};
use fernet::Fernet;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::{Error, config::Config};

/// The number of PBKDF2 rounds used to derive the token key.
pub const KDF_ITERATIONS: u32 = 100_000;

/// The length of the derived key in bytes.
pub const DERIVED_KEY_LENGTH: usize = 32;

/// The value that the application secret is set to in example configuration.
///
/// A key derived from this value is effectively public, so it is always rejected.
pub const PLACEHOLDER_SECRET: &str = "changeme";

/// A symmetric key derived from the application secret and KDF salt.
///
/// The key bytes are zeroized when the value is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey([u8; DERIVED_KEY_LENGTH]);

impl DerivedKey {
    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_LENGTH] {
        &self.0
    }

    /// The key encoded as URL-safe base64, the form Fernet expects.
    ///
    /// The encoded copy is zeroized when it is dropped as well.
    pub fn to_fernet_key(&self) -> Zeroizing<String> {
        Zeroizing::new(URL_SAFE.encode(self.0))
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(********)")
    }
}

/// Derive a token key from `secret` and `salt` with PBKDF2-HMAC-SHA256.
///
/// The derivation is deterministic: the same secret and salt always produce
/// the same key.
///
/// # Errors
/// Returns [Error::PlaceholderSecret] if `secret` is empty or equal to
/// [PLACEHOLDER_SECRET].
pub fn derive_key(secret: &str, salt: &[u8]) -> Result<DerivedKey, Error> {
    if secret.is_empty() || secret == PLACEHOLDER_SECRET {
        return Err(Error::PlaceholderSecret);
    }

    let mut key = [0u8; DERIVED_KEY_LENGTH];
    pbkdf2::pbkdf2_hmac::<Sha256>(secret.as_bytes(), salt, KDF_ITERATIONS, &mut key);

    Ok(DerivedKey(key))
}

/// Encrypts and decrypts access tokens for storage.
///
/// Built once at startup and shared read-only for the life of the process.
#[derive(Clone)]
pub struct TokenCipher {
    fernet: Fernet,
}

impl TokenCipher {
    /// Create a cipher from a derived key.
    ///
    /// # Errors
    /// Returns [Error::InvalidCipherKey] if the key is rejected by Fernet.
    pub fn new(key: &DerivedKey) -> Result<Self, Error> {
        let fernet = Fernet::new(&key.to_fernet_key()).ok_or(Error::InvalidCipherKey)?;

        Ok(Self { fernet })
    }

    /// Derive the token key from the application configuration and create
    /// the cipher.
    ///
    /// This must run before the server accepts any request so that bad
    /// secrets stop the process instead of failing individual requests.
    ///
    /// # Errors
    /// Returns an error if the secret is a placeholder, if the KDF salt is
    /// missing or not allowed for the configured environment, or if the
    /// derived key is rejected.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let salt = config.kdf_salt()?;
        let key = derive_key(config.app_secret_key.as_deref().unwrap_or_default(), &salt)?;

        Self::new(&key)
    }

    /// Encrypt `plaintext` into a Fernet token.
    pub fn encrypt(&self, plaintext: &[u8]) -> String {
        self.fernet.encrypt(plaintext)
    }

    /// Decrypt a Fernet token produced by [TokenCipher::encrypt].
    ///
    /// # Errors
    /// Returns [Error::TokenDecryption] if the token is malformed, has been
    /// tampered with, or was encrypted with a different key.
    pub fn decrypt(&self, token: &str) -> Result<Vec<u8>, Error> {
        self.fernet
            .decrypt(token)
            .map_err(|_| Error::TokenDecryption)
    }
}

impl fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCipher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use zeroize::Zeroize;

    use crate::Error;

    use super::{DERIVED_KEY_LENGTH, TokenCipher, derive_key};

    const TEST_SALT: &[u8] = b"test-salt-please-ignore";

    fn get_test_cipher() -> TokenCipher {
        let key = derive_key("correct horse battery staple", TEST_SALT).unwrap();
        TokenCipher::new(&key).unwrap()
    }

    #[test]
    fn derive_key_is_deterministic() {
        let first = derive_key("correct horse battery staple", TEST_SALT).unwrap();
        let second = derive_key("correct horse battery staple", TEST_SALT).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.as_bytes().len(), DERIVED_KEY_LENGTH);
    }

    #[test]
    fn derive_key_uses_pbkdf2_sha256_with_100k_rounds() {
        let mut want = [0u8; DERIVED_KEY_LENGTH];
        pbkdf2::pbkdf2_hmac::<sha2::Sha256>(b"hunter2", b"pepper", 100_000, &mut want);

        let got = derive_key("hunter2", b"pepper").unwrap();

        assert_eq!(got.as_bytes(), &want);
    }

    #[test]
    fn different_salts_give_different_keys() {
        let first = derive_key("correct horse battery staple", b"deployment-a").unwrap();
        let second = derive_key("correct horse battery staple", b"deployment-b").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn derive_key_rejects_placeholder_secret() {
        assert_eq!(derive_key("changeme", TEST_SALT), Err(Error::PlaceholderSecret));
    }

    #[test]
    fn derive_key_rejects_empty_secret() {
        assert_eq!(derive_key("", TEST_SALT), Err(Error::PlaceholderSecret));
    }

    #[test]
    fn fernet_key_is_url_safe_base64() {
        let key = derive_key("correct horse battery staple", TEST_SALT).unwrap();

        let fernet_key = key.to_fernet_key();

        assert_eq!(fernet_key.len(), 44);
        assert!(
            fernet_key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '='),
            "got non URL-safe character in {}",
            fernet_key.as_str()
        );
    }

    #[test]
    fn decrypt_reverses_encrypt() {
        let cipher = get_test_cipher();

        for plaintext in [
            b"access-sandbox-1234".as_slice(),
            b"".as_slice(),
            &[0u8, 159, 146, 150, 255],
        ] {
            let token = cipher.encrypt(plaintext);

            assert_eq!(cipher.decrypt(&token), Ok(plaintext.to_vec()));
        }
    }

    #[test]
    fn encrypt_does_not_leak_plaintext() {
        let cipher = get_test_cipher();

        let token = cipher.encrypt(b"access-sandbox-1234");

        assert!(!token.contains("access-sandbox-1234"));
    }

    #[test]
    fn decrypt_fails_with_different_key() {
        let cipher = get_test_cipher();
        let other_key = derive_key("a different secret", TEST_SALT).unwrap();
        let other_cipher = TokenCipher::new(&other_key).unwrap();

        let token = cipher.encrypt(b"access-sandbox-1234");

        assert_eq!(other_cipher.decrypt(&token), Err(Error::TokenDecryption));
    }

    #[test]
    fn decrypt_fails_on_garbage() {
        let cipher = get_test_cipher();

        assert_eq!(cipher.decrypt("not a token"), Err(Error::TokenDecryption));
    }

    #[test]
    fn fernet_key_copy_can_be_wiped() {
        let key = derive_key("correct horse battery staple", TEST_SALT).unwrap();
        let mut fernet_key = key.to_fernet_key();

        fernet_key.zeroize();

        assert!(fernet_key.is_empty());
    }

    #[test]
    fn debug_output_hides_key() {
        let key = derive_key("correct horse battery staple", TEST_SALT).unwrap();

        assert_eq!(format!("{key:?}"), "DerivedKey(********)");
    }
}
