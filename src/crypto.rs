//! Password-at-rest encryption for external account credentials.
//!
//! A 256-bit key is derived from the service's `ENCRYPTION_PASSWORD` and a random
//! per-account salt with Argon2id, then used with AES-256-GCM. The stored ciphertext
//! is `base64(nonce || ciphertext)`, the salt is stored base64 next to it.

use crate::errors::{Error, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use rand::RngCore;
use rand::rngs::OsRng;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Encrypted password and the salt its key was derived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSecret {
    /// `base64(nonce || ciphertext)`
    pub ciphertext: String,
    /// `base64(salt)`
    pub salt: String,
}

/// Encrypts and decrypts stored passwords with a service-wide key password.
#[derive(Clone)]
pub struct PasswordCipher {
    key_password: String,
}

impl std::fmt::Debug for PasswordCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCipher").finish_non_exhaustive()
    }
}

fn crypto_error(message: impl Into<String>) -> Error {
    Error::Crypto {
        message: message.into(),
    }
}

impl PasswordCipher {
    /// Creates a cipher using `key_password` as key material.
    pub fn new(key_password: impl Into<String>) -> Self {
        Self {
            key_password: key_password.into(),
        }
    }

    fn derive_key(&self, salt: &[u8]) -> Result<[u8; KEY_LEN]> {
        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(self.key_password.as_bytes(), salt, &mut key)
            .map_err(|e| crypto_error(format!("Key derivation failed: {e}")))?;
        Ok(key)
    }

    /// Encrypts `plaintext` under a fresh salt and nonce.
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedSecret> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let key = self.derive_key(&salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| crypto_error(format!("Invalid key length: {e}")))?;
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| crypto_error("Encryption failed"))?;

        let mut payload = nonce.to_vec();
        payload.extend_from_slice(&sealed);
        Ok(EncryptedSecret {
            ciphertext: URL_SAFE.encode(payload),
            salt: URL_SAFE.encode(salt),
        })
    }

    /// Decrypts a value produced by [`PasswordCipher::encrypt`].
    ///
    /// # Errors
    /// Returns [`Error::Crypto`] for malformed input, a wrong key password, or tampered data.
    pub fn decrypt(&self, ciphertext: &str, salt: &str) -> Result<String> {
        let salt = URL_SAFE
            .decode(salt)
            .map_err(|e| crypto_error(format!("Malformed salt: {e}")))?;
        let payload = URL_SAFE
            .decode(ciphertext)
            .map_err(|e| crypto_error(format!("Malformed ciphertext: {e}")))?;
        if payload.len() <= NONCE_LEN {
            return Err(crypto_error("Ciphertext too short"));
        }
        let (nonce, sealed) = payload.split_at(NONCE_LEN);

        let key = self.derive_key(&salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| crypto_error(format!("Invalid key length: {e}")))?;
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| crypto_error("Decryption failed"))?;
        String::from_utf8(plain).map_err(|e| crypto_error(format!("Invalid UTF-8: {e}")))
    }
}
