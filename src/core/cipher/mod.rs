//! Secret cipher.
//!
//! Seals arbitrary payloads under the single process key. The key is an age
//! X25519 identity; tokens are binary age files (header MAC, ephemeral share,
//! per-file nonce, ChaCha20-Poly1305 chunks) in strict standard base64, so a
//! token carries everything needed to open it except the key itself.
//!
//! The key is injected at startup. Nothing in this module reads it from
//! application data.

use std::io::{Read, Write};

use ::age::secrecy::ExposeSecret;
use ::age::x25519;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::trace;
use zeroize::Zeroizing;

use crate::core::domain::SecretBlob;
use crate::error::{CipherError, Result};

/// Authenticated encryption under the process key.
pub struct SecretCipher {
    identity: x25519::Identity,
    recipient: x25519::Recipient,
}

impl SecretCipher {
    /// Build a cipher from an `AGE-SECRET-KEY-1...` string.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::InvalidKey` if the key does not parse.
    pub fn from_key(key: &str) -> Result<Self> {
        let identity: x25519::Identity = key
            .trim()
            .parse()
            .map_err(|e: &str| CipherError::InvalidKey(e.to_string()))?;
        let recipient = identity.to_public();
        Ok(Self {
            identity,
            recipient,
        })
    }

    /// Generate a fresh process key.
    pub fn generate_key() -> Zeroizing<String> {
        let identity = x25519::Identity::generate();
        Zeroizing::new(identity.to_string().expose_secret().to_string())
    }

    /// Short fingerprint of the public half, safe to print.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.recipient.to_string().as_bytes());
        let hex: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
        format!("sha256:{}", hex)
    }

    /// Seal `plaintext` into a self-describing token.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<SecretBlob> {
        trace!(plaintext_len = plaintext.len(), "sealing");

        let encryptor = ::age::Encryptor::with_recipients(std::iter::once(
            &self.recipient as &dyn ::age::Recipient,
        ))
        .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;

        let mut sealed = Vec::with_capacity(plaintext.len() + 200);
        let mut writer = encryptor
            .wrap_output(&mut sealed)
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;
        writer
            .write_all(plaintext)
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;

        let token = STANDARD.encode(&sealed);
        trace!(token_len = token.len(), "sealed");
        Ok(SecretBlob::new(token))
    }

    /// Open a token sealed by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns `CipherError::InvalidToken` if the token is malformed, was
    /// modified, or was sealed under a different key.
    pub fn decrypt(&self, token: &SecretBlob) -> Result<Zeroizing<Vec<u8>>> {
        trace!(token_len = token.len(), "opening");

        let sealed = STANDARD
            .decode(token.as_str())
            .map_err(|_| CipherError::InvalidToken)?;
        let decryptor = ::age::Decryptor::new(&sealed[..]).map_err(|_| CipherError::InvalidToken)?;
        let mut reader = decryptor
            .decrypt(std::iter::once(&self.identity as &dyn ::age::Identity))
            .map_err(|_| CipherError::InvalidToken)?;

        let mut plaintext = Zeroizing::new(Vec::new());
        reader
            .read_to_end(&mut plaintext)
            .map_err(|_| CipherError::InvalidToken)?;

        trace!(plaintext_len = plaintext.len(), "opened");
        Ok(plaintext)
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCipher")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
