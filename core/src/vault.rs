//! At-rest protection for API key secrets.
//!
//! Secrets are sealed with AES-256-GCM. The sealed form is
//! `nonce (12 bytes) || ciphertext || tag`.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use crate::error::{OrchestraError, Result};

const NONCE_SIZE: usize = 12;

pub const VAULT_KEY_LEN: usize = 32;

#[derive(Clone, PartialEq, Eq)]
pub struct SealedSecret(Vec<u8>);

// Never print sealed bytes, not even in debug output.
impl std::fmt::Debug for SealedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SealedSecret({} bytes)", self.0.len())
    }
}

pub struct SecretVault {
    cipher: Aes256Gcm,
    ephemeral: bool,
}

impl SecretVault {
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != VAULT_KEY_LEN {
            return Err(OrchestraError::Vault(format!(
                "vault key must be {} bytes, got {}",
                VAULT_KEY_LEN,
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| OrchestraError::Vault(format!("invalid vault key: {:?}", e)))?;
        Ok(Self { cipher, ephemeral: false })
    }

    pub fn from_base64(encoded: &str) -> Result<Self> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|e| OrchestraError::InvalidConfig(format!("vault_key is not base64: {}", e)))?;
        Self::new(&key)
    }

    /// A vault whose key lives only as long as this value.
    pub fn ephemeral() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        Self {
            cipher: Aes256Gcm::new(&key),
            ephemeral: true,
        }
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }

    pub fn seal(&self, plaintext: &str) -> Result<SealedSecret> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| OrchestraError::Vault(format!("failed to seal secret: {:?}", e)))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(nonce.as_slice());
        sealed.append(&mut ciphertext);
        Ok(SealedSecret(sealed))
    }

    pub fn unseal(&self, sealed: &SealedSecret) -> Result<String> {
        if sealed.0.len() < NONCE_SIZE {
            return Err(OrchestraError::Vault("sealed secret is too short".into()));
        }
        let (nonce_bytes, payload) = sealed.0.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), payload)
            .map_err(|e| OrchestraError::Vault(format!("failed to unseal secret: {:?}", e)))?;
        String::from_utf8(plaintext)
            .map_err(|e| OrchestraError::Vault(format!("sealed secret is not UTF-8: {}", e)))
    }
}

impl std::fmt::Debug for SecretVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretVault")
            .field("ephemeral", &self.ephemeral)
            .finish_non_exhaustive()
    }
}
