//! Symmetric encryption used for index tokens and document payloads.
//!
//! AES-256-GCM with a random 96-bit nonce prepended to the ciphertext.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use ark_std::rand::RngCore;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;

#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Encrypts `plaintext` under a fresh nonce drawn from `rng`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ark_std::test_rng;
    /// use searchable_vault::cipher::SymmetricKey;
    ///
    /// let rng = &mut test_rng();
    /// let key = SymmetricKey::from_bytes([7u8; 32]);
    /// let ct = key.encrypt(rng, b"HELLO").unwrap();
    /// assert_eq!(key.decrypt(&ct).unwrap(), b"HELLO");
    /// assert!(SymmetricKey::from_bytes([8u8; 32]).decrypt(&ct).is_err());
    /// ```
    pub fn encrypt<R: RngCore>(&self, rng: &mut R, plaintext: &[u8]) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(&self.0).map_err(|_| Error::Cipher("invalid key"))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| Error::Cipher("encryption failed"))?;

        let mut out = nonce_bytes.to_vec();
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypts a nonce-prefixed ciphertext. Fails if the key is wrong or the
    /// ciphertext was tampered with.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN {
            return Err(Error::Cipher("ciphertext too short"));
        }
        let cipher = Aes256Gcm::new_from_slice(&self.0).map_err(|_| Error::Cipher("invalid key"))?;
        let (nonce, body) = ciphertext.split_at(NONCE_LEN);
        cipher
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|_| Error::Cipher("decryption failed"))
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use ark_std::test_rng;

    use super::*;

    #[test]
    fn test_fresh_nonce_per_encryption() {
        let rng = &mut test_rng();
        let key = SymmetricKey::from_bytes([1u8; KEY_LEN]);
        let c1 = key.encrypt(rng, b"same").unwrap();
        let c2 = key.encrypt(rng, b"same").unwrap();
        assert_ne!(c1, c2);
        assert_eq!(key.decrypt(&c1).unwrap(), key.decrypt(&c2).unwrap());
    }

    #[test]
    fn test_tampered_or_short_ciphertext() {
        let rng = &mut test_rng();
        let key = SymmetricKey::from_bytes([1u8; KEY_LEN]);
        let mut ct = key.encrypt(rng, b"payload").unwrap();
        let last = ct.len() - 1;
        ct[last] ^= 1;
        assert!(key.decrypt(&ct).is_err());
        assert!(key.decrypt(&[0u8; 4]).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let key = SymmetricKey::from_bytes([0xAB; KEY_LEN]);
        assert_eq!(format!("{:?}", key), "SymmetricKey(..)");
    }
}
