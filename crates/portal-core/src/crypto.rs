//! the authenticated symmetric cipher layered on top of the PAKE session
//! key: HKDF-SHA256 key derivation, XChaCha20Poly1305 AEAD, random nonce
//! prefixed to each ciphertext.

use crate::error::PortalError;
use chacha20poly1305::aead::{Aead, KeyInit, OsRng};
use chacha20poly1305::{AeadCore, XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use sha2::Sha256;

const HKDF_INFO: &[u8] = b"portal";
pub const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 24;

/// holds the derived AEAD key for one transfer session. safe for
/// concurrent use by one encrypting task and one decrypting task, since
/// encryption never mutates shared state beyond drawing a fresh nonce.
pub struct CryptContext {
    cipher: XChaCha20Poly1305,
}

impl CryptContext {
    /// derive the AEAD key from the PAKE session key and the sender-chosen
    /// salt via `HKDF-SHA256(session_key, salt, info="portal")`.
    pub fn new(session_key: &[u8; 32], salt: &[u8; SALT_LEN]) -> Self {
        let hk = Hkdf::<Sha256>::new(Some(salt), session_key);
        let mut okm = [0u8; 32];
        hk.expand(HKDF_INFO, &mut okm)
            .expect("32 is a valid HKDF-SHA256 output length");
        let cipher = XChaCha20Poly1305::new((&okm).into());
        Self { cipher }
    }

    /// generate a fresh random salt for a new session.
    pub fn random_salt() -> [u8; SALT_LEN] {
        let mut salt = [0u8; SALT_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut salt);
        salt
    }

    /// encrypt `plaintext`, returning `nonce || ciphertext || tag`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, PortalError> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| PortalError::CryptoFailure)?;
        let mut out = Vec::with_capacity(nonce.len() + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// decrypt a `nonce || ciphertext || tag` frame produced by [`Self::encrypt`].
    pub fn decrypt(&self, frame: &[u8]) -> Result<Vec<u8>, PortalError> {
        if frame.len() < NONCE_LEN {
            return Err(PortalError::CryptoFailure);
        }
        let (nonce_bytes, ciphertext) = frame.split_at(NONCE_LEN);
        let nonce = XNonce::from_slice(nonce_bytes);
        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| PortalError::CryptoFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrypt_reverses_encrypt() {
        let key = [7u8; 32];
        let salt = CryptContext::random_salt();
        let ctx = CryptContext::new(&key, &salt);

        let message = b"A frog walks into a bank...";
        let frame = ctx.encrypt(message).unwrap();
        let recovered = ctx.decrypt(&frame).unwrap();

        assert_eq!(recovered, message);
    }

    #[test]
    fn nonces_are_fresh_per_message() {
        let key = [7u8; 32];
        let salt = CryptContext::random_salt();
        let ctx = CryptContext::new(&key, &salt);

        let a = ctx.encrypt(b"same plaintext").unwrap();
        let b = ctx.encrypt(b"same plaintext").unwrap();
        assert_ne!(a, b, "identical plaintext must not produce identical frames");
    }

    #[test]
    fn decrypt_rejects_tampered_frames() {
        let key = [7u8; 32];
        let salt = CryptContext::random_salt();
        let ctx = CryptContext::new(&key, &salt);

        let mut frame = ctx.encrypt(b"hello").unwrap();
        let last = frame.len() - 1;
        frame[last] ^= 0xff;

        assert!(ctx.decrypt(&frame).is_err());
    }

    #[test]
    fn mismatched_keys_fail_to_decrypt() {
        let salt = CryptContext::random_salt();
        let sender_ctx = CryptContext::new(&[1u8; 32], &salt);
        let receiver_ctx = CryptContext::new(&[2u8; 32], &salt);

        let frame = sender_ctx.encrypt(b"secret").unwrap();
        assert!(receiver_ctx.decrypt(&frame).is_err());
    }
}
