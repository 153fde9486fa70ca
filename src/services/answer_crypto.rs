//! AES-256-CBC wrapping of correct-answer strings.
//!
//! Stored form is `hex(iv):hex(ciphertext)` with a fresh 16-byte IV per value
//! and PKCS#7 padding. The key is the SHA-256 digest of the configured secret.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;
const DELIMITER: char = ':';

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum CryptoError {
    #[error("encrypted answer is not in iv:ciphertext form")]
    MalformedPayload,
    #[error("encrypted answer contains invalid hex")]
    InvalidHex,
    #[error("initialisation vector must be {IV_LEN} bytes")]
    InvalidIv,
    #[error("ciphertext length is not a positive multiple of the block size")]
    InvalidCiphertext,
    #[error("decryption failed")]
    Decryption,
    #[error("decrypted answer is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Clone)]
pub(crate) struct AnswerCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for AnswerCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerCipher").field("key", &"<redacted>").finish()
    }
}

impl AnswerCipher {
    pub(crate) fn from_secret(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    pub(crate) fn encrypt(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        format!("{}{DELIMITER}{}", hex::encode(iv), hex::encode(ciphertext))
    }

    pub(crate) fn decrypt(&self, stored: &str) -> Result<String, CryptoError> {
        let (iv_hex, ciphertext_hex) =
            stored.split_once(DELIMITER).ok_or(CryptoError::MalformedPayload)?;

        let iv: [u8; IV_LEN] = hex::decode(iv_hex)
            .map_err(|_| CryptoError::InvalidHex)?
            .try_into()
            .map_err(|_| CryptoError::InvalidIv)?;
        let ciphertext = hex::decode(ciphertext_hex).map_err(|_| CryptoError::InvalidHex)?;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CryptoError::InvalidCiphertext);
        }

        let plaintext = Aes256CbcDec::new(&self.key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CryptoError::Decryption)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }

    pub(crate) fn encrypt_all(&self, plaintexts: &[String]) -> Vec<String> {
        plaintexts.iter().map(|value| self.encrypt(value)).collect()
    }

    pub(crate) fn decrypt_all(&self, stored: &[String]) -> Result<Vec<String>, CryptoError> {
        stored.iter().map(|value| self.decrypt(value)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> AnswerCipher {
        AnswerCipher::from_secret("unit-test-answer-secret")
    }

    #[test]
    fn round_trips_plaintext() {
        let cipher = cipher();
        for answer in ["9.81", "", "F = m·a", "  42 N  ", "λ = 500 нм"] {
            let stored = cipher.encrypt(answer);
            assert_eq!(cipher.decrypt(&stored).unwrap(), answer);
        }
    }

    #[test]
    fn stored_form_is_hex_iv_and_block_aligned_ciphertext() {
        let stored = cipher().encrypt("3.0e8");
        let (iv, ciphertext) = stored.split_once(':').expect("delimiter");

        assert_eq!(iv.len(), IV_LEN * 2);
        assert!(iv.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(ciphertext.len(), BLOCK_LEN * 2);
        assert!(!stored.contains("3.0e8"));
    }

    #[test]
    fn each_encryption_uses_a_fresh_iv() {
        let cipher = cipher();
        assert_ne!(cipher.encrypt("same"), cipher.encrypt("same"));
    }

    #[test]
    fn wrong_key_does_not_recover_plaintext() {
        let stored = cipher().encrypt("1.5 m/s");
        let other = AnswerCipher::from_secret("another-secret");
        assert_ne!(other.decrypt(&stored), Ok("1.5 m/s".to_string()));
    }

    #[test]
    fn rejects_malformed_payloads() {
        let cipher = cipher();
        assert_eq!(cipher.decrypt("no-delimiter"), Err(CryptoError::MalformedPayload));
        assert_eq!(cipher.decrypt("zz:00"), Err(CryptoError::InvalidHex));
        assert_eq!(cipher.decrypt("0011:00112233445566778899aabbccddeeff"), Err(CryptoError::InvalidIv));

        let stored = cipher.encrypt("x");
        let (iv, _) = stored.split_once(':').unwrap();
        assert_eq!(cipher.decrypt(&format!("{iv}:")), Err(CryptoError::InvalidCiphertext));
        assert_eq!(cipher.decrypt(&format!("{iv}:0011")), Err(CryptoError::InvalidCiphertext));
    }

    #[test]
    fn batch_helpers_preserve_order() {
        let cipher = cipher();
        let answers = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let stored = cipher.encrypt_all(&answers);
        assert_eq!(cipher.decrypt_all(&stored).unwrap(), answers);
    }

    #[test]
    fn debug_output_hides_key() {
        assert_eq!(format!("{:?}", cipher()), "AnswerCipher { key: \"<redacted>\" }");
    }
}
