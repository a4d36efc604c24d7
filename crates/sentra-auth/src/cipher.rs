//! Encryption of stored MFA seeds.
//!
//! A PBKDF2-SHA512-stretched passphrase and a fixed per-deployment IV drive
//! AES-CBC over each seed; ciphertexts are hex strings. The IV hex string
//! doubles as the KDF salt, so key, IV, and ciphertext format all pin to the
//! same deployment configuration.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;

use crate::config::{CipherAlgo, MfaCipherConfig};
use crate::error::AuthError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes192CbcEnc = cbc::Encryptor<aes::Aes192>;
type Aes192CbcDec = cbc::Decryptor<aes::Aes192>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Symmetric cipher for MFA seeds. The key is derived once at construction;
/// the IV stays fixed so ciphertexts persisted under earlier runs remain
/// decryptable.
#[derive(Clone)]
pub struct SecretCipher {
    algo: CipherAlgo,
    key: Vec<u8>,
    iv: [u8; 16],
}

impl SecretCipher {
    /// Derive the symmetric key from the configured passphrase.
    ///
    /// Fails if the IV does not decode to 16 bytes or the configured key
    /// length does not match the algorithm's key size.
    pub fn new(config: &MfaCipherConfig) -> Result<Self, AuthError> {
        if config.key_length != config.algo.key_len() {
            return Err(AuthError::Crypto(format!(
                "key length {} does not match {:?} ({} bytes)",
                config.key_length,
                config.algo,
                config.algo.key_len()
            )));
        }

        let iv_bytes = hex::decode(&config.iv_hex)
            .map_err(|e| AuthError::Crypto(format!("bad IV hex: {e}")))?;
        let iv: [u8; 16] = iv_bytes.as_slice().try_into().map_err(|_| {
            AuthError::Crypto(format!("IV must be 16 bytes, got {}", iv_bytes.len()))
        })?;

        let mut key = vec![0u8; config.key_length];
        pbkdf2_hmac::<Sha512>(
            config.passphrase.as_bytes(),
            config.iv_hex.as_bytes(),
            config.key_iterations,
            &mut key,
        );

        Ok(Self {
            algo: config.algo,
            key,
            iv,
        })
    }

    /// Encrypt a seed; returns hex ciphertext.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, AuthError> {
        let init = |e: aes::cipher::InvalidLength| AuthError::Crypto(format!("cipher init: {e}"));
        let ciphertext = match self.algo {
            CipherAlgo::Aes128Cbc => Aes128CbcEnc::new_from_slices(&self.key, &self.iv)
                .map_err(init)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes()),
            CipherAlgo::Aes192Cbc => Aes192CbcEnc::new_from_slices(&self.key, &self.iv)
                .map_err(init)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes()),
            CipherAlgo::Aes256Cbc => Aes256CbcEnc::new_from_slices(&self.key, &self.iv)
                .map_err(init)?
                .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes()),
        };
        Ok(hex::encode(ciphertext))
    }

    /// Decrypt hex ciphertext back to the seed.
    ///
    /// Malformed hex, bad padding, or non-UTF-8 plaintext propagates as an
    /// error, never a silent default.
    pub fn decrypt(&self, ciphertext_hex: &str) -> Result<String, AuthError> {
        let ciphertext = hex::decode(ciphertext_hex)
            .map_err(|e| AuthError::Crypto(format!("bad ciphertext hex: {e}")))?;

        let init = |e: aes::cipher::InvalidLength| AuthError::Crypto(format!("cipher init: {e}"));
        let unpad = |_| AuthError::Crypto("decryption failed".into());
        let plaintext = match self.algo {
            CipherAlgo::Aes128Cbc => Aes128CbcDec::new_from_slices(&self.key, &self.iv)
                .map_err(init)?
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
                .map_err(unpad)?,
            CipherAlgo::Aes192Cbc => Aes192CbcDec::new_from_slices(&self.key, &self.iv)
                .map_err(init)?
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
                .map_err(unpad)?,
            CipherAlgo::Aes256Cbc => Aes256CbcDec::new_from_slices(&self.key, &self.iv)
                .map_err(init)?
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
                .map_err(unpad)?,
        };

        String::from_utf8(plaintext)
            .map_err(|e| AuthError::Crypto(format!("plaintext not UTF-8: {e}")))
    }
}
