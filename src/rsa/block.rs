//! Single-block textbook RSA.
//!
//! A block is read as a big-endian unsigned integer and raised to the key's
//! exponent modulo the key's modulus. There is no semantic padding and no
//! integrity protection: equal plaintext blocks give equal cipher blocks, and
//! a full-width input whose value is not below the modulus is accepted and
//! silently reduced.

use num_bigint::BigUint;
use num_traits::Zero;
use crate::rsa::error::{Result, RsaError};
use crate::rsa::keys::{PrivateKey, PublicKey, RsaKey};

/// Raises `data` to the key exponent and left pads the big-endian result
/// with zeros to `width` bytes. Wider results are returned as they are.
pub fn transform<K: RsaKey>(key: &K, data: &[u8], width: usize) -> Result<Vec<u8>> {
    let max = key.key_bytes();
    if key.modulus().is_zero() {
        return Err(RsaError::KeyTooSmall { bytes: 0, min: 1 });
    }
    if data.len() > max {
        return Err(RsaError::BlockTooLarge { len: data.len(), max });
    }
    let m = BigUint::from_bytes_be(data);
    let c = m.modpow(key.exponent(), key.modulus());
    Ok(pad_left(c.to_bytes_be(), width))
}

fn pad_left(mut res: Vec<u8>, width: usize) -> Vec<u8> {
    if res.len() < width {
        let fill = width - res.len();
        res.splice(0..0, std::iter::repeat(0u8).take(fill));
    }
    res
}

/// Cipher block of `key_bytes` bytes.
pub fn encrypt_block(key: &PublicKey, data: &[u8]) -> Result<Vec<u8>> {
    transform(key, data, key.key_bytes())
}

/// Plain block of `key_bytes - 1` bytes, zero padded on the left.
pub fn decrypt_block(key: &PrivateKey, data: &[u8]) -> Result<Vec<u8>> {
    transform(key, data, key.key_bytes().saturating_sub(1))
}

impl PublicKey {
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> { encrypt_block(self, data) }
}

impl PrivateKey {
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> { decrypt_block(self, data) }
}
