use std::io;
use thiserror::Error;
use crate::rsa::keys::KeyError;

#[derive(Debug, Error)]
pub enum RsaError {
    #[error("number of bits should be a positive multiple of 64, got {0}")]
    InvalidKeySize(u64),

    #[error("modular inverse of the public exponent does not exist")]
    KeyDerivation,

    #[error("data too large: {len} bytes, cannot exceed {max} bytes")]
    BlockTooLarge { len: usize, max: usize },

    #[error("key too small: {bytes} byte modulus, need at least {min} bytes")]
    KeyTooSmall { bytes: usize, min: usize },

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("cannot seed prime search: {0}")]
    Rng(#[from] rand::Error),

    #[error("key pair self test failed on {0} blocks")]
    SelfTest(usize),
}

pub type Result<T> = std::result::Result<T, RsaError>;
