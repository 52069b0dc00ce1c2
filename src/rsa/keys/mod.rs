pub mod key_writer;
pub mod key_reader;
pub mod key_pair;

pub use key_pair::*;
pub use key_reader::*;
pub use key_writer::*;

use num_bigint::BigUint;
use thiserror::Error;

/// Modulus/exponent view shared by both key halves.
pub trait RsaKey: Sized {
    fn from_parts(modulus: BigUint, exponent: BigUint) -> Self;
    fn modulus(&self) -> &BigUint;
    fn exponent(&self) -> &BigUint;

    fn bits(&self) -> u64 { self.modulus().bits() }

    /// Width of a cipher block; plaintext blocks are one byte shorter.
    fn key_bytes(&self) -> usize { ((self.bits() + 7) / 8) as usize }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    pub modulus: BigUint,
    pub public_exponent: BigUint,
}

impl RsaKey for PublicKey {
    fn from_parts(modulus: BigUint, exponent: BigUint) -> Self {
        Self { modulus, public_exponent: exponent }
    }
    fn modulus(&self) -> &BigUint { &self.modulus }
    fn exponent(&self) -> &BigUint { &self.public_exponent }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateKey {
    pub modulus: BigUint,
    pub private_exponent: BigUint,
}

impl RsaKey for PrivateKey {
    fn from_parts(modulus: BigUint, exponent: BigUint) -> Self {
        Self { modulus, private_exponent: exponent }
    }
    fn modulus(&self) -> &BigUint { &self.modulus }
    fn exponent(&self) -> &BigUint { &self.private_exponent }
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid key format: {0}")]
    Format(String),
    #[error("key field is zero")]
    ZeroKey,
    #[error("public and private keys do not share a modulus")]
    Mismatch,
}

pub const KEY_SEPARATOR: char = '-';
pub const PUBLIC_EXT: &str = "pub";
pub const PRIVATE_EXT: &str = "key";
