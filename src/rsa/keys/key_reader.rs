use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use log::debug;
use num_bigint::BigUint;
use num_traits::Zero;
use crate::rsa::error::Result;
use crate::rsa::keys::{KEY_SEPARATOR, KeyError, PrivateKey, PublicKey, RsaKey};

fn parse_hex(field: &str) -> std::result::Result<BigUint, KeyError> {
    if field.is_empty() {
        return Err(KeyError::Format("empty key field".to_string()));
    }
    if !field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(KeyError::Format(format!("`{}' is not hexadecimal", field)));
    }
    BigUint::parse_bytes(field.as_bytes(), 16)
        .ok_or_else(|| KeyError::Format(format!("`{}' is not hexadecimal", field)))
}

/// Parses the first line of `text` as `<modulus-hex>-<exponent-hex>`.
pub fn deserialize<K: RsaKey>(text: &str) -> std::result::Result<K, KeyError> {
    let line = text.lines().next().unwrap_or("").trim();
    let (m, base) = line.split_once(KEY_SEPARATOR)
        .ok_or_else(|| KeyError::Format("missing `-' separator".to_string()))?;
    let (m, base) = (parse_hex(m.trim())?, parse_hex(base.trim())?);
    if m.is_zero() || base.is_zero() {
        return Err(KeyError::ZeroKey);
    }
    Ok(K::from_parts(m, base))
}

pub fn read_key<K: RsaKey>(reader: &mut dyn Read) -> Result<K> {
    let mut line = String::new();
    BufReader::new(reader).read_line(&mut line)?;
    Ok(deserialize(&line)?)
}

pub fn load_key<K: RsaKey, P: AsRef<Path>>(path: P) -> Result<K> {
    let path = path.as_ref();
    let key: K = read_key(&mut File::open(path)?)?;
    debug!("loaded {}-bit key from {}", key.bits(), path.display());
    Ok(key)
}

pub fn load_public_key<P: AsRef<Path>>(path: P) -> Result<PublicKey> { load_key(path) }

pub fn load_private_key<P: AsRef<Path>>(path: P) -> Result<PrivateKey> { load_key(path) }
