use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use log::debug;
use crate::rsa::error::Result;
use crate::rsa::keys::{KEY_SEPARATOR, RsaKey};

/// `<modulus-hex>-<exponent-hex>`, lowercase without prefix.
pub fn serialize<K: RsaKey>(key: &K) -> String {
    format!("{}{}{}", key.modulus().to_str_radix(16), KEY_SEPARATOR, key.exponent().to_str_radix(16))
}

pub fn write_key<K: RsaKey>(writer: &mut dyn Write, key: &K) -> Result<()> {
    writer.write_all(serialize(key).as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn save_key<K: RsaKey, P: AsRef<Path>>(path: P, key: &K) -> Result<()> {
    let path = path.as_ref();
    let mut f = BufWriter::new(File::create(path)?);
    write_key(&mut f, key)?;
    debug!("saved {}-bit key to {}", key.bits(), path.display());
    Ok(())
}
