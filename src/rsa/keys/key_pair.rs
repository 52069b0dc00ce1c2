use std::path::{Path, PathBuf};
use log::info;
use crate::rsa::error::Result;
use crate::rsa::keys::{PRIVATE_EXT, PUBLIC_EXT, PrivateKey, PublicKey, RsaKey, load_key, save_key};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

fn with_ext(base: &Path, ext: &str) -> PathBuf {
    let mut path = base.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}

/// `<base>.pub`
pub fn public_path<P: AsRef<Path>>(base: P) -> PathBuf { with_ext(base.as_ref(), PUBLIC_EXT) }

/// `<base>.key`
pub fn private_path<P: AsRef<Path>>(base: P) -> PathBuf { with_ext(base.as_ref(), PRIVATE_EXT) }

impl KeyPair {
    pub fn bits(&self) -> u64 { self.public.bits() }

    pub fn save<P: AsRef<Path>>(&self, base: P) -> Result<()> {
        let (path_public, path_private) = (public_path(&base), private_path(&base));
        save_key(&path_public, &self.public)?;
        save_key(&path_private, &self.private)?;
        info!("Generated key files: {}, {}", path_public.display(), path_private.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(base: P) -> Result<Self> {
        Ok(Self { public: load_key(public_path(&base))?, private: load_key(private_path(&base))? })
    }
}
