//! Chunked stream protocol.
//!
//! Plaintext is cut into `key_bytes - 1` byte chunks, each encrypted to a
//! `key_bytes` cipher block. A 2-byte little-endian trailer holding the length
//! of the final plaintext chunk terminates the stream, so an empty input
//! encrypts to `00 00`. Decryption reads one block ahead: a block is only
//! written once the following chunk is known, and when that chunk is the
//! trailer the leading zero padding is cut from the block.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use log::{debug, warn};
use crate::rsa::block::{decrypt_block, encrypt_block};
use crate::rsa::error::{Result, RsaError};
use crate::rsa::keys::{load_private_key, load_public_key, PrivateKey, PublicKey, RsaKey};

pub const TRAILER_LEN: usize = 2;

/// Cipher blocks must be longer than the trailer to be told apart from it.
pub const MIN_KEY_BYTES: usize = TRAILER_LEN + 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub blocks: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
}

/// Fills `buf` from `reader` until it is full or the input ends.
pub fn read_chunk(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub fn encode_trailer(last_len: usize) -> [u8; TRAILER_LEN] {
    [(last_len % 256) as u8, (last_len / 256) as u8]
}

pub fn decode_trailer(trailer: &[u8]) -> usize {
    trailer[0] as usize + trailer[1] as usize * 256
}

fn stream_key_bytes<K: RsaKey>(key: &K) -> Result<usize> {
    let key_bytes = key.key_bytes();
    if key_bytes < MIN_KEY_BYTES {
        return Err(RsaError::KeyTooSmall { bytes: key_bytes, min: MIN_KEY_BYTES });
    }
    Ok(key_bytes)
}

pub fn encrypt_stream(key: &PublicKey, reader: &mut dyn Read, writer: &mut dyn Write) -> Result<StreamSummary> {
    let key_bytes = stream_key_bytes(key)?;
    let plain_size = key_bytes - 1;
    debug!("block size {}, input => output: {} => {}", key_bytes, plain_size, key_bytes);
    let mut summary = StreamSummary::default();
    let mut source = vec![0u8; plain_size];
    let mut last_len = 0;
    loop {
        let n = read_chunk(reader, &mut source)?;
        if n == 0 { break; }
        let res = encrypt_block(key, &source[..n])?;
        writer.write_all(&res)?;
        last_len = n;
        summary.blocks += 1;
        summary.bytes_read += n as u64;
        summary.bytes_written += res.len() as u64;
    }
    writer.write_all(&encode_trailer(last_len))?;
    writer.flush()?;
    summary.bytes_written += TRAILER_LEN as u64;
    debug!("encrypted {} blocks, last block {} bytes", summary.blocks, last_len);
    Ok(summary)
}

pub fn decrypt_stream(key: &PrivateKey, reader: &mut dyn Read, writer: &mut dyn Write) -> Result<StreamSummary> {
    let key_bytes = stream_key_bytes(key)?;
    let plain_size = key_bytes - 1;
    let mut summary = StreamSummary::default();
    let mut previous = vec![0u8; key_bytes];
    let mut chunk = vec![0u8; key_bytes];
    let mut chunks: u64 = 0;
    let mut last_n = 0;
    loop {
        let n = read_chunk(reader, &mut chunk)?;
        if n == 0 { break; }
        summary.bytes_read += n as u64;
        if chunks > 0 {
            let mut res = decrypt_block(key, &previous)?;
            if n == TRAILER_LEN {
                let last_len = decode_trailer(&chunk);
                if last_len <= plain_size {
                    res.drain(..res.len() - last_len);
                }
            }
            writer.write_all(&res)?;
            summary.blocks += 1;
            summary.bytes_written += res.len() as u64;
        }
        previous[..n].copy_from_slice(&chunk[..n]);
        previous[n..].fill(0);
        chunks += 1;
        last_n = n;
    }
    writer.flush()?;
    if chunks > 0 && last_n != TRAILER_LEN {
        warn!("cipher stream ended with a {} byte chunk instead of the trailer, last block dropped", last_n);
    }
    debug!("decrypted {} blocks", summary.blocks);
    Ok(summary)
}

/// Encrypts `source` into `target` with the public key stored at `key_path`.
pub fn encrypt_file<P: AsRef<Path>, Q: AsRef<Path>, K: AsRef<Path>>(source: P, target: Q, key_path: K) -> Result<StreamSummary> {
    let key = load_public_key(key_path)?;
    let mut reader = BufReader::new(File::open(source)?);
    let mut writer = BufWriter::new(File::create(target)?);
    encrypt_stream(&key, &mut reader, &mut writer)
}

/// Decrypts `source` into `target` with the private key stored at `key_path`.
pub fn decrypt_file<P: AsRef<Path>, Q: AsRef<Path>, K: AsRef<Path>>(source: P, target: Q, key_path: K) -> Result<StreamSummary> {
    let key = load_private_key(key_path)?;
    let mut reader = BufReader::new(File::open(source)?);
    let mut writer = BufWriter::new(File::create(target)?);
    decrypt_stream(&key, &mut reader, &mut writer)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::{self, Cursor, Read};
    use lazy_static::lazy_static;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use crate::rsa::error::RsaError;
    use crate::rsa::key_gen::KeyGenerator;
    use crate::rsa::keys::{private_path, public_path, KeyPair, RsaKey};
    use super::*;

    lazy_static! {
        static ref K128: KeyPair = KeyGenerator::new().generate(128, &mut StdRng::seed_from_u64(128)).unwrap();
        static ref K256: KeyPair = KeyGenerator::new().generate(256, &mut StdRng::seed_from_u64(256)).unwrap();
    }

    fn round_trip(pair: &KeyPair, data: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut cipher = Vec::new();
        encrypt_stream(&pair.public, &mut Cursor::new(data), &mut cipher).unwrap();
        let mut plain = Vec::new();
        decrypt_stream(&pair.private, &mut Cursor::new(&cipher), &mut plain).unwrap();
        (cipher, plain)
    }

    /// Hands out at most 3 bytes per read call.
    struct Trickle<R>(R);

    impl<R: Read> Read for Trickle<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(3);
            self.0.read(&mut buf[..n])
        }
    }

    #[test]
    fn test_empty_input() {
        let (cipher, plain) = round_trip(&K256, &[]);
        assert_eq!(cipher, vec![0, 0]);
        assert!(plain.is_empty());
    }

    #[test]
    fn test_empty_cipher() {
        let mut plain = Vec::new();
        let summary = decrypt_stream(&K256.private, &mut Cursor::new(Vec::<u8>::new()), &mut plain).unwrap();
        assert!(plain.is_empty());
        assert_eq!(summary, StreamSummary::default());
    }

    #[test]
    fn test_sizes() {
        let key_bytes = K256.public.key_bytes();
        let plain_size = key_bytes - 1;
        let mut rng = StdRng::seed_from_u64(9);
        for len in [1, 2, 3, plain_size - 1, plain_size, plain_size + 1, 2 * plain_size, 5 * plain_size + 7, 1000] {
            let data = (0..len).map(|_| rng.gen::<u8>()).collect::<Vec<_>>();
            let (cipher, plain) = round_trip(&K256, &data);
            let blocks = (len + plain_size - 1) / plain_size;
            assert_eq!(cipher.len(), blocks * key_bytes + TRAILER_LEN, "len {}", len);
            let last_len = len - (blocks - 1) * plain_size;
            assert_eq!(&cipher[cipher.len() - 2..], &encode_trailer(last_len));
            assert_eq!(plain, data, "len {}", len);
        }
    }

    #[test]
    fn test_leading_zeros_in_last_block() {
        let data = vec![0u8; 40];
        let (_, plain) = round_trip(&K256, &data);
        assert_eq!(plain, data);
    }

    #[test]
    fn test_short_reads() {
        let data = (0..=255u8).cycle().take(500).collect::<Vec<_>>();
        let mut cipher = Vec::new();
        encrypt_stream(&K256.public, &mut Trickle(Cursor::new(&data)), &mut cipher).unwrap();
        let mut plain = Vec::new();
        decrypt_stream(&K256.private, &mut Trickle(Cursor::new(&cipher)), &mut plain).unwrap();
        assert_eq!(plain, data);
    }

    #[test]
    fn test_summary() {
        let data = vec![7u8; 100];
        let mut cipher = Vec::new();
        let enc = encrypt_stream(&K256.public, &mut Cursor::new(&data), &mut cipher).unwrap();
        assert_eq!(enc.blocks, 4);
        assert_eq!(enc.bytes_read, 100);
        assert_eq!(enc.bytes_written, cipher.len() as u64);
        let mut plain = Vec::new();
        let dec = decrypt_stream(&K256.private, &mut Cursor::new(&cipher), &mut plain).unwrap();
        assert_eq!(dec.blocks, 4);
        assert_eq!(dec.bytes_read, cipher.len() as u64);
        assert_eq!(dec.bytes_written, 100);
    }

    #[test]
    fn test_missing_trailer_drops_last_block() {
        let data = vec![5u8; 62];
        let (cipher, _) = round_trip(&K256, &data);
        let truncated = &cipher[..cipher.len() - TRAILER_LEN];
        let mut plain = Vec::new();
        decrypt_stream(&K256.private, &mut Cursor::new(truncated), &mut plain).unwrap();
        assert_eq!(plain, data[..31].to_vec());
    }

    #[test]
    fn test_tiny_keys_rejected() {
        use num_bigint::BigUint;
        use crate::rsa::keys::{deserialize, PrivateKey, PublicKey};
        for (text, bytes) in [("bb-7", 1usize), ("bbbb-7", 2)] {
            let public: PublicKey = deserialize(text).unwrap();
            let mut cipher = Vec::new();
            let res = encrypt_stream(&public, &mut Cursor::new(b"hello world"), &mut cipher);
            assert!(matches!(res, Err(RsaError::KeyTooSmall { bytes: b, min: MIN_KEY_BYTES }) if b == bytes));
            assert!(cipher.is_empty());

            let private: PrivateKey = deserialize(text).unwrap();
            let mut plain = Vec::new();
            let res = decrypt_stream(&private, &mut Cursor::new(vec![0u8, 0]), &mut plain);
            assert!(matches!(res, Err(RsaError::KeyTooSmall { .. })));
            assert!(plain.is_empty());
        }
        let zero = PublicKey { modulus: BigUint::from(0u32), public_exponent: BigUint::from(7u32) };
        let res = encrypt_stream(&zero, &mut Cursor::new(b"x"), &mut Vec::new());
        assert!(matches!(res, Err(RsaError::KeyTooSmall { bytes: 0, .. })));
        // smallest accepted size still round trips
        let pair = KeyGenerator::new().generate(64, &mut StdRng::seed_from_u64(64)).unwrap();
        let data = b"hello world, in seven byte blocks".to_vec();
        let (_, plain) = round_trip(&pair, &data);
        assert_eq!(plain, data);
    }

    #[test]
    fn test_trailer_codec() {
        assert_eq!(encode_trailer(0), [0, 0]);
        assert_eq!(encode_trailer(255), [255, 0]);
        assert_eq!(encode_trailer(300), [44, 1]);
        assert_eq!(decode_trailer(&[44, 1]), 300);
    }

    #[test]
    fn test_files() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("mykey");
        K256.save(&base).unwrap();
        let source = dir.path().join("plaintext.txt");
        let cipher = dir.path().join("cipher.dat");
        let dest = dir.path().join("plaintext_dec.txt");
        let text = "Textbook RSA over a file, block by block.\n".repeat(20);
        fs::write(&source, &text).unwrap();
        encrypt_file(&source, &cipher, public_path(&base)).unwrap();
        decrypt_file(&cipher, &dest, private_path(&base)).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), text);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_stream_round_trip(data in proptest::collection::vec(any::<u8>(), 0..200)) {
            let (cipher, plain) = round_trip(&K128, &data);
            let key_bytes = K128.public.key_bytes();
            let blocks = (data.len() + key_bytes - 2) / (key_bytes - 1);
            prop_assert_eq!(cipher.len(), blocks * key_bytes + TRAILER_LEN);
            prop_assert_eq!(plain, data);
        }
    }
}
