use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::thread;
use std::time::Duration;
use chrono::Local;
use crossbeam_channel::unbounded;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::rsa::block::{decrypt_block, encrypt_block};
use crate::rsa::config::{Config, RunMode};
use crate::rsa::error::{Result, RsaError};
use crate::rsa::key_gen::{KeyGenEvent, KeyGenerator};
use crate::rsa::keys::{private_path, public_path, KeyError, KeyPair, RsaKey, load_private_key, load_public_key};
use crate::rsa::stream::{decrypt_stream, encrypt_stream, StreamSummary};

const BAR_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {msg}";

fn describe(event: &KeyGenEvent) -> String {
    match event {
        KeyGenEvent::PrimeRejected { slot, bits } => format!("{} candidate has {} bits, recompute it", slot, bits),
        KeyGenEvent::PrimeFound { slot, bits } => format!("{} prime found ({} bits)", slot, bits),
        KeyGenEvent::DuplicatePrime => "p and q are equal, regenerating q".to_string(),
        KeyGenEvent::ExponentRejected(e) => format!("e = {:x} shares a factor with phi", e),
        KeyGenEvent::ExponentChosen(e) => format!("e = {:x}", e),
    }
}

fn elapsed_ms(start: i64) -> i64 { Local::now().timestamp_millis() - start }

impl Config {
    pub fn reader(&self) -> Result<Box<dyn Read>> {
        let reader: Box<dyn Read> = match self.input.as_str() {
            "stdin" => Box::new(io::stdin()),
            f => Box::new(BufReader::new(File::open(f)?)),
        };
        Ok(reader)
    }

    pub fn writer(&self) -> Result<Box<dyn Write>> {
        let writer: Box<dyn Write> = match self.output.as_str() {
            "stdout" => Box::new(io::stdout()),
            f => Box::new(BufWriter::new(File::create(f)?)),
        };
        Ok(writer)
    }

    fn progress_bar(&self, len: u64) -> Option<ProgressBar> {
        if self.silent { return None; }
        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    }

    fn spinner(&self) -> Option<ProgressBar> {
        if self.silent { return None; }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template(SPINNER_TEMPLATE) {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Input reader, wrapped in a byte progress bar when the input is a file.
    fn tracked_reader(&self) -> Result<(Box<dyn Read>, Option<ProgressBar>)> {
        let reader = self.reader()?;
        if self.input == "stdin" { return Ok((reader, None)); }
        match self.progress_bar(fs::metadata(&self.input)?.len()) {
            Some(pb) => {
                let reader: Box<dyn Read> = Box::new(pb.wrap_read(reader));
                Ok((reader, Some(pb)))
            }
            None => Ok((reader, None)),
        }
    }

    pub fn generate(&self) -> Result<KeyPair> {
        let (tx, rx) = unbounded();
        let generator = KeyGenerator::new().with_exponent_policy(self.exponent).with_events(tx);
        let pb = self.spinner();
        let watcher = {
            let pb = pb.clone();
            thread::spawn(move || {
                for event in rx.iter() {
                    if let Some(pb) = &pb { pb.set_message(describe(&event)); }
                }
            })
        };
        let start = Local::now().timestamp_millis();
        let mut rng = StdRng::from_entropy();
        let res = generator.generate(self.bits, &mut rng);
        drop(generator);
        let _ = watcher.join();
        if let Some(pb) = &pb { pb.finish_and_clear(); }
        let key_pair = res?;
        info!("Key generation time: {} ms, modulus {} bits", elapsed_ms(start), key_pair.bits());
        key_pair.save(&self.key)?;
        Ok(key_pair)
    }

    pub fn encrypt(&self) -> Result<StreamSummary> {
        let key = load_public_key(public_path(&self.key))?;
        let (mut reader, pb) = self.tracked_reader()?;
        let mut writer = self.writer()?;
        let start = Local::now().timestamp_millis();
        let summary = encrypt_stream(&key, &mut reader, &mut writer)?;
        if let Some(pb) = &pb { pb.finish_with_message("Done"); }
        info!("Encrypted [{}] => [{}]: {} blocks, {} => {} bytes in {} ms",
            self.input, self.output, summary.blocks, summary.bytes_read, summary.bytes_written, elapsed_ms(start));
        Ok(summary)
    }

    pub fn decrypt(&self) -> Result<StreamSummary> {
        let key = load_private_key(private_path(&self.key))?;
        let (mut reader, pb) = self.tracked_reader()?;
        let mut writer = self.writer()?;
        let start = Local::now().timestamp_millis();
        let summary = decrypt_stream(&key, &mut reader, &mut writer)?;
        if let Some(pb) = &pb { pb.finish_with_message("Done"); }
        info!("Decrypted [{}] => [{}]: {} blocks, {} => {} bytes in {} ms",
            self.input, self.output, summary.blocks, summary.bytes_read, summary.bytes_written, elapsed_ms(start));
        Ok(summary)
    }

    /// Round trips random blocks of random length through the stored key pair.
    pub fn test(&self) -> Result<()> {
        let key_pair = KeyPair::load(&self.key)?;
        if key_pair.public.modulus != key_pair.private.modulus {
            return Err(KeyError::Mismatch.into());
        }
        info!("start testing {}-bit key pair {}", key_pair.bits(), self.key);
        let size = key_pair.public.key_bytes() - 1;
        let mut rng = StdRng::from_entropy();
        let pb = self.progress_bar((self.rounds * size) as u64);
        let start = Local::now().timestamp_millis();
        let mut failures = 0;
        for _ in 0..self.rounds {
            let len = rng.gen_range(0..=size);
            let source = (0..len).map(|_| rng.gen::<u8>()).collect::<Vec<_>>();
            let c = encrypt_block(&key_pair.public, &source)?;
            let m = decrypt_block(&key_pair.private, &c)?;
            if c.len() != size + 1 || m.len() != size || !m.ends_with(&source) {
                debug!("mismatch on {} byte block {:x?}", len, source);
                failures += 1;
            }
            if let Some(pb) = &pb { pb.inc(size as u64); }
        }
        if let Some(pb) = &pb { pb.finish_with_message("Test done"); }
        if failures > 0 {
            return Err(RsaError::SelfTest(failures));
        }
        info!("Test pass: {} blocks in {} ms", self.rounds, elapsed_ms(start));
        Ok(())
    }

    pub fn run(&self) -> Result<()> {
        match self.mode {
            RunMode::Generate => { self.generate()?; }
            RunMode::Encrypt => { self.encrypt()?; }
            RunMode::Decrypt => { self.decrypt()?; }
            RunMode::Test => self.test()?,
        }
        Ok(())
    }
}
