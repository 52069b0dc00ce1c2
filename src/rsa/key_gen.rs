use std::fmt::{Display, Formatter};
use std::panic;
use std::thread;
use crossbeam_channel::Sender;
use log::{debug, info};
use num::Integer;
use num_bigint::BigUint;
use num_traits::One;
use rand::rngs::{OsRng, StdRng};
use rand::{CryptoRng, RngCore, SeedableRng};
use crate::rsa::error::{Result, RsaError};
use crate::rsa::keys::{KeyPair, PrivateKey, PublicKey};
use crate::rsa::math::{euler, mod_inverse};
use crate::rsa::prime_gen::{next_prime, PrimeSampler};

pub const DEFAULT_PUBLIC_EXPONENT: u32 = 65537;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExponentPolicy {
    /// Start from 65537
    #[default]
    Fixed,
    /// Start from a random prime of a quarter of the key size
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimeSlot { P, Q }

impl Display for PrimeSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimeSlot::P => write!(f, "p"),
            PrimeSlot::Q => write!(f, "q"),
        }
    }
}

/// Progress notifications sent to an optional diagnostics sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyGenEvent {
    PrimeRejected { slot: PrimeSlot, bits: u64 },
    PrimeFound { slot: PrimeSlot, bits: u64 },
    DuplicatePrime,
    ExponentRejected(BigUint),
    ExponentChosen(BigUint),
}

#[derive(Debug, Clone, Default)]
pub struct KeyGenerator {
    pub exponent_policy: ExponentPolicy,
    events: Option<Sender<KeyGenEvent>>,
}

impl KeyGenerator {
    pub fn new() -> Self { Self::default() }

    pub fn with_exponent_policy(mut self, policy: ExponentPolicy) -> Self {
        self.exponent_policy = policy;
        self
    }

    pub fn with_events(mut self, events: Sender<KeyGenEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: KeyGenEvent) {
        if let Some(tx) = &self.events {
            // receiver may be gone, diagnostics are best effort
            let _ = tx.send(event);
        }
    }

    pub fn check_key_size(bits: u64) -> Result<u64> {
        if bits == 0 || bits % 64 != 0 {
            return Err(RsaError::InvalidKeySize(bits));
        }
        Ok(bits / 2)
    }

    pub fn generate<R: RngCore + CryptoRng>(&self, bits: u64, rng: &mut R) -> Result<KeyPair> {
        let p_size = KeyGenerator::check_key_size(bits)?;
        info!("Compute RSA keys size: {} bits", bits);
        let (p, q) = self.search_primes(p_size, rng)?;
        self.derive_keys(&p, &q, bits, rng)
    }

    fn search_one<R: RngCore + CryptoRng>(&self, slot: PrimeSlot, bits: u64, sampler: &mut PrimeSampler<R>) -> BigUint {
        loop {
            let prime = sampler.random_prime(bits);
            if prime.bits() == bits {
                debug!("{} prime found ({} bits)", slot, bits);
                self.emit(KeyGenEvent::PrimeFound { slot, bits });
                return prime;
            }
            debug!("{} prime has {} bits instead of {}, recompute it", slot, prime.bits(), bits);
            self.emit(KeyGenEvent::PrimeRejected { slot, bits: prime.bits() });
        }
    }

    /// Two distinct primes of exactly `bits` bits, searched on two threads.
    pub fn search_primes<R: RngCore + CryptoRng>(&self, bits: u64, rng: &mut R) -> Result<(BigUint, BigUint)> {
        let mut sampler_p = PrimeSampler::new(StdRng::from_rng(&mut *rng)?);
        let mut sampler_q = PrimeSampler::new(StdRng::from_rng(&mut *rng)?);
        let (p, mut q) = thread::scope(|s| {
            let handle_p = s.spawn(|| self.search_one(PrimeSlot::P, bits, &mut sampler_p));
            let handle_q = s.spawn(|| self.search_one(PrimeSlot::Q, bits, &mut sampler_q));
            let p = handle_p.join().unwrap_or_else(|e| panic::resume_unwind(e));
            let q = handle_q.join().unwrap_or_else(|e| panic::resume_unwind(e));
            (p, q)
        });
        while p == q {
            debug!("p and q are equal, regenerating q");
            self.emit(KeyGenEvent::DuplicatePrime);
            q = self.search_one(PrimeSlot::Q, bits, &mut sampler_q);
        }
        Ok((p, q))
    }

    /// Public exponent coprime to `totient`, following the configured policy.
    pub fn choose_exponent<R: RngCore + CryptoRng>(&self, totient: &BigUint, bits: u64, rng: &mut R) -> BigUint {
        let mut e = match self.exponent_policy {
            ExponentPolicy::Fixed => BigUint::from(DEFAULT_PUBLIC_EXPONENT),
            ExponentPolicy::Random => {
                let mut sampler = PrimeSampler::new(&mut *rng);
                next_prime(&sampler.random_bits(bits / 4))
            }
        };
        while !totient.gcd(&e).is_one() {
            self.emit(KeyGenEvent::ExponentRejected(e.clone()));
            e = next_prime(&(e + 2u32));
        }
        self.emit(KeyGenEvent::ExponentChosen(e.clone()));
        e
    }

    /// Builds the key pair from two distinct primes.
    pub fn derive_keys<R: RngCore + CryptoRng>(&self, p: &BigUint, q: &BigUint, bits: u64, rng: &mut R) -> Result<KeyPair> {
        let n = p * q;
        debug!("n = p * q ({} bits)", n.bits());
        let f = euler(p, q);
        let e = self.choose_exponent(&f, bits, rng);
        debug!("e = {:x}", e);
        let d = mod_inverse(&e, &f).ok_or(RsaError::KeyDerivation)?;
        if !((&d * &e) % &f).is_one() {
            return Err(RsaError::KeyDerivation);
        }
        Ok(KeyPair {
            public: PublicKey { modulus: n.clone(), public_exponent: e },
            private: PrivateKey { modulus: n, private_exponent: d },
        })
    }
}

/// Generates a key pair with the default generator, drawing randomness from the OS.
pub fn generate_key_pair(bits: u64) -> Result<KeyPair> {
    KeyGenerator::new().generate(bits, &mut OsRng)
}
