use lazy_static::lazy_static;
use log::trace;
use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

/// Miller-Rabin bases: every odd prime below 100.
pub const WITNESSES: [u32; 24] = [
    3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53,
    59, 61, 67, 71, 73, 79, 83, 89, 97,
];

lazy_static! {
    static ref WITNESS_VALUES: Vec<BigUint> = WITNESSES.iter().map(|&r| BigUint::from(r)).collect();
    static ref TWO: BigUint = BigUint::from(2u32);
}

/// Probabilistic primality test. Composites may slip through with negligible
/// probability, primes are never rejected.
pub fn is_probable_prime(n: &BigUint) -> bool {
    if n.is_zero() || n.is_one() { return false; }
    if *n == *TWO { return true; }
    if !n.bit(0) { return false; }
    for r in WITNESS_VALUES.iter() {
        if (n % r).is_zero() && n != r { return false; }
        if !miller_rabin_round(n, r) { return false; }
    }
    true
}

fn miller_rabin_round(n: &BigUint, r: &BigUint) -> bool {
    if n == r { return true; }
    let n1: BigUint = n - 1u32;
    let h = n1.trailing_zeros().unwrap_or(0);
    let d = &n1 >> h;
    let mut x = r.modpow(&d, n);
    if x.is_one() || x == n1 { return true; }
    for _ in 1..h {
        x = x.modpow(&TWO, n);
        if x.is_one() { return false; }
        if x == n1 { return true; }
    }
    false
}

/// Smallest probable prime strictly above the odd number at or after `n`.
pub fn next_prime(n: &BigUint) -> BigUint {
    let mut n = n.clone();
    if !n.bit(0) { n += 1u32; }
    let mut tries: u64 = 0;
    loop {
        n += 2u32;
        tries += 1;
        if is_probable_prime(&n) {
            trace!("next prime found after {} candidates", tries);
            return n;
        }
    }
}

pub struct PrimeSampler<R> {
    rng: R,
}

impl<R: RngCore + CryptoRng> PrimeSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Uniform `bits`-bit odd number with the top bit set.
    pub fn random_bits(&mut self, bits: u64) -> BigUint {
        if bits == 0 { return BigUint::zero(); }
        let mut n = self.rng.gen_biguint(bits);
        n |= BigUint::one() << (bits - 1);
        n |= BigUint::one();
        n
    }

    /// Random probable prime of exactly `bits` bits. `bits` must be at least 3,
    /// smaller sizes have no candidate whose successor prime fits.
    pub fn random_prime(&mut self, bits: u64) -> BigUint {
        loop {
            let p = next_prime(&self.random_bits(bits));
            if p.bits() == bits { return p; }
            trace!("prime overflowed to {} bits, resampling", p.bits());
        }
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use num_traits::One;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use super::*;

    fn sieve(limit: usize) -> Vec<bool> {
        let mut is_prime = vec![true; limit];
        is_prime[0] = false;
        is_prime[1] = false;
        let mut i = 2;
        while i * i < limit {
            if is_prime[i] {
                let mut j = i * i;
                while j < limit {
                    is_prime[j] = false;
                    j += i;
                }
            }
            i += 1;
        }
        is_prime
    }

    #[test]
    fn matches_sieve_below_10000() {
        let expected = sieve(10000);
        for (n, &prime) in expected.iter().enumerate() {
            assert_eq!(is_probable_prime(&BigUint::from(n)), prime, "n = {}", n);
        }
    }

    #[test]
    fn zero_and_one_are_not_prime() {
        assert!(!is_probable_prime(&BigUint::from(0u32)));
        assert!(!is_probable_prime(&BigUint::from(1u32)));
    }

    #[test]
    fn large_values() {
        let m127 = (BigUint::one() << 127u32) - 1u32;
        assert!(is_probable_prime(&m127));
        // 2^64 + 1 = 274177 * 67280421310721
        let f6 = (BigUint::one() << 64u32) + 1u32;
        assert!(!is_probable_prime(&f6));
        // carmichael numbers
        for c in [561u32, 41041, 825265, 321197185] {
            assert!(!is_probable_prime(&BigUint::from(c)), "{}", c);
        }
        let semiprime = BigUint::from(1_000_000_007u64) * BigUint::from(998_244_353u64);
        assert!(!is_probable_prime(&semiprime));
    }

    #[test]
    fn next_prime_skips_start() {
        assert_eq!(next_prime(&BigUint::from(7u32)), BigUint::from(11u32));
        assert_eq!(next_prime(&BigUint::from(8u32)), BigUint::from(11u32));
        assert_eq!(next_prime(&BigUint::from(65537u32)), BigUint::from(65539u32));
        assert_eq!(next_prime(&BigUint::from(0u32)), BigUint::from(3u32));
    }

    #[test]
    fn random_bits_exact_and_odd() {
        let mut sampler = PrimeSampler::new(StdRng::seed_from_u64(7));
        for bits in [2u64, 8, 33, 64, 129, 512] {
            let n = sampler.random_bits(bits);
            assert_eq!(n.bits(), bits);
            assert!(n.bit(0));
        }
        assert_eq!(sampler.random_bits(0), BigUint::from(0u32));
    }

    #[test]
    fn random_prime_exact_bits() {
        let mut sampler = PrimeSampler::new(StdRng::seed_from_u64(42));
        for bits in [3u64, 16, 32, 64, 128] {
            let p = sampler.random_prime(bits);
            assert_eq!(p.bits(), bits);
            assert!(is_probable_prime(&p));
        }
    }
}
