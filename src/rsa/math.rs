use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

pub fn euler(p: &BigUint, q: &BigUint) -> BigUint { (p - 1u32) * (q - 1u32) }

/// Returns `(g, x, y)` with `a*x + b*y = g = gcd(a, b)`.
fn extended_euclid(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    if b.is_zero() {
        return (a.clone(), BigInt::one(), BigInt::zero());
    }
    let (d, x, y) = extended_euclid(b, &(a % b));
    let next_y = x - (a / b) * &y;
    (d, y, next_y)
}

/// Inverse of `a` modulo `m`, if `a` and `m` are coprime.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() { return None; }
    let (a, m) = (BigInt::from_biguint(Sign::Plus, a.clone()), BigInt::from_biguint(Sign::Plus, m.clone()));
    let (d, x, _) = extended_euclid(&a, &m);
    if !d.is_one() { return None; }
    ((x % &m + &m) % &m).to_biguint()
}
