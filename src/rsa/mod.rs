//! Textbook RSA: key generation, single-block transform and a chunked
//! stream format with a 2-byte length trailer.
//!
//! No OAEP, no authentication and no constant-time arithmetic beyond what
//! `num-bigint` offers. Do not use this to protect real data.

pub mod app;
pub mod block;
pub mod config;
pub mod error;
pub mod key_gen;
pub mod keys;
pub mod math;
pub mod prime_gen;
pub mod stream;

pub use block::*;
pub use config::*;
pub use error::*;
pub use key_gen::*;
pub use keys::*;
pub use prime_gen::{is_probable_prime, next_prime, PrimeSampler};
pub use stream::*;
