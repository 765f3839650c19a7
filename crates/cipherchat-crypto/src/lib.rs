//! # CipherChat Cryptographic Gateway
//!
//! RSA encryption and decryption over caller-supplied PEM key material.
//!
//! Both operations are pure request/response: no retries, no internal state,
//! no side effects. Key pairs are generated once per user at registration and
//! never rotated.
//!
//! ## Components
//!
//! - [`keys`]: key pair generation and PEM encoding
//! - [`cipher`]: PKCS#1 v1.5 encrypt/decrypt with base64 transport encoding

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod cipher;
pub mod error;
pub mod keys;

pub use cipher::{decrypt, encrypt, max_plaintext_len};
pub use error::{CryptoError, Result};
pub use keys::{generate_key_pair, KeyPair};

/// RSA modulus size in bits for generated key pairs
pub const RSA_KEY_BITS: usize = 2048;
