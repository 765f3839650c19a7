//! PKCS#1 v1.5 encrypt/decrypt over PEM key strings
//!
//! Ciphertext crosses the wire base64-encoded. A plaintext longer than the
//! key's block capacity is rejected outright; this gateway never truncates
//! or chunks.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};

use crate::error::{CryptoError, Result};

// PKCS#1 v1.5 padding overhead in bytes.
const PADDING_OVERHEAD: usize = 11;

/// Largest plaintext the key can encrypt in one block
pub fn max_plaintext_len(public_key: &RsaPublicKey) -> usize {
    public_key.size().saturating_sub(PADDING_OVERHEAD)
}

/// Encrypt plaintext with a SPKI PEM public key, returning base64 ciphertext
pub fn encrypt(plaintext: &str, public_key_pem: &str) -> Result<String> {
    let public_key = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    let max = max_plaintext_len(&public_key);
    let size = plaintext.len();
    if size > max {
        return Err(CryptoError::Encoding(format!(
            "plaintext is {size} bytes but a {}-bit key encrypts at most {max} bytes",
            public_key.size() * 8,
        )));
    }

    let ciphertext = public_key
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, plaintext.as_bytes())
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;

    Ok(STANDARD.encode(ciphertext))
}

/// Decrypt base64 ciphertext with a PKCS#8 PEM private key
pub fn decrypt(ciphertext_b64: &str, private_key_pem: &str) -> Result<String> {
    let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

    let ciphertext = STANDARD
        .decode(ciphertext_b64)
        .map_err(|e| CryptoError::Decoding(format!("invalid base64: {e}")))?;

    let plaintext = private_key
        .decrypt(Pkcs1v15Encrypt, &ciphertext)
        .map_err(|e| CryptoError::Decoding(e.to_string()))?;

    String::from_utf8(plaintext).map_err(|e| CryptoError::Decoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_key_pair;

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let pair = generate_key_pair().expect("key pair generated");

        let ciphertext = encrypt("hello", &pair.public_key).expect("encrypted");
        assert_ne!(ciphertext, "hello");

        let plaintext = decrypt(&ciphertext, &pair.private_key).expect("decrypted");
        assert_eq!(plaintext, "hello");
    }

    #[test]
    fn decrypt_with_wrong_key_fails() {
        let pair = generate_key_pair().expect("key pair generated");
        let other = generate_key_pair().expect("key pair generated");

        let ciphertext = encrypt("hello", &pair.public_key).expect("encrypted");
        let err = decrypt(&ciphertext, &other.private_key).unwrap_err();
        assert!(matches!(err, CryptoError::Decoding(_)));
    }

    #[test]
    fn oversized_plaintext_is_rejected() {
        let pair = generate_key_pair().expect("key pair generated");

        // 2048-bit key, 256-byte modulus: capacity is 245 bytes.
        let oversized = "x".repeat(246);
        let err = encrypt(&oversized, &pair.public_key).unwrap_err();
        assert!(matches!(err, CryptoError::Encoding(_)));

        let at_capacity = "x".repeat(245);
        encrypt(&at_capacity, &pair.public_key).expect("fits in one block");
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(matches!(
            encrypt("hello", "not a pem key").unwrap_err(),
            CryptoError::InvalidKey(_)
        ));
        assert!(matches!(
            decrypt("AAAA", "not a pem key").unwrap_err(),
            CryptoError::InvalidKey(_)
        ));
    }

    #[test]
    fn malformed_ciphertext_is_rejected() {
        let pair = generate_key_pair().expect("key pair generated");

        let err = decrypt("%%% not base64 %%%", &pair.private_key).unwrap_err();
        assert!(matches!(err, CryptoError::Decoding(_)));

        let err = decrypt("AAAA", &pair.private_key).unwrap_err();
        assert!(matches!(err, CryptoError::Decoding(_)));
    }
}
