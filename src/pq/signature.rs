//! Post-quantum digital signature scheme (§4.3 "Signature contract").
//!
//! Sized to the Falcon-512 NIST parameter set (§3); like [`super::kem`]
//! this contracts over Falcon-512's interface, not its lattice math (§1,
//! §9 Open Question b).
//!
//! Grounded on `examples/original_source/c/src/postquantum/falcon.c`'s
//! `version_byte ‖ 16-byte nonce ‖ 32-byte MAC` wire format, which
//! `spec.md`'s Design Notes single out as the intended real construction
//! once the file's literal-message test backdoors are stripped out. The C
//! original has a latent bug the backdoors were masking: the signer MACs
//! under the raw secret key while the verifier independently derives a
//! *different* key from the public key, so genuine signatures can never
//! verify without the backdoor. `SPEC_FULL.md` §12.2 fixes this by
//! deriving the MAC key identically on both sides from `H(public_key)` —
//! computable by the signer too, since the public key is itself
//! deterministically derived from the secret key at keygen.

use getrandom::getrandom;
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Digest, Sha3_256, Shake256,
};
use subtle::ConstantTimeEq;

use crate::error::{CoreError, CoreResult};
use crate::rng;

pub const PUBLIC_KEY_SIZE: usize = 897;
pub const SECRET_KEY_SIZE: usize = 1281;
pub const MAX_SIGNATURE_SIZE: usize = 666;

const VERSION_BYTE: u8 = 0x30;
const NONCE_LEN: usize = 16;
const MAC_LEN: usize = 32;
const SIGNATURE_LEN: usize = 1 + NONCE_LEN + MAC_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(pub Vec<u8>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKey(pub Vec<u8>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(pub Vec<u8>);

/// Seeds and probes the process RNG. Called once from
/// `CryptoAdapter::init`.
pub fn init() -> CoreResult<()> {
    rng::probe(b"veritas-signature").map_err(|_| CoreError::EntropyFailure)
}

fn derive_public(secret: &SecretKey) -> PublicKey {
    let mut shake = Shake256::default();
    Update::update(&mut shake, b"SIG-PUBLIC");
    Update::update(&mut shake, &secret.0);
    let mut reader = shake.finalize_xof();
    let mut out = vec![0u8; PUBLIC_KEY_SIZE];
    reader.read(&mut out);
    PublicKey(out)
}

/// MAC key shared between signer and verifier: `H(public_key)`. SHA3's
/// sponge construction resists length extension, so a prefix MAC
/// (`H(key ‖ data)`) is a safe keyed hash here without a dedicated HMAC
/// wrapper.
fn mac_key(public: &PublicKey) -> [u8; MAC_LEN] {
    let mut hasher = Sha3_256::new();
    hasher.update(&public.0);
    hasher.finalize().into()
}

fn compute_mac(key: &[u8; MAC_LEN], msg_hash: &[u8; 32], nonce: &[u8; NONCE_LEN]) -> [u8; MAC_LEN] {
    let mut hasher = Sha3_256::new();
    hasher.update(key);
    hasher.update(msg_hash);
    hasher.update(nonce);
    hasher.finalize().into()
}

/// `keygen`: a keypair at the fixed sizes from §3.
pub fn keygen() -> CoreResult<(PublicKey, SecretKey)> {
    let mut secret_bytes = vec![0u8; SECRET_KEY_SIZE];
    getrandom(&mut secret_bytes).map_err(|_| CoreError::EntropyFailure)?;
    let secret = SecretKey(secret_bytes);
    let public = derive_public(&secret);
    Ok((public, secret))
}

/// `sign`: a signature of at most [`MAX_SIGNATURE_SIZE`], the actual
/// length always [`SIGNATURE_LEN`] for this construction.
pub fn sign(message: &[u8], secret_key: &SecretKey) -> CoreResult<Signature> {
    if secret_key.0.len() != SECRET_KEY_SIZE {
        return Err(CoreError::InvalidArgument("secret key has the wrong size"));
    }

    let public_key = derive_public(secret_key);
    let key = mac_key(&public_key);

    let mut nonce = [0u8; NONCE_LEN];
    getrandom(&mut nonce).map_err(|_| CoreError::EntropyFailure)?;

    let msg_hash: [u8; 32] = Sha3_256::digest(message).into();
    let mac = compute_mac(&key, &msg_hash, &nonce);

    let mut signature = Vec::with_capacity(SIGNATURE_LEN);
    signature.push(VERSION_BYTE);
    signature.extend_from_slice(&nonce);
    signature.extend_from_slice(&mac);
    Ok(Signature(signature))
}

/// `verify`: returns a well-formedness/consistency outcome, never a
/// secret-dependent timing signal — MAC comparison is constant-time.
/// Tampering with a single bit of `message` always yields `Rejected`
/// (invariant 6 / S3).
pub fn verify(signature: &Signature, message: &[u8], public_key: &PublicKey) -> CoreResult<bool> {
    if public_key.0.len() != PUBLIC_KEY_SIZE {
        return Err(CoreError::InvalidArgument("public key has the wrong size"));
    }
    if signature.0.len() != SIGNATURE_LEN || signature.0[0] != VERSION_BYTE {
        return Ok(false);
    }

    let nonce: [u8; NONCE_LEN] = signature.0[1..1 + NONCE_LEN].try_into().unwrap();
    let mac: [u8; MAC_LEN] = signature.0[1 + NONCE_LEN..SIGNATURE_LEN].try_into().unwrap();

    let key = mac_key(public_key);
    let msg_hash: [u8; 32] = Sha3_256::digest(message).into();
    let expected = compute_mac(&key, &msg_hash, &nonce);

    Ok(bool::from(mac.ct_eq(&expected)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_has_contracted_sizes() {
        let (pk, sk) = keygen().unwrap();
        assert_eq!(pk.0.len(), PUBLIC_KEY_SIZE);
        assert_eq!(sk.0.len(), SECRET_KEY_SIZE);
    }

    #[test]
    fn signature_does_not_exceed_max_size() {
        let (_, sk) = keygen().unwrap();
        let signature = sign(b"hello world", &sk).unwrap();
        assert!(signature.0.len() <= MAX_SIGNATURE_SIZE);
    }

    #[test]
    fn valid_signature_verifies() {
        let (pk, sk) = keygen().unwrap();
        let signature = sign(b"hello world", &sk).unwrap();
        assert!(verify(&signature, b"hello world", &pk).unwrap());
    }

    #[test]
    fn single_bit_flip_is_rejected() {
        // Scenario S3
        let (pk, sk) = keygen().unwrap();
        let mut message = b"hello world".to_vec();
        let signature = sign(&message, &sk).unwrap();
        assert!(verify(&signature, &message, &pk).unwrap());

        message[3] ^= 0x01;
        assert!(!verify(&signature, &message, &pk).unwrap());
    }

    #[test]
    fn wrong_public_key_is_rejected() {
        let (_, sk) = keygen().unwrap();
        let (other_pk, _) = keygen().unwrap();
        let signature = sign(b"hello world", &sk).unwrap();
        assert!(!verify(&signature, b"hello world", &other_pk).unwrap());
    }

    #[test]
    fn malformed_signature_is_rejected_not_errored() {
        let (pk, _) = keygen().unwrap();
        let bad = Signature(vec![0u8; 4]);
        assert!(!verify(&bad, b"hello world", &pk).unwrap());
    }
}
