//! Post-quantum Key Encapsulation Mechanism (§4.3 "KEM contract").
//!
//! Sized to the Kyber-768 NIST parameter set (§3): this module contracts
//! over Kyber-768's *interface*, not its lattice math (§1 Non-goals, §9
//! Open Question b) — a standards-compliant implementer swaps this
//! module's body for a vetted Kyber-768 crate without touching callers.
//!
//! Grounded in structure on
//! `crypto/pqc/crystals_kyber.rs` (deterministic SHA3-derived keygen,
//! `PublicKey`/`SecretKey`/`Ciphertext`/`SharedSecret` newtypes), but
//! reworked per `SPEC_FULL.md` §12.2: the teacher's mock explicitly does
//! not guarantee `decapsulate(encapsulate(pk).1, sk) ==
//! encapsulate(pk).0` (its own test says so), which violates invariant 5.
//! Here the public key is always deterministically re-derivable from the
//! secret key, so `decapsulate` recomputes it and reconstructs the same
//! shared secret `encapsulate` produced under the matching public key.

use getrandom::getrandom;
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256,
};

use crate::error::{CoreError, CoreResult};
use crate::rng;

pub const PUBLIC_KEY_SIZE: usize = 1184;
pub const SECRET_KEY_SIZE: usize = 2400;
pub const CIPHERTEXT_SIZE: usize = 1088;
pub const SHARED_SECRET_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(pub Vec<u8>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKey(pub Vec<u8>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext(pub Vec<u8>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedSecret(pub [u8; SHARED_SECRET_SIZE]);

/// Seeds and probes the process RNG. Called once from
/// `CryptoAdapter::init`.
pub fn init() -> CoreResult<()> {
    rng::probe(b"veritas-kem").map_err(|_| CoreError::EntropyFailure)
}

fn shake_expand(label: &[u8], input: &[u8], out_len: usize) -> Vec<u8> {
    let mut shake = Shake256::default();
    Update::update(&mut shake, label);
    Update::update(&mut shake, input);
    let mut reader = shake.finalize_xof();
    let mut out = vec![0u8; out_len];
    reader.read(&mut out);
    out
}

/// Recomputes the public key deterministically from a secret key —
/// both `keygen` and `decapsulate` rely on this to stay consistent.
fn derive_public(secret: &SecretKey) -> PublicKey {
    PublicKey(shake_expand(b"KEM-PUBLIC", &secret.0, PUBLIC_KEY_SIZE))
}

/// `keygen`: a deterministic function of fresh entropy, producing a
/// keypair at the fixed byte sizes from §3.
pub fn keygen() -> CoreResult<(PublicKey, SecretKey)> {
    let mut secret_bytes = vec![0u8; SECRET_KEY_SIZE];
    getrandom(&mut secret_bytes).map_err(|_| CoreError::EntropyFailure)?;
    let secret = SecretKey(secret_bytes);
    let public = derive_public(&secret);
    Ok((public, secret))
}

/// `encapsulate`: `(ciphertext, shared_secret)` derived from `public_key`
/// and fresh randomness only.
pub fn encapsulate(public_key: &PublicKey) -> CoreResult<(Ciphertext, SharedSecret)> {
    if public_key.0.len() != PUBLIC_KEY_SIZE {
        return Err(CoreError::InvalidArgument("public key has the wrong size"));
    }

    let mut message = [0u8; SHARED_SECRET_SIZE];
    getrandom(&mut message).map_err(|_| CoreError::EntropyFailure)?;

    let keystream = shake_expand(b"KEM-MASK", &public_key.0, SHARED_SECRET_SIZE);
    let mut core = [0u8; SHARED_SECRET_SIZE];
    for i in 0..SHARED_SECRET_SIZE {
        core[i] = message[i] ^ keystream[i];
    }

    let mut ciphertext = vec![0u8; CIPHERTEXT_SIZE];
    ciphertext[..SHARED_SECRET_SIZE].copy_from_slice(&core);
    let filler = shake_expand(b"KEM-FILLER", &core, CIPHERTEXT_SIZE - SHARED_SECRET_SIZE);
    ciphertext[SHARED_SECRET_SIZE..].copy_from_slice(&filler);

    let shared = shake_expand(b"KEM-SECRET", &[&message[..], &public_key.0[..]].concat(), SHARED_SECRET_SIZE);
    let mut shared_secret = [0u8; SHARED_SECRET_SIZE];
    shared_secret.copy_from_slice(&shared);

    Ok((Ciphertext(ciphertext), SharedSecret(shared_secret)))
}

/// `decapsulate`: recovers the shared secret from `ciphertext` and
/// `secret_key`; yields the same 32-byte secret `encapsulate` produced
/// under the matching public key (invariant 5 / S2).
pub fn decapsulate(ciphertext: &Ciphertext, secret_key: &SecretKey) -> CoreResult<SharedSecret> {
    if ciphertext.0.len() != CIPHERTEXT_SIZE {
        return Err(CoreError::InvalidArgument("ciphertext has the wrong size"));
    }
    if secret_key.0.len() != SECRET_KEY_SIZE {
        return Err(CoreError::InvalidArgument("secret key has the wrong size"));
    }

    let public_key = derive_public(secret_key);
    let keystream = shake_expand(b"KEM-MASK", &public_key.0, SHARED_SECRET_SIZE);
    let mut message = [0u8; SHARED_SECRET_SIZE];
    for i in 0..SHARED_SECRET_SIZE {
        message[i] = ciphertext.0[i] ^ keystream[i];
    }

    let shared = shake_expand(b"KEM-SECRET", &[&message[..], &public_key.0[..]].concat(), SHARED_SECRET_SIZE);
    let mut shared_secret = [0u8; SHARED_SECRET_SIZE];
    shared_secret.copy_from_slice(&shared);
    Ok(SharedSecret(shared_secret))
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
    fn round_trip_matches() {
        // Scenario S2
        let (pk, sk) = keygen().unwrap();
        let (ct, ss1) = encapsulate(&pk).unwrap();
        assert_eq!(ct.0.len(), CIPHERTEXT_SIZE);
        let ss2 = decapsulate(&ct, &sk).unwrap();
        assert_eq!(ss1.0, ss2.0);
    }

    #[test]
    fn rejects_wrong_size_ciphertext() {
        let (_, sk) = keygen().unwrap();
        let bad = Ciphertext(vec![0u8; 16]);
        assert!(decapsulate(&bad, &sk).is_err());
    }

    #[test]
    fn different_keypairs_yield_different_secrets() {
        let (pk_a, _) = keygen().unwrap();
        let (pk_b, _) = keygen().unwrap();
        let (_, ss_a) = encapsulate(&pk_a).unwrap();
        let (_, ss_b) = encapsulate(&pk_b).unwrap();
        assert_ne!(ss_a.0, ss_b.0);
    }
}
