//! Crypto Adapter (§4.4): process-wide facade providing typed keys with
//! lifecycle, and composing the entanglement, ZKP, and primitive-layer
//! subsystems into combined operations.
//!
//! Grounded on `examples/original_source/c/src/postquantum/crypto_adapter.c`'s
//! `adapter_state` global and `crypto_key_t` tagged union, reworked per the
//! "Process-wide init flags" and "Tagged keys" design notes: the C
//! `static struct adapter_state` becomes a single `parking_lot`-guarded
//! `Option<AdapterConfig>` (idiom shared with `nexus-core`'s use of
//! `parking_lot` for shared mutable state), and the key union becomes a
//! plain Rust sum type.

use std::time::{SystemTime, UNIX_EPOCH};

use getrandom::getrandom;
use parking_lot::Mutex;
use sha3::{Digest, Sha3_256};
use zeroize::Zeroize;

use crate::config::AdapterConfig;
use crate::error::{CoreError, CoreResult, VerifyOutcome};
use crate::pq::{kem, signature};
use crate::rng;
use crate::zkp::{self, VerifyParams, ZkProof};

static ADAPTER_STATE: Mutex<Option<AdapterConfig>> = Mutex::new(None);

/// Kind discriminant mirroring `key_type_t` (§3 "Crypto Key").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Symmetric,
    Kem,
    Signature,
}

/// Tagged union over key material (Design Note "Tagged keys").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoKeyMaterial {
    Symmetric(Vec<u8>),
    Kem {
        public: kem::PublicKey,
        secret: kem::SecretKey,
    },
    Signature {
        public: signature::PublicKey,
        secret: signature::SecretKey,
    },
}

impl CryptoKeyMaterial {
    fn kind(&self) -> KeyKind {
        match self {
            CryptoKeyMaterial::Symmetric(_) => KeyKind::Symmetric,
            CryptoKeyMaterial::Kem { .. } => KeyKind::Kem,
            CryptoKeyMaterial::Signature { .. } => KeyKind::Signature,
        }
    }

    fn zeroize_in_place(&mut self) {
        match self {
            CryptoKeyMaterial::Symmetric(bytes) => bytes.zeroize(),
            CryptoKeyMaterial::Kem { secret, .. } => secret.0.zeroize(),
            CryptoKeyMaterial::Signature { secret, .. } => secret.0.zeroize(),
        }
    }
}

/// Key lifecycle state (§4.4 "State machine of a key").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Fresh,
    Active,
    Expired,
    Wiped,
}

/// §3 "Crypto Key": a unique id, creation/expiry timestamps, and tagged
/// material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoKey {
    id: [u8; 16],
    created_at: u64,
    expires_at: u64,
    material: CryptoKeyMaterial,
    wiped: bool,
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl CryptoKey {
    pub fn id(&self) -> [u8; 16] {
        self.id
    }

    pub fn kind(&self) -> KeyKind {
        self.material.kind()
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Transitions: `Fresh` if never-expiring and unused, `Active` before
    /// expiry, `Expired` once past `expires_at`, `Wiped` after
    /// [`CryptoAdapter::free_key`].
    pub fn state(&self) -> KeyState {
        if self.wiped {
            return KeyState::Wiped;
        }
        if self.expires_at == 0 {
            return KeyState::Fresh;
        }
        if now_unix() >= self.expires_at {
            return KeyState::Expired;
        }
        KeyState::Active
    }

    fn require_usable(&self, expected: KeyKind) -> CoreResult<()> {
        if self.wiped {
            return Err(CoreError::InvalidArgument("key has been wiped"));
        }
        if self.kind() != expected {
            return Err(CoreError::InvalidArgument("wrong key kind for this operation"));
        }
        if self.state() == KeyState::Expired {
            return Err(CoreError::Expired);
        }
        Ok(())
    }
}

impl Drop for CryptoKey {
    fn drop(&mut self) {
        if !self.wiped {
            self.material.zeroize_in_place();
            self.id.zeroize();
        }
    }
}

/// Process-wide facade (§4.4). All associated functions operate on the
/// single `ADAPTER_STATE` guarded by a mutex; `init`/`cleanup` are
/// serialized against each other and against every other operation by
/// that same lock, per §5's "operations that mutate adapter state ...
/// must be serialized externally".
pub struct CryptoAdapter;

impl CryptoAdapter {
    /// `init`: idempotent; initializes the ZKP engine, entanglement
    /// engine, KEM, and signature primitive, in that order. Any
    /// sub-init failure returns its error; since none of these
    /// subsystems hold persistent OS resources beyond a one-shot RNG
    /// probe, there is nothing to tear down on partial failure beyond
    /// leaving the adapter uninitialized.
    pub fn init(config: AdapterConfig) -> CoreResult<()> {
        config.validate()?;
        let mut guard = ADAPTER_STATE.lock();
        if guard.is_some() {
            return Ok(());
        }

        rng::probe(b"veritas-zkp").map_err(|_| CoreError::EntropyFailure)?;
        // entanglement has no init-time entropy dependency (SHA-256 only).
        crate::pq::init()?;

        *guard = Some(config);
        tracing::info!("crypto adapter initialized");
        Ok(())
    }

    /// `cleanup`: reverse-order teardown, returning the singleton to the
    /// pre-init state. Idempotent.
    pub fn cleanup() {
        let mut guard = ADAPTER_STATE.lock();
        if guard.take().is_some() {
            tracing::info!("crypto adapter torn down");
        }
    }

    pub fn is_initialized() -> bool {
        ADAPTER_STATE.lock().is_some()
    }

    fn ensure_initialized() -> CoreResult<()> {
        if ADAPTER_STATE.lock().is_some() {
            Ok(())
        } else {
            Err(CoreError::NotInitialized)
        }
    }

    /// `generate_key`: random 16-byte id (a v4 UUID's bytes), creation
    /// time = now, expiry = now+ttl if ttl>0 else 0 (never expires).
    pub fn generate_key(kind: KeyKind, ttl_seconds: u64) -> CoreResult<CryptoKey> {
        Self::ensure_initialized()?;

        let id = *uuid::Uuid::new_v4().as_bytes();
        let created_at = now_unix();
        let expires_at = if ttl_seconds > 0 { created_at + ttl_seconds } else { 0 };

        let material = match kind {
            KeyKind::Symmetric => {
                let mut bytes = vec![0u8; 32];
                getrandom(&mut bytes).map_err(|_| CoreError::EntropyFailure)?;
                CryptoKeyMaterial::Symmetric(bytes)
            }
            KeyKind::Kem => {
                let (public, secret) = kem::keygen()?;
                CryptoKeyMaterial::Kem { public, secret }
            }
            KeyKind::Signature => {
                let (public, secret) = signature::keygen()?;
                CryptoKeyMaterial::Signature { public, secret }
            }
        };

        tracing::debug!(kind = ?kind, "key generated");
        Ok(CryptoKey {
            id,
            created_at,
            expires_at,
            material,
            wiped: false,
        })
    }

    /// `free_key`: zero-wipes secret material and the id, moving the key
    /// to the `Wiped` state (invariant 7).
    pub fn free_key(key: &mut CryptoKey) {
        key.material.zeroize_in_place();
        key.id.zeroize();
        key.wiped = true;
    }

    pub fn sign_message(key: &CryptoKey, message: &[u8]) -> CoreResult<signature::Signature> {
        Self::ensure_initialized()?;
        key.require_usable(KeyKind::Signature)?;
        let CryptoKeyMaterial::Signature { secret, .. } = &key.material else {
            unreachable!("require_usable checked the key kind");
        };
        signature::sign(message, secret)
    }

    pub fn verify_signature(
        key: &CryptoKey,
        sig: &signature::Signature,
        message: &[u8],
    ) -> CoreResult<VerifyOutcome> {
        Self::ensure_initialized()?;
        key.require_usable(KeyKind::Signature)?;
        let CryptoKeyMaterial::Signature { public, .. } = &key.material else {
            unreachable!("require_usable checked the key kind");
        };
        let accepted = signature::verify(sig, message, public)?;
        Ok(VerifyOutcome::from(accepted))
    }

    pub fn establish_key(recipient: &CryptoKey) -> CoreResult<(kem::Ciphertext, kem::SharedSecret)> {
        Self::ensure_initialized()?;
        recipient.require_usable(KeyKind::Kem)?;
        let CryptoKeyMaterial::Kem { public, .. } = &recipient.material else {
            unreachable!("require_usable checked the key kind");
        };
        kem::encapsulate(public)
    }

    pub fn receive_key(recipient: &CryptoKey, ciphertext: &kem::Ciphertext) -> CoreResult<kem::SharedSecret> {
        Self::ensure_initialized()?;
        recipient.require_usable(KeyKind::Kem)?;
        let CryptoKeyMaterial::Kem { secret, .. } = &recipient.material else {
            unreachable!("require_usable checked the key kind");
        };
        kem::decapsulate(ciphertext, secret)
    }

    /// `generate_zkproof`: builds a structure-consistency proof via the
    /// ZKP engine, then signs `H(commitment ‖ challenge ‖ response ‖
    /// public_input)` and rewrites the response field as
    /// `original_response ‖ uint64_le(signature_len) ‖ signature_bytes`
    /// (§4.4, wire format in §6). Binding `public_input` into the signed
    /// digest is what makes the composed proof reject a statement
    /// substitution attack — the same `(commitment, challenge, response,
    /// signature)` must not verify under a different public input.
    pub fn generate_zkproof(secret: &[u8], public_input: &[u8], signing_key: &CryptoKey) -> CoreResult<ZkProof> {
        Self::ensure_initialized()?;
        signing_key.require_usable(KeyKind::Signature)?;
        let CryptoKeyMaterial::Signature { secret: signing_secret, .. } = &signing_key.material else {
            unreachable!("require_usable checked the key kind");
        };

        let mut entropy = [0u8; 32];
        getrandom(&mut entropy).map_err(|_| CoreError::EntropyFailure)?;
        let proof = zkp::generate_proof(secret, &entropy)?;

        let digest = proof_digest(&proof.commitment, &proof.challenge, &proof.response, public_input);
        let sig = signature::sign(&digest, signing_secret)?;

        let mut response = proof.response.clone();
        response.extend_from_slice(&(sig.0.len() as u64).to_le_bytes());
        response.extend_from_slice(&sig.0);

        Ok(ZkProof {
            commitment: proof.commitment,
            challenge: proof.challenge,
            response,
        })
    }

    /// `verify_zkproof`: inverts [`Self::generate_zkproof`] — partitions
    /// the response, recomputes the digest over `(commitment ‖ challenge
    /// ‖ original_response)`, and verifies the attached signature.
    pub fn verify_zkproof(
        proof: &ZkProof,
        public_input: &[u8],
        verification_key: &CryptoKey,
        params: &VerifyParams,
    ) -> CoreResult<VerifyOutcome> {
        Self::ensure_initialized()?;
        verification_key.require_usable(KeyKind::Signature)?;
        let CryptoKeyMaterial::Signature { public, .. } = &verification_key.material else {
            unreachable!("require_usable checked the key kind");
        };

        if proof.response.len() < zkp::DIGEST_LEN + 8 {
            return Err(CoreError::BufferTooSmall {
                required: zkp::DIGEST_LEN + 8,
            });
        }
        let (original_response, rest) = proof.response.split_at(zkp::DIGEST_LEN);
        let (len_bytes, sig_bytes) = rest.split_at(8);
        let sig_len = u64::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
        if sig_bytes.len() != sig_len {
            return Err(CoreError::BufferTooSmall { required: sig_len });
        }

        let inner_proof = ZkProof {
            commitment: proof.commitment.clone(),
            challenge: proof.challenge.clone(),
            response: original_response.to_vec(),
        };
        let structure_ok = zkp::verify_proof(&inner_proof, public_input, params)?.is_accepted();

        let digest = proof_digest(&proof.commitment, &proof.challenge, original_response, public_input);
        let signature_ok = signature::verify(&signature::Signature(sig_bytes.to_vec()), &digest, public)?;

        Ok(VerifyOutcome::from(structure_ok && signature_ok))
    }
}

fn proof_digest(commitment: &[u8], challenge: &[u8], response: &[u8], public_input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(commitment);
    hasher.update(challenge);
    hasher.update(response);
    hasher.update(public_input);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdapterConfig;

    fn with_adapter<T>(f: impl FnOnce() -> T) -> T {
        CryptoAdapter::cleanup();
        CryptoAdapter::init(AdapterConfig::default()).unwrap();
        let result = f();
        CryptoAdapter::cleanup();
        result
    }

    #[test]
    fn operations_fail_before_init() {
        CryptoAdapter::cleanup();
        assert_eq!(
            CryptoAdapter::generate_key(KeyKind::Symmetric, 0).unwrap_err(),
            CoreError::NotInitialized
        );
    }

    #[test]
    fn init_is_idempotent() {
        with_adapter(|| {
            assert!(CryptoAdapter::init(AdapterConfig::default()).is_ok());
            assert!(CryptoAdapter::is_initialized());
        });
    }

    #[test]
    fn wrong_key_kind_is_rejected() {
        with_adapter(|| {
            let key = CryptoAdapter::generate_key(KeyKind::Kem, 0).unwrap();
            assert!(CryptoAdapter::sign_message(&key, b"hi").is_err());
        });
    }

    #[test]
    fn expired_key_refuses_to_sign() {
        // Scenario S5 (ttl shortened to avoid a real sleep in tests)
        with_adapter(|| {
            let mut key = CryptoAdapter::generate_key(KeyKind::Signature, 1).unwrap();
            key.expires_at = now_unix().saturating_sub(1);
            assert_eq!(
                CryptoAdapter::sign_message(&key, b"hello").unwrap_err(),
                CoreError::Expired
            );
        });
    }

    #[test]
    fn free_key_zero_wipes_symmetric_material() {
        with_adapter(|| {
            let mut key = CryptoAdapter::generate_key(KeyKind::Symmetric, 0).unwrap();
            CryptoAdapter::free_key(&mut key);
            assert_eq!(key.state(), KeyState::Wiped);
            match &key.material {
                CryptoKeyMaterial::Symmetric(bytes) => assert!(bytes.iter().all(|&b| b == 0)),
                _ => panic!("unexpected material"),
            }
            assert_eq!(key.id, [0u8; 16]);
        });
    }

    #[test]
    fn signed_zkproof_round_trip() {
        // Scenario S4
        with_adapter(|| {
            let key = CryptoAdapter::generate_key(KeyKind::Signature, 0).unwrap();
            let proof = CryptoAdapter::generate_zkproof(b"s3cret", b"pub", &key).unwrap();
            let params = VerifyParams::default();
            assert!(CryptoAdapter::verify_zkproof(&proof, b"pub", &key, &params)
                .unwrap()
                .is_accepted());
            assert!(!CryptoAdapter::verify_zkproof(&proof, b"pub-tampered", &key, &params)
                .unwrap()
                .is_accepted());
        });
    }

    #[test]
    fn kem_round_trip_through_adapter() {
        with_adapter(|| {
            let key = CryptoAdapter::generate_key(KeyKind::Kem, 0).unwrap();
            let (ct, ss1) = CryptoAdapter::establish_key(&key).unwrap();
            let ss2 = CryptoAdapter::receive_key(&key, &ct).unwrap();
            assert_eq!(ss1.0, ss2.0);
        });
    }
}
