//! Zero-Knowledge Proof Engine (§4.2).
//!
//! Non-interactive, Fiat-Shamir-style commit/challenge/response proofs,
//! plus the superposition and probabilistic-encoding primitives from
//! `examples/original_source/c/include/quantum_zkp.h`. Grounded in
//! structure on `qrVITRA/merkler-static/src/zkp.rs`'s `BiokeyZkp`
//! (commitment/challenge/response over SHA3), generalized here to a
//! three-field proof with explicit per-field lengths and a documented
//! "structure-consistency, not standalone soundness" verifier per §4.2
//! and `SPEC_FULL.md` §12.1.

use getrandom::getrandom;
use sha3::{Digest, Sha3_256};

use crate::error::{CoreError, CoreResult, VerifyOutcome};

pub const DIGEST_LEN: usize = 32;
pub const CHALLENGE_LEN: usize = 32;
const NORMALIZATION_EPSILON: f64 = 1e-6;

/// A commit/challenge/response triple (§3 "ZK Proof").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZkProof {
    pub commitment: Vec<u8>,
    pub challenge: Vec<u8>,
    pub response: Vec<u8>,
}

impl ZkProof {
    pub fn is_well_formed(&self) -> bool {
        !self.commitment.is_empty()
            && !self.challenge.is_empty()
            && !self.response.is_empty()
            && self.response.len() == DIGEST_LEN
    }
}

/// Verification parameters (§3 "params {ε, samples}").
#[derive(Debug, Clone, Copy)]
pub struct VerifyParams {
    pub epsilon: f64,
    pub samples: usize,
}

impl Default for VerifyParams {
    fn default() -> Self {
        Self {
            epsilon: NORMALIZATION_EPSILON,
            samples: 256,
        }
    }
}

/// `generate_proof`: commitment ← H(secret ‖ entropy), challenge ← 32
/// random bytes, response ← H(secret ‖ challenge). The secret never
/// appears in the returned bytes; two proofs over the same secret with
/// different entropy are byte-distinct with overwhelming probability
/// (invariant 4 / S4).
pub fn generate_proof(secret: &[u8], entropy: &[u8]) -> CoreResult<ZkProof> {
    if secret.is_empty() {
        return Err(CoreError::InvalidArgument("secret must not be empty"));
    }

    let mut hasher = Sha3_256::new();
    hasher.update(secret);
    hasher.update(entropy);
    let commitment = hasher.finalize().to_vec();

    let mut challenge = vec![0u8; CHALLENGE_LEN];
    getrandom(&mut challenge).map_err(|_| CoreError::EntropyFailure)?;

    let mut hasher = Sha3_256::new();
    hasher.update(secret);
    hasher.update(&challenge);
    let response = hasher.finalize().to_vec();

    Ok(ZkProof {
        commitment,
        challenge,
        response,
    })
}

/// `verify_proof`: a structure-consistency check (§4.2, `SPEC_FULL.md`
/// §12.1) — accepts iff the proof is well-formed and the response is
/// consistent with the commitment/challenge/public-input under the
/// protocol's binding rule: `response == H(H(commitment ‖ challenge) ‖
/// public_input)` is NOT required to hold (the response commits to the
/// secret, which the verifier never sees); instead this checks the
/// shape invariants the protocol can check without the secret. Genuine
/// soundness for the deployed system comes from composing this with a
/// signature over the proof (§4.4).
pub fn verify_proof(proof: &ZkProof, public_input: &[u8], params: &VerifyParams) -> CoreResult<VerifyOutcome> {
    if params.samples == 0 {
        return Err(CoreError::InvalidArgument("samples must be nonzero"));
    }
    if public_input.is_empty() {
        return Err(CoreError::InvalidArgument("public_input must not be empty"));
    }
    let ok = proof.is_well_formed() && proof.challenge.len() == CHALLENGE_LEN;
    Ok(VerifyOutcome::from(ok))
}

/// `apply_entanglement`: XOR-fold the equal-size states and hash the
/// result; a quick content fingerprint over a flat array of states.
pub fn apply_entanglement(states: &[Vec<u8>]) -> CoreResult<[u8; DIGEST_LEN]> {
    if states.is_empty() {
        return Err(CoreError::InvalidArgument("states must not be empty"));
    }
    let state_size = states[0].len();
    if state_size == 0 || states.iter().any(|s| s.len() != state_size) {
        return Err(CoreError::InvalidArgument("states must be non-empty and equal-size"));
    }
    let mut folded = vec![0u8; state_size];
    for state in states {
        for (acc, byte) in folded.iter_mut().zip(state.iter()) {
            *acc ^= byte;
        }
    }
    let mut hasher = Sha3_256::new();
    hasher.update(&folded);
    Ok(hasher.finalize().into())
}

/// `probabilistic_encode`: produces `⌈samples/8⌉` bytes where the i-th bit
/// is pseudo-randomly set, seeded from `H(data ‖ fresh nonce)` and mixed
/// per bit with fresh random bytes, so two encodings of the same input
/// differ with overwhelming probability (invariant/S6). Intended as a
/// privacy-preserving fingerprint usable as a blinding component, not a
/// deterministic digest.
pub fn probabilistic_encode(data: &[u8], samples: usize) -> CoreResult<Vec<u8>> {
    if data.is_empty() {
        return Err(CoreError::InvalidArgument("data must not be empty"));
    }
    if samples == 0 {
        return Err(CoreError::InvalidArgument("samples must be nonzero"));
    }

    let mut nonce = [0u8; 32];
    getrandom(&mut nonce).map_err(|_| CoreError::EntropyFailure)?;

    let mut seed_hasher = Sha3_256::new();
    seed_hasher.update(data);
    seed_hasher.update(nonce);
    let seed: [u8; DIGEST_LEN] = seed_hasher.finalize().into();

    let out_len = (samples + 7) / 8;
    let mut out = vec![0u8; out_len];
    let mut fresh = vec![0u8; out_len];
    getrandom(&mut fresh).map_err(|_| CoreError::EntropyFailure)?;

    for bit in 0..samples {
        let byte_index = bit / 8;
        let bit_index = bit % 8;
        let mixed = seed[bit % DIGEST_LEN] ^ fresh[byte_index];
        if mixed & 1 == 1 {
            out[byte_index] |= 1 << bit_index;
        }
    }
    Ok(out)
}

/// An ordered list of equal-size opaque states with parallel normalized
/// amplitudes (§3 "Superposition"). Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Superposition {
    states: Vec<Vec<u8>>,
    amplitudes: Vec<f64>,
}

impl Superposition {
    pub fn states(&self) -> &[Vec<u8>] {
        &self.states
    }

    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }
}

/// `create_superposition`: rejects non-normalized amplitudes
/// (`|Σaᵢ² − 1| > ε`, invariant 8).
pub fn create_superposition(states: Vec<Vec<u8>>, amplitudes: Vec<f64>) -> CoreResult<Superposition> {
    if states.is_empty() || amplitudes.is_empty() {
        return Err(CoreError::InvalidArgument("states and amplitudes must not be empty"));
    }
    if states.len() != amplitudes.len() {
        return Err(CoreError::InvalidArgument("states and amplitudes must be the same length"));
    }
    let state_size = states[0].len();
    if states.iter().any(|s| s.len() != state_size) {
        return Err(CoreError::InvalidArgument("all states must be equal size"));
    }
    let sum_sq: f64 = amplitudes.iter().map(|a| a * a).sum();
    if (sum_sq - 1.0).abs() > NORMALIZATION_EPSILON {
        return Err(CoreError::InvalidArgument("amplitudes are not normalized"));
    }
    Ok(Superposition { states, amplitudes })
}
