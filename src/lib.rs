//! Cryptographic verification core for a news-authenticity platform.
//!
//! Four subsystems, each a module here: [`entanglement`] (content-addressed
//! DAG with a Merkle-style root digest), [`zkp`] (commit/challenge/response
//! proofs plus superposition and probabilistic encoding), [`pq`] (a
//! Kyber-768-sized KEM and a Falcon-512-sized signature contract), and
//! [`adapter`] (the process-wide facade composing the three). [`rng`] is
//! shared infrastructure the primitive layer draws on for entropy.
//!
//! Grounded on `robertringler-Qubic`'s module layout: a `crypto/` family of
//! focused modules (`pqc`, `rng`) under one crate, each with its own error
//! type feeding into a crate-wide one.

pub mod adapter;
pub mod config;
pub mod entanglement;
pub mod error;
pub mod pq;
pub mod rng;
pub mod zkp;

pub use adapter::{CryptoAdapter, CryptoKey, CryptoKeyMaterial, KeyKind, KeyState};
pub use config::{AdapterConfig, AdapterConfigBuilder};
pub use error::{CoreError, CoreResult, VerifyOutcome};
