//! Black-box end-to-end scenarios against the public API, named after the
//! acceptance scenarios this core is built to satisfy.

use veritas_crypto_core::adapter::{CryptoAdapter, KeyKind};
use veritas_crypto_core::config::AdapterConfig;
use veritas_crypto_core::entanglement::{EntanglementGraph, EntanglementStore};
use veritas_crypto_core::pq::kem;
use veritas_crypto_core::pq::signature;
use veritas_crypto_core::zkp::VerifyParams;
use veritas_crypto_core::CoreError;

fn init_adapter() {
    CryptoAdapter::cleanup();
    CryptoAdapter::init(AdapterConfig::default()).unwrap();
}

#[test]
fn s1_tamper_detection() {
    let mut store = EntanglementStore::new();
    let n1 = store.create_node(b"head".to_vec());
    let n2 = store.create_node(b"body".to_vec());
    let n3 = store.create_node(b"src".to_vec());
    let n4 = store.create_node(b"auth".to_vec());
    store.add_dependency(n2, n1).unwrap();
    store.add_dependency(n3, n2).unwrap();
    store.add_dependency(n4, n3).unwrap();
    store.add_dependency(n4, n1).unwrap();

    let mut graph = EntanglementGraph::new(vec![n1, n2, n3, n4]).unwrap();
    let root1 = graph.compute_root_digest(&mut store).unwrap();
    assert!(graph.verify_graph(&store).unwrap().is_accepted());

    let mut tampered_store = EntanglementStore::new();
    let t1 = tampered_store.create_node(b"Head".to_vec());
    let t2 = tampered_store.create_node(b"body".to_vec());
    let t3 = tampered_store.create_node(b"src".to_vec());
    let t4 = tampered_store.create_node(b"auth".to_vec());
    tampered_store.add_dependency(t2, t1).unwrap();
    tampered_store.add_dependency(t3, t2).unwrap();
    tampered_store.add_dependency(t4, t3).unwrap();
    tampered_store.add_dependency(t4, t1).unwrap();
    let mut tampered_graph = EntanglementGraph::new(vec![t1, t2, t3, t4]).unwrap();
    let root2 = tampered_graph.compute_root_digest(&mut tampered_store).unwrap();

    assert_ne!(root1, root2);
    assert!(!graph.verify_graph(&store).unwrap().is_accepted());
}

#[test]
fn s2_kem_round_trip() {
    let (pk, sk) = kem::keygen().unwrap();
    let (ciphertext, ss1) = kem::encapsulate(&pk).unwrap();
    let ss2 = kem::decapsulate(&ciphertext, &sk).unwrap();
    assert_eq!(ss1.0, ss2.0);
}

#[test]
fn s3_signature_rejects_bit_flip() {
    let (pk, sk) = signature::keygen().unwrap();
    let mut message = b"hello world".to_vec();
    let sig = signature::sign(&message, &sk).unwrap();
    assert!(signature::verify(&sig, &message, &pk).unwrap());

    message[3] ^= 0x01;
    assert!(!signature::verify(&sig, &message, &pk).unwrap());
}

#[test]
fn s4_signed_zk_proof() {
    init_adapter();
    let key = CryptoAdapter::generate_key(KeyKind::Signature, 0).unwrap();
    let proof = CryptoAdapter::generate_zkproof(b"s3cret", b"pub", &key).unwrap();
    let params = VerifyParams::default();

    assert!(CryptoAdapter::verify_zkproof(&proof, b"pub", &key, &params)
        .unwrap()
        .is_accepted());
    assert!(!CryptoAdapter::verify_zkproof(&proof, b"pub-tampered", &key, &params)
        .unwrap()
        .is_accepted());
    CryptoAdapter::cleanup();
}

#[test]
fn s5_expired_key_refuses_to_sign() {
    init_adapter();
    let key = CryptoAdapter::generate_key(KeyKind::Signature, 1).unwrap();
    std::thread::sleep(std::time::Duration::from_secs(2));
    let result = CryptoAdapter::sign_message(&key, b"hello world");
    assert_eq!(result.unwrap_err(), CoreError::Expired);
    CryptoAdapter::cleanup();
}

#[test]
fn s6_probabilistic_encoding_nondeterminism() {
    use veritas_crypto_core::zkp::probabilistic_encode;

    let a = probabilistic_encode(b"data", 1024).unwrap();
    let b = probabilistic_encode(b"data", 1024).unwrap();
    let hamming: u32 = a.iter().zip(&b).map(|(x, y)| (x ^ y).count_ones()).sum();
    assert!(hamming > 100, "hamming distance was {hamming}");
}
