//! Cross-layer scenarios through the public API: mixed parameter sets,
//! transparent tree replacement and the signing-budget arithmetic.

use rand::rngs::StdRng;
use rand::SeedableRng;

use hsslms::{hss, Error, LmotsAlgorithm, LmsAlgorithm};

const H5: LmsAlgorithm = LmsAlgorithm::LmsSha256M32H5;
const W2: LmotsAlgorithm = LmotsAlgorithm::LmotsSha256N32W2;

#[test]
fn mixed_heights_sign_and_verify() {
    let mut rng = StdRng::seed_from_u64(71);
    let mut sk = hss::PrivateKey::generate(
        &[H5, LmsAlgorithm::LmsSha256M32H10],
        W2,
        &mut rng,
        None,
    )
    .unwrap();
    let vk = sk.public_key();

    for msg in [b"alpha".as_slice(), b"beta", b""] {
        let sig = sk.sign(msg, &mut rng).unwrap();
        vk.verify(msg, &sig).unwrap();
    }
}

#[test]
fn truncated_hash_parameter_sets() {
    let mut rng = StdRng::seed_from_u64(73);
    let mut sk = hss::PrivateKey::generate(
        &[LmsAlgorithm::LmsSha256M24H5],
        LmotsAlgorithm::LmotsSha256N24W4,
        &mut rng,
        None,
    )
    .unwrap();
    let vk = sk.public_key();
    let sig = sk.sign(b"short hashes", &mut rng).unwrap();
    vk.verify(b"short hashes", &sig).unwrap();
    assert!(matches!(vk.verify(b"long hashes", &sig), Err(Error::Invalid)));

    // m = 24: the serialized public key is 4 + 24 + 24 bytes.
    assert_eq!(vk.to_bytes().len(), 52);
}

#[test]
fn three_levels_survive_repeated_rebuilds() {
    let mut rng = StdRng::seed_from_u64(79);
    let mut sk = hss::PrivateKey::generate(&[H5, H5, H5], W2, &mut rng, None).unwrap();
    let vk = sk.public_key();

    // 40 signatures force at least one leaf-tree replacement (the level-2
    // tree holds 32); every signature verifies against the fixed root key.
    for i in 0..40u32 {
        let msg = i.to_be_bytes();
        let sig = sk.sign(&msg, &mut rng).unwrap();
        vk.verify(&msg, &sig).unwrap();
    }
}

#[test]
fn signing_budget_is_the_product_of_level_remainders() {
    let mut rng = StdRng::seed_from_u64(83);
    let mut sk = hss::PrivateKey::generate(&[H5, H5], W2, &mut rng, None).unwrap();

    // 31 * 32: the setup signature already consumed one root leaf.
    assert_eq!(sk.available_signatures(), 31 * 32);
    sk.sign(b"one", &mut rng).unwrap();
    assert_eq!(sk.available_signatures(), 31 * 31);

    let mut single = hss::PrivateKey::generate(&[H5], W2, &mut rng, None).unwrap();
    assert_eq!(single.available_signatures(), 32);
    single.sign(b"one", &mut rng).unwrap();
    assert_eq!(single.available_signatures(), 31);
}

#[test]
fn public_key_emit_parse_is_identity() {
    let mut rng = StdRng::seed_from_u64(89);
    let sk = hss::PrivateKey::generate(&[H5], W2, &mut rng, None).unwrap();
    let bytes = sk.public_key().to_bytes();
    let parsed = hss::PublicKey::from_bytes(&bytes).unwrap();
    assert_eq!(parsed.to_bytes(), bytes);
}
