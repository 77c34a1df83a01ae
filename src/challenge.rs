//! Challenge nonce generation and solving
//!
//! The solver must reproduce the on-chain `compute_challenge_hash` byte for byte.
//! All arithmetic wraps mod 256, and the diffusion rounds mutate the buffer in
//! place in ascending index order: `prev` has already been updated this round while
//! `next` still holds the previous round's value. That read/write interleaving is
//! part of the protocol.

use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;

use crate::error::ProofError;

/// Size of nonces, fingerprint hashes and challenge responses
pub const CHALLENGE_LEN: usize = 32;

/// Number of in-place diffusion rounds
const DIFFUSION_ROUNDS: u8 = 4;

/// Generate a fresh challenge nonce from the OS CSPRNG
pub fn generate_challenge_nonce() -> [u8; CHALLENGE_LEN] {
    let mut nonce = [0u8; CHALLENGE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Solve a challenge from caller-supplied buffers
///
/// Fails with `InvalidLength` unless both inputs are exactly 32 bytes.
pub fn solve_challenge(nonce: &[u8], fingerprint_hash: &[u8]) -> Result<[u8; CHALLENGE_LEN], ProofError> {
    let nonce = as_block("nonce", nonce)?;
    let fingerprint_hash = as_block("fingerprint hash", fingerprint_hash)?;
    Ok(compute_challenge_hash(nonce, fingerprint_hash))
}

/// Check a challenge response against the expected solution in constant time
pub fn verify_challenge_response(
    nonce: &[u8],
    fingerprint_hash: &[u8],
    response: &[u8],
) -> Result<bool, ProofError> {
    let expected = solve_challenge(nonce, fingerprint_hash)?;
    let response = as_block("challenge response", response)?;
    Ok(bool::from(expected[..].ct_eq(&response[..])))
}

/// Deterministic mixing of a nonce with a fingerprint hash
pub fn compute_challenge_hash(
    nonce: &[u8; CHALLENGE_LEN],
    fingerprint_hash: &[u8; CHALLENGE_LEN],
) -> [u8; CHALLENGE_LEN] {
    let mut result = [0u8; CHALLENGE_LEN];
    for i in 0..CHALLENGE_LEN {
        result[i] = nonce[i] ^ fingerprint_hash[i];
        result[i] = result[i].wrapping_add(nonce[(i + 7) % CHALLENGE_LEN]);
        result[i] ^= fingerprint_hash[(i + 13) % CHALLENGE_LEN];
    }

    for round in 0..DIFFUSION_ROUNDS {
        for i in 0..CHALLENGE_LEN {
            let prev = result[(i + CHALLENGE_LEN - 1) % CHALLENGE_LEN];
            let next = result[(i + 1) % CHALLENGE_LEN];
            result[i] = result[i]
                .wrapping_add(prev.wrapping_mul(next))
                .wrapping_add(round);
        }
    }

    result
}

fn as_block<'a>(field: &'static str, bytes: &'a [u8]) -> Result<&'a [u8; CHALLENGE_LEN], ProofError> {
    bytes
        .try_into()
        .map_err(|_| ProofError::invalid_length(field, CHALLENGE_LEN, bytes.len()))
}
