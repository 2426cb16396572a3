//! Provably-fair crash-outcome generator.
//!
//! Deterministically derives a sequence of `bust` multipliers from a seed
//! hash using an HMAC-SHA256 chain: the salt is the HMAC key, the seed is
//! the message, and the next seed is the SHA256 of the ASCII hex of the
//! current one. Identical `seed` + `num_games` always produce the same
//! sequence — this is the only source of randomness in the simulator path
//! (everything downstream of a `GameSet` is deterministic).

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, CoreResult};

type HmacSha256 = Hmac<Sha256>;

/// 64 hex characters, HMAC-keyed against every seed in the chain.
pub const SALT_HEX: &str =
    "0000000000000000004d6ec16dafe9d8370958664c1dc422f452892264c59526";

/// Number of leading hex characters of the HMAC digest used to derive the
/// bust multiplier (52 bits, i.e. 13 hex chars).
const BUST_HEX_DIGITS: usize = 13;

/// A single completed round outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub id: u64,
    /// The 64-hex-char seed that produced this round (the hash named in
    /// the data model; kept as `hash` to match the wire field name).
    pub hash: String,
    /// The crash/bust multiplier, already rounded to 2 decimals.
    pub bust: f64,
}

/// Round a multiplier to 2 decimal places.
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Derive the bust multiplier for one HMAC digest.
///
/// `bust = max(1, floor(100 / (1 - h/2^52)) / 101)`, where `h` is the
/// integer value of the first 13 hex characters (52 bits) of the digest.
fn bust_from_digest(digest: &[u8]) -> CoreResult<f64> {
    let hex_digest = hex::encode(digest);
    let prefix = hex_digest
        .get(0..BUST_HEX_DIGITS)
        .ok_or_else(|| CoreError::InvalidSeed("digest too short".to_string()))?;
    let h = u64::from_str_radix(prefix, 16)
        .map_err(|e| CoreError::InvalidSeed(format!("bad digest prefix: {e}")))?;
    let denom = 1.0 - (h as f64) / (1u64 << 52) as f64;
    let raw = (100.0 / denom).floor() / 101.0;
    Ok(round2(raw.max(1.0)))
}

fn hmac_digest(seed_bytes: &[u8]) -> CoreResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(SALT_HEX.as_bytes())
        .map_err(|e| CoreError::InvalidSeed(format!("bad salt key: {e}")))?;
    mac.update(seed_bytes);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Advance the hash chain: `next_seed = SHA256_hex(seed_as_ascii)`.
fn next_seed(seed_hex: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed_hex.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate `num_games` rounds from a 32-byte hex `seed`.
///
/// For each round in sequence: HMAC the current seed against the fixed
/// salt, derive `bust` from the top 52 bits of the digest, emit
/// `Round { i+1, seed, bust }`, then advance the seed. The returned
/// sequence is reversed (newest first) to match how the simulator
/// consumes it.
pub fn generate_games(seed: &str, num_games: usize) -> CoreResult<Vec<Round>> {
    let mut rounds = Vec::with_capacity(num_games);
    let mut current_seed = seed.to_string();

    for i in 0..num_games {
        let seed_bytes = hex::decode(&current_seed)
            .map_err(|e| CoreError::InvalidSeed(format!("seed is not valid hex: {e}")))?;
        let digest = hmac_digest(&seed_bytes)?;
        let bust = bust_from_digest(&digest)?;
        log::trace!("round {} seed={} bust={:.2}", i + 1, current_seed, bust);
        rounds.push(Round {
            id: (i + 1) as u64,
            hash: current_seed.clone(),
            bust,
        });
        current_seed = next_seed(&current_seed);
    }

    rounds.reverse();
    Ok(rounds)
}
