//! Idempotency token generation
//!
//! One token per logical submission attempt, attached to the payload and
//! reused byte-identical across every retry of that attempt. Uniqueness is
//! the only load-bearing property; unpredictability is not.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shortest token accepted by `is_valid_token`
pub const MIN_TOKEN_LEN: usize = 8;
/// Longest token accepted by `is_valid_token`
pub const MAX_TOKEN_LEN: usize = 64;

/// Generate a new idempotency token (hyphenated UUID v4)
///
/// Prefers OS entropy. If the strong source is unavailable the token is
/// built from a time-seeded PRNG instead - a deliberate degraded mode, not
/// a silent correctness bypass, since only uniqueness matters here.
pub fn new_token() -> String {
    let mut bytes = [0u8; 16];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string(),
        Err(e) => {
            tracing::warn!("OS entropy unavailable ({e}), using degraded token source");
            fallback_token()
        }
    }
}

/// Degraded-mode token: same UUID-v4 shape, weaker randomness
///
/// Seeded from wall clock plus a process-local counter so two calls in the
/// same millisecond still diverge.
fn fallback_token() -> String {
    use rand::{Rng, SeedableRng};

    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seed = (shared::util::now_millis() as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    uuid::Builder::from_random_bytes(bytes)
        .into_uuid()
        .hyphenated()
        .to_string()
}

/// Shape check only: non-blank and within length bounds.
/// Does not (and cannot) check uniqueness.
pub fn is_valid_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.len() >= MIN_TOKEN_LEN && trimmed.len() <= MAX_TOKEN_LEN
}
