//! Randomization helpers
//!
//! Jitter for scheduling, decoy forwarding addresses for RPC requests and the
//! fractional tail added to sell amounts.

use chrono::Duration;
use rand::Rng;

/// Uniform integer in `min..=max`. Swapped bounds are tolerated.
pub fn random_between<R: Rng + ?Sized>(rng: &mut R, min: u64, max: u64) -> u64 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    rng.gen_range(low..=high)
}

/// Random delay in `min_ms..=max_ms`
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, min_ms: u64, max_ms: u64) -> Duration {
    let ms = random_between(rng, min_ms, max_ms);
    Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}

/// Dotted-quad address with a first octet in 100..=255
pub fn decoy_ip<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}.{}.{}.{}",
        random_between(rng, 100, 255),
        random_between(rng, 0, 255),
        random_between(rng, 0, 255),
        random_between(rng, 0, 255)
    )
}

/// Four random decimal digits, used as the fractional part of a sell amount
pub fn fraction_digits<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:04}", random_between(rng, 0, 9999))
}
