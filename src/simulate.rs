//! Placeholder prices for when real extraction fails.
//!
//! A simulated price is a deterministic base derived from the URL plus a
//! random fluctuation, rounded to the nearest thousand. Two calls for the
//! same URL give close but different values. The two parts are kept
//! separate so the deterministic base can be tested on its own.

use rand::Rng;

/// Lowest base price produced by [`base_price`].
pub const BASE_FLOOR: u64 = 500_000;
/// Width of the band base prices fall into, above [`BASE_FLOOR`].
pub const BASE_RANGE: u64 = 2_000_000;
/// Total width of the random fluctuation, centred on zero.
pub const FLUCTUATION_SPAN: f64 = 100_000.0;
/// Simulated prices are multiples of this.
pub const ROUNDING_STEP: f64 = 1_000.0;

/// 32-bit polynomial string hash over the URL's UTF-16 code units,
/// `hash * 31 + unit` with two's-complement wraparound.
#[must_use]
pub fn url_hash(url: &str) -> i32 {
    url.encode_utf16().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
    })
}

/// Maps a URL hash into `[BASE_FLOOR, BASE_FLOOR + BASE_RANGE)` by its magnitude.
#[must_use]
pub fn base_from_hash(hash: i32) -> u64 {
    u64::from(hash.unsigned_abs()) % BASE_RANGE + BASE_FLOOR
}

/// Deterministic base price for `url`, in `[BASE_FLOOR, BASE_FLOOR + BASE_RANGE)`.
#[must_use]
pub fn base_price(url: &str) -> u64 {
    base_from_hash(url_hash(url))
}

/// Random fluctuation in `[-FLUCTUATION_SPAN / 2, FLUCTUATION_SPAN / 2)`.
pub fn fluctuation<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (rng.random::<f64>() - 0.5) * FLUCTUATION_SPAN
}

/// Rounds `base + fluctuation` to the nearest [`ROUNDING_STEP`].
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn apply_fluctuation(base: u64, fluctuation: f64) -> u64 {
    let raw = base as f64 + fluctuation;
    ((raw / ROUNDING_STEP).round() * ROUNDING_STEP).max(0.0) as u64
}

/// Simulated price for `url` drawing the fluctuation from `rng`.
pub fn simulate_price_with<R: Rng + ?Sized>(url: &str, rng: &mut R) -> u64 {
    apply_fluctuation(base_price(url), fluctuation(rng))
}

/// Simulated price for `url` using the thread-local RNG.
#[must_use]
pub fn simulate_price(url: &str) -> u64 {
    simulate_price_with(url, &mut rand::rng())
}
