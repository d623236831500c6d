//! Deterministic geometry for vision corruption recipes.
//!
//! The suite never touches pixels; vision-corrupt records carry a
//! `path|type|s{N}` recipe payload in their metadata instead. These helpers
//! give any downstream materializer the same numbers for the same payload:
//! the severity area schedule, a stable seed derived from the payload, and
//! the occlusion rectangle that seed places.

use rand::Rng;
use sha1::{Digest, Sha1};

use crate::constants::vision::{
    AREA_FRACTION_S1, AREA_FRACTION_S2, AREA_FRACTION_S3, MAX_AREA_FRACTION, MIN_AREA_FRACTION,
    SEED_HEX_CHARS,
};
use crate::rng::DeterministicRng;

/// Fraction of the image area an occlusion at this severity covers.
///
/// Severities above 3 saturate at the severity-3 fraction; severity 0 and
/// other unexpected values fall back to the severity-1 fraction.
pub fn severity_area_fraction(severity: u32) -> f64 {
    match severity {
        1 => AREA_FRACTION_S1,
        2 => AREA_FRACTION_S2,
        3 => AREA_FRACTION_S3,
        s if s > 3 => AREA_FRACTION_S3,
        _ => AREA_FRACTION_S1,
    }
}

/// Stable u64 seed for a recipe payload: the first 8 hex characters of
/// SHA-1 over the key, parsed as an integer.
pub fn seed_from_key(key: &str) -> u64 {
    let digest = hex::encode(Sha1::digest(key.as_bytes()));
    u32::from_str_radix(&digest[..SEED_HEX_CHARS], 16)
        .map(u64::from)
        .unwrap_or(0)
}

/// Place the occlusion rectangle for an image of the given size.
///
/// The box is square-scaled from the severity area fraction, clamped inside
/// the image, and positioned uniformly by a seed derived from `seed_key`.
/// Returns `(x0, y0, x1, y1)` with exclusive right and bottom edges.
pub fn occlusion_box(
    width: u32,
    height: u32,
    severity: u32,
    seed_key: &str,
) -> (u32, u32, u32, u32) {
    let fraction = severity_area_fraction(severity).clamp(MIN_AREA_FRACTION, MAX_AREA_FRACTION);
    let side_scale = fraction.sqrt();

    let box_width = ((width as f64 * side_scale) as u32).min(width).max(1);
    let box_height = ((height as f64 * side_scale) as u32).min(height).max(1);

    let mut rng = DeterministicRng::new(seed_from_key(seed_key));
    let x0 = rng.random_range(0..=width.saturating_sub(box_width));
    let y0 = rng.random_range(0..=height.saturating_sub(box_height));

    (x0, y0, x0 + box_width, y0 + box_height)
}
