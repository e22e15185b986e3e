//! Expiration policy shared by the request layer and the reaper.

/// Shortest lifetime a submitted item may request (1 day).
pub const MIN_EXPIRATION_SECS: u64 = 24 * 60 * 60;

/// Longest lifetime a submitted item may request (28 days).
pub const MAX_EXPIRATION_SECS: u64 = 28 * MIN_EXPIRATION_SECS;

/// Clamps a caller-supplied expiration into `[MIN_EXPIRATION_SECS, MAX_EXPIRATION_SECS]`.
///
/// Values `<= 0` become exactly one day.
pub fn sanitize_expiration(requested: i64) -> u64 {
    if requested <= 0 {
        return MIN_EXPIRATION_SECS;
    }
    (requested as u64).clamp(MIN_EXPIRATION_SECS, MAX_EXPIRATION_SECS)
}
