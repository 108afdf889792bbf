//! Shared constants for calibration and comparison.

/// Width of the accepted numeric band, in standard deviations.
///
/// A calibrated numeric value is flagged only when the candidate falls
/// below `min - RANGE_BAND_SIGMA * stdev` or above
/// `max + RANGE_BAND_SIGMA * stdev`. Seven sigmas keeps the false
/// positive rate negligible even for noisy timing data.
pub const RANGE_BAND_SIGMA: f64 = 7.0;

/// Default body-length cutoff for the length-only comparison policy.
///
/// When a body facet was calibrated with exactly one distinct length and
/// that length exceeds this cutoff, the analyzer compares only the body
/// length instead of the full content. See [`crate::Config`].
pub const DEFAULT_BODY_LENGTH_CUTOFF: u64 = 2000;

/// Returns true for bytes in the fixed token delimiter class.
///
/// Payloads are split at commas, periods, semicolons and ASCII
/// whitespace. The class is fixed: calibration and comparison must
/// tokenize identically or positional alignment would be meaningless.
#[inline]
pub fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b',' | b'.' | b';') || byte.is_ascii_whitespace()
}
