//! Scalar statistics and numeric token parsing.

/// Sample standard deviation (n - 1 denominator).
///
/// Returns `None` for fewer than two values; callers leave their cached
/// deviation unchanged in that case rather than treating it as zero
/// spread.
pub fn sample_std_dev(values: &[i64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1.0);
    Some(variance.sqrt())
}

/// True when the token, after trimming ASCII whitespace, is a non-empty
/// run of ASCII digits.
///
/// Notably excludes signs, so the `-1` redirect sentinels never count
/// as integers.
pub fn is_integer(token: &[u8]) -> bool {
    let trimmed = trim_ascii(token);
    !trimmed.is_empty() && trimmed.iter().all(u8::is_ascii_digit)
}

/// Parse a trimmed all-digit token as `i64`.
///
/// Returns `None` when the token is not an integer per [`is_integer`]
/// or does not fit in an `i64`.
pub fn parse_integer(token: &[u8]) -> Option<i64> {
    if !is_integer(token) {
        return None;
    }
    std::str::from_utf8(trim_ascii(token)).ok()?.parse().ok()
}

fn trim_ascii(token: &[u8]) -> &[u8] {
    let start = token
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(token.len());
    let end = token
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &token[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_dev_matches_hand_computation() {
        // mean 11.5, variance 5/3
        let sd = sample_std_dev(&[10, 12, 11, 13]).unwrap();
        assert!((sd - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn std_dev_needs_two_values() {
        assert!(sample_std_dev(&[]).is_none());
        assert!(sample_std_dev(&[42]).is_none());
        assert_eq!(sample_std_dev(&[5, 5]), Some(0.0));
    }

    #[test]
    fn integer_detection() {
        assert!(is_integer(b"123"));
        assert!(is_integer(b"  42\t"));
        assert!(!is_integer(b""));
        assert!(!is_integer(b"   "));
        assert!(!is_integer(b"-1"));
        assert!(!is_integer(b"12a"));
        assert!(!is_integer(b"1 2"));
    }

    #[test]
    fn integer_parsing() {
        assert_eq!(parse_integer(b" 250 "), Some(250));
        assert_eq!(parse_integer(b"abc"), None);
        // 20 digits overflows i64
        assert_eq!(parse_integer(b"99999999999999999999"), None);
    }
}
