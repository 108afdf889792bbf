//! Numeric-range specialization for timing samples.

use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::constants::RANGE_BAND_SIGMA;
use crate::diff::{Diff, DiffKind, UnitId};
use crate::stats::{is_integer, parse_integer, sample_std_dev};

struct TimeState {
    samples: BTreeSet<String>,
    std_dev: f64,
}

/// Learns the envelope of response times; no tokenization.
///
/// Every payload is one scalar sample. Unlike a ranged [`crate::Item`],
/// a non-numeric *candidate* here is itself a finding: elapsed time is
/// produced by the caller's clock and must always parse.
pub struct ResponseTimeBlob {
    id: UnitId,
    state: Mutex<TimeState>,
}

impl ResponseTimeBlob {
    /// Create an empty timing facet.
    pub fn new() -> Self {
        Self {
            id: UnitId::next(),
            state: Mutex::new(TimeState {
                samples: BTreeSet::new(),
                std_dev: 0.0,
            }),
        }
    }

    /// Identity carried by findings this facet produces.
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Record a calibration sample and refresh the cached deviation.
    ///
    /// Non-numeric samples are stored but leave the deviation unchanged.
    pub fn add(&self, value: &str) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.samples.insert(value.to_string());
        let parsed: Option<Vec<i64>> = state
            .samples
            .iter()
            .map(|s| parse_integer(s.as_bytes()))
            .collect();
        match parsed {
            Some(values) => {
                if let Some(sd) = sample_std_dev(&values) {
                    state.std_dev = sd;
                }
            }
            None => {
                tracing::debug!("non-numeric response time sample; deviation kept");
            }
        }
    }

    /// Compare a candidate elapsed time against the calibrated band.
    pub fn compare(&self, value: &str) -> Vec<Diff> {
        if !is_integer(value.as_bytes()) {
            return vec![Diff::new(
                DiffKind::ExpectedInteger,
                self.id,
                format!("response time is expected to be an integer: \"{value}\""),
            )];
        }
        let Ok(state) = self.state.lock() else {
            return Vec::new();
        };
        let parsed: Option<Vec<i64>> = state
            .samples
            .iter()
            .map(|s| parse_integer(s.as_bytes()))
            .collect();
        let Some(values) = parsed else {
            tracing::warn!("non-numeric response time calibration samples; skipping check");
            return Vec::new();
        };
        let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
            return Vec::new();
        };
        let Some(candidate) = parse_integer(value.as_bytes()) else {
            return Vec::new();
        };
        let lower = min as f64 - RANGE_BAND_SIGMA * state.std_dev;
        let upper = max as f64 + RANGE_BAND_SIGMA * state.std_dev;
        let mut out = Vec::new();
        if (candidate as f64) < lower {
            out.push(Diff::new(
                DiffKind::BelowRange,
                self.id,
                format!("response time below calibrated range: {candidate} < {min}"),
            ));
        }
        if (candidate as f64) > upper {
            out.push(Diff::new(
                DiffKind::AboveRange,
                self.id,
                format!("response time above calibrated range: {candidate} > {max}"),
            ));
        }
        out
    }
}

impl Default for ResponseTimeBlob {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_numeric_candidate_always_flagged() {
        let blob = ResponseTimeBlob::new();
        let diffs = blob.compare("fast");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::ExpectedInteger);

        // Regardless of calibration history.
        blob.add("100");
        blob.add("110");
        let diffs = blob.compare("n/a");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].kind, DiffKind::ExpectedInteger);
    }

    #[test]
    fn band_directions() {
        let blob = ResponseTimeBlob::new();
        for v in ["100", "104", "102", "106"] {
            blob.add(v);
        }
        assert!(blob.compare("103").is_empty());
        assert!(blob.compare("101").is_empty());

        let low = blob.compare("1");
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].kind, DiffKind::BelowRange);

        let high = blob.compare("500");
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].kind, DiffKind::AboveRange);
    }

    #[test]
    fn single_sample_band_is_tight() {
        let blob = ResponseTimeBlob::new();
        blob.add("100");
        // One sample: deviation stays 0, band collapses to [100, 100].
        assert!(blob.compare("100").is_empty());
        assert_eq!(blob.compare("99").len(), 1);
        assert_eq!(blob.compare("101").len(), 1);
    }

    #[test]
    fn uncalibrated_numeric_candidate_passes() {
        let blob = ResponseTimeBlob::new();
        assert!(blob.compare("123").is_empty());
    }
}
