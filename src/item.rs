//! Per-position behavior learning.
//!
//! An [`Item`] watches one scalar slot of a response facet across
//! calibration samples and distills the properties that never changed:
//! the exact value, the length, non-emptiness, digit-ness, or (for
//! numeric slots) a standard-deviation band. Comparison then flags a
//! candidate value that breaks any property still held.

use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::constants::RANGE_BAND_SIGMA;
use crate::diff::{Diff, DiffKind, UnitId};
use crate::stats::{is_integer, parse_integer, sample_std_dev};

/// Classification of a slot's calibrated behavior.
///
/// `Static`, `Length` and `Anything` are mutually exclusive and ordered
/// by strength; `Integer` composes with any of them. `Range` is
/// exclusive with all structural modes: a ranged item enforces numeric
/// bounds only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mode {
    /// Exactly one distinct value was ever observed.
    Static,
    /// Values differed but all had the same length.
    Length,
    /// Values and lengths differed but none was empty.
    Anything,
    /// Every value was an all-digit token.
    Integer,
    /// Values are numeric samples bounded by `min/max ± 7 sigma`.
    Range,
}

struct ItemState {
    samples: BTreeSet<Vec<u8>>,
    modes: BTreeSet<Mode>,
    std_dev: f64,
}

/// Learns the behavior of one scalar value observed repeatedly.
///
/// Thread-safe: calibration and comparison may run concurrently; the
/// per-instance lock is held only across the state read or update.
pub struct Item {
    id: UnitId,
    state: Mutex<ItemState>,
}

impl Item {
    /// Create an empty item with no samples and no claims.
    pub fn new() -> Self {
        Self::with_samples([])
    }

    /// Create an item seeded with the token originally observed at its
    /// position.
    pub fn seeded(token: &[u8]) -> Self {
        Self::with_samples([token.to_vec()])
    }

    /// Create an item in range mode for numeric slots.
    pub fn range() -> Self {
        let item = Self::with_samples([]);
        if let Ok(mut state) = item.state.lock() {
            state.modes.insert(Mode::Range);
        }
        item
    }

    fn with_samples(samples: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            id: UnitId::next(),
            state: Mutex::new(ItemState {
                samples: samples.into_iter().collect(),
                modes: BTreeSet::new(),
                std_dev: 0.0,
            }),
        }
    }

    /// Identity carried by findings this item produces.
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Record a calibration sample and refresh the active modes.
    ///
    /// In range mode only the cached standard deviation is recomputed;
    /// samples that fail to parse leave it unchanged. Otherwise the
    /// structural modes are rederived from the full sample set.
    pub fn add(&self, value: &[u8]) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        state.samples.insert(value.to_vec());

        if state.modes.contains(&Mode::Range) {
            let parsed: Option<Vec<i64>> =
                state.samples.iter().map(|s| parse_integer(s)).collect();
            match parsed {
                Some(values) => {
                    if let Some(sd) = sample_std_dev(&values) {
                        state.std_dev = sd;
                    }
                }
                None => {
                    tracing::debug!("non-numeric sample in ranged item; deviation kept");
                }
            }
            return;
        }

        let mut modes = BTreeSet::new();
        if state.samples.len() == 1 {
            modes.insert(Mode::Static);
        } else if let Some(first) = state.samples.iter().next() {
            if state.samples.iter().all(|s| s.len() == first.len()) {
                modes.insert(Mode::Length);
            } else if state.samples.iter().all(|s| !s.is_empty()) {
                modes.insert(Mode::Anything);
            }
            // Empty sample with unequal lengths: no structural claim.
        }
        if state.samples.iter().all(|s| is_integer(s)) {
            modes.insert(Mode::Integer);
        }
        state.modes = modes;
    }

    /// Check a candidate value against every active mode.
    ///
    /// `kind` tags the findings with the alignment operation that routed
    /// the value here. An item with no active modes makes no claims and
    /// returns nothing.
    pub fn compare(&self, kind: DiffKind, value: &[u8]) -> Vec<Diff> {
        let Ok(state) = self.state.lock() else {
            return Vec::new();
        };
        let mut out = Vec::new();

        if state.modes.contains(&Mode::Range) {
            self.compare_range(&state, value, &mut out);
            return out;
        }

        if state.modes.contains(&Mode::Static) {
            if let Some(sample) = state.samples.iter().next() {
                if sample.as_slice() != value {
                    out.push(Diff::new(
                        kind,
                        self.id,
                        format!(
                            "value changed: \"{}\" != \"{}\"",
                            lossy(sample),
                            lossy(value)
                        ),
                    ));
                }
            }
        }
        if state.modes.contains(&Mode::Length) {
            if let Some(sample) = state.samples.iter().next() {
                if sample.len() != value.len() {
                    out.push(Diff::new(
                        kind,
                        self.id,
                        format!(
                            "length changed: len(\"{}\") != len(\"{}\")",
                            lossy(sample),
                            lossy(value)
                        ),
                    ));
                }
            }
        }
        if state.modes.contains(&Mode::Anything) && value.is_empty() {
            out.push(Diff::new(
                kind,
                self.id,
                "value suddenly empty".to_string(),
            ));
        }
        if state.modes.contains(&Mode::Integer) && !is_integer(value) {
            out.push(Diff::new(
                kind,
                self.id,
                format!("value no longer an integer: \"{}\"", lossy(value)),
            ));
        }
        out
    }

    fn compare_range(&self, state: &ItemState, value: &[u8], out: &mut Vec<Diff>) {
        // Non-numeric candidates are skipped, not flagged: range mode
        // enforces bounds only.
        let Some(candidate) = parse_integer(value) else {
            return;
        };
        let parsed: Option<Vec<i64>> = state.samples.iter().map(|s| parse_integer(s)).collect();
        let Some(values) = parsed else {
            // Degenerate fallback: a corrupt calibration set can never
            // produce a finding. Kept for fidelity; the warning makes
            // the data bug visible.
            tracing::warn!("ranged item has non-numeric calibration samples; skipping check");
            return;
        };
        let (Some(&min), Some(&max)) = (values.iter().min(), values.iter().max()) else {
            return;
        };
        let lower = min as f64 - RANGE_BAND_SIGMA * state.std_dev;
        let upper = max as f64 + RANGE_BAND_SIGMA * state.std_dev;
        if (candidate as f64) < lower {
            out.push(Diff::new(
                DiffKind::BelowRange,
                self.id,
                format!("value below calibrated range: {candidate} < {min}"),
            ));
        }
        if (candidate as f64) > upper {
            out.push(Diff::new(
                DiffKind::AboveRange,
                self.id,
                format!("value above calibrated range: {candidate} > {max}"),
            ));
        }
    }

    /// Number of distinct calibration samples.
    pub fn sample_count(&self) -> usize {
        self.state.lock().map(|s| s.samples.len()).unwrap_or(0)
    }

    /// The single calibration sample, when exactly one distinct value
    /// was observed.
    pub fn lone_sample(&self) -> Option<Vec<u8>> {
        let state = self.state.lock().ok()?;
        if state.samples.len() == 1 {
            state.samples.iter().next().cloned()
        } else {
            None
        }
    }

    /// Snapshot of the active modes.
    pub fn modes(&self) -> BTreeSet<Mode> {
        self.state.lock().map(|s| s.modes.clone()).unwrap_or_default()
    }
}

impl Default for Item {
    fn default() -> Self {
        Self::new()
    }
}

fn lossy(token: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(token)
}
