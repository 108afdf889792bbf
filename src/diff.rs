//! Finding records emitted by comparison.
//!
//! A [`Diff`] ties a kind tag to the unit (Item or Blob) that produced
//! it. Equality deliberately ignores the human-readable message: two
//! findings are the same finding when the same unit reported the same
//! kind of deviation, which is the dedup key downstream consumers use
//! to recognize a difference recurring across probes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque identity of the unit that produced a finding.
///
/// Allocated once per `Item`/`Blob`/`ResponseTimeBlob` and carried by
/// every [`Diff`] the unit emits. A `UnitId` is a back-reference, not
/// ownership: it is only ever compared against other ids from the same
/// analyzer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(u64);

impl UnitId {
    /// Allocate a fresh id from the process-wide counter.
    pub(crate) fn next() -> Self {
        Self(NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Tag identifying the operation and direction of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffKind {
    /// A calibrated-variable position held a value that violates its
    /// learned behavior.
    Replaced,
    /// A calibrated-variable position lost its value entirely.
    Deleted,
    /// A learned insertion anchor received a token that violates its
    /// learned behavior.
    Inserted,
    /// A position that never varied during calibration was replaced.
    NovelReplaced,
    /// A position that never varied during calibration vanished.
    NovelDeleted,
    /// Tokens appeared at an anchor that never saw insertions during
    /// calibration.
    NovelInserted,
    /// A numeric value fell below the calibrated band.
    BelowRange,
    /// A numeric value rose above the calibrated band. Distinct from
    /// [`DiffKind::BelowRange`] so the two directions are never
    /// conflated under deduplication.
    AboveRange,
    /// A value that must be numeric was not.
    ExpectedInteger,
}

/// One behavioral difference between a candidate response and the
/// calibrated baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diff {
    /// Operation-and-direction tag.
    pub kind: DiffKind,
    /// Back-reference to the unit that produced the finding.
    pub unit: UnitId,
    /// Human-readable description. Excluded from equality and hashing.
    pub message: String,
}

impl Diff {
    /// Create a finding.
    pub fn new(kind: DiffKind, unit: UnitId, message: impl Into<String>) -> Self {
        Self {
            kind,
            unit,
            message: message.into(),
        }
    }
}

impl PartialEq for Diff {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.unit == other.unit
    }
}

impl Eq for Diff {}

impl Hash for Diff {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.unit.hash(state);
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
