//! # respdiff
//!
//! Detect behavioral differences between HTTP responses relative to a
//! learned baseline.
//!
//! Security-testing and fuzzing tools need to tell "normal response
//! variance" apart from anomalies caused by an injected probe. This
//! crate provides the calibration/diff engine for that: it learns, per
//! response facet (status, reason, headers, body, body length, elapsed
//! time, error text, and the pre-redirect mirror of each), how the
//! endpoint normally behaves, then classifies candidate responses and
//! emits deduplicatable [`Diff`] findings.
//!
//! The engine only consumes response-like values; sending requests,
//! scheduling probes and reporting findings belong to the caller.
//!
//! ## Quick Start
//!
//! ```
//! use respdiff::{Analyzer, Observation, Response};
//!
//! let analyzer = Analyzer::new();
//! let baseline = Response::new(200, "OK").body("hello user 1001");
//!
//! // Calibration: teach the analyzer what normal looks like.
//! analyzer.calibrate(&Observation::of(&baseline, "120"));
//! let variant = Response::new(200, "OK").body("hello user 1002");
//! analyzer.calibrate(&Observation::of(&variant, "124"));
//!
//! // Testing: compare a probed response against the baseline.
//! let probed = Response::new(500, "Internal Server Error").body("oops");
//! let findings: Vec<_> = analyzer
//!     .compare(&Observation::of(&probed, "122").payload("' OR 1=1--"))
//!     .collect();
//! assert!(!findings.is_empty());
//! ```
//!
//! ## Concurrency
//!
//! One [`Analyzer`] may be shared across threads; calibration and
//! comparison run concurrently. Facets are independent and locked
//! individually, so consistency is per facet and converges over many
//! samples.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod analyzer;
mod blob;
mod config;
mod constants;
mod diff;
mod extension;
mod item;
mod response;
mod response_time;

// Structural and statistical machinery, useful on its own
pub mod align;
pub mod stats;

// Re-exports for public API
pub use analyzer::Analyzer;
pub use blob::{Blob, Payload};
pub use config::Config;
pub use constants::{DEFAULT_BODY_LENGTH_CUTOFF, RANGE_BAND_SIGMA};
pub use diff::{Diff, DiffKind, UnitId};
pub use extension::{Extension, ExtensionError, NoopExtension};
pub use item::{Item, Mode};
pub use response::{Observation, Response};
pub use response_time::ResponseTimeBlob;
