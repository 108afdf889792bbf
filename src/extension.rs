//! User-injected extension hooks.
//!
//! An [`Extension`] contributes additional signal during calibration and
//! comparison: reflection checks, application-specific markers, and so
//! on. Hooks run before the built-in facets and their failures are
//! swallowed at the call site; a broken extension never blocks or
//! aborts the built-in analysis.

use crate::diff::Diff;
use crate::response::Observation;

/// Error type returned by extension hooks.
///
/// Whatever the extension raises is logged and discarded.
pub type ExtensionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Additional-signal hooks invoked ahead of the built-in facets.
///
/// Both methods default to no-ops, so an extension only implements the
/// side it cares about.
pub trait Extension: Send + Sync {
    /// Observe a calibration sample.
    fn calibrate(&self, observation: &Observation<'_>) -> Result<(), ExtensionError> {
        let _ = observation;
        Ok(())
    }

    /// Contribute findings for a candidate observation.
    fn compare(&self, observation: &Observation<'_>) -> Result<Vec<Diff>, ExtensionError> {
        let _ = observation;
        Ok(Vec::new())
    }
}

/// The default extension: contributes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopExtension;

impl Extension for NoopExtension {}
