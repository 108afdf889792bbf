//! Analyzer configuration.

use crate::constants::DEFAULT_BODY_LENGTH_CUTOFF;

/// Configuration options for [`crate::Analyzer`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Always compare full body content, disabling the adaptive
    /// length-only policy. Default: `false`.
    pub analyze_all: bool,

    /// Body-length cutoff for the length-only policy.
    ///
    /// When a body facet was calibrated with exactly one distinct
    /// length and that length exceeds the cutoff, comparisons check
    /// only the length; a second distinct length reverts to full
    /// content. Default: 2000.
    pub body_length_cutoff: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analyze_all: false,
            body_length_cutoff: DEFAULT_BODY_LENGTH_CUTOFF,
        }
    }
}

impl Config {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether every body is always compared in full.
    pub fn analyze_all(mut self, analyze_all: bool) -> Self {
        self.analyze_all = analyze_all;
        self
    }

    /// Set the body-length cutoff for the length-only policy.
    pub fn body_length_cutoff(mut self, cutoff: u64) -> Self {
        self.body_length_cutoff = cutoff;
        self
    }
}
