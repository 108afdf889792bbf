//! Facet orchestration over full HTTP responses.
//!
//! The [`Analyzer`] maps a response onto per-facet learning units: a
//! [`Blob`] each for status, reason, headers, body and error text, an
//! [`Item`] for the body length, a [`ResponseTimeBlob`] for elapsed
//! time, and a mirrored set for the pre-redirect response. Calibration
//! feeds every facet; comparison walks them lazily and yields findings
//! as they are produced.
//!
//! Facets are independent: no lock spans more than one unit, so
//! concurrent calibration and comparison interleave per facet and
//! converge over many samples rather than being point-in-time
//! consistent.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::blob::{Blob, Payload};
use crate::config::Config;
use crate::diff::{Diff, DiffKind};
use crate::extension::{Extension, NoopExtension};
use crate::item::Item;
use crate::response::Observation;
use crate::response_time::ResponseTimeBlob;

/// Sentinel status fed to the redirect facets when no redirect
/// occurred, so "suddenly redirects" surfaces as an ordinary finding.
const NO_REDIRECT_STATUS: &str = "-1";
/// Sentinel body length for the no-redirect case.
const NO_REDIRECT_LENGTH: &str = "-1";

struct BodyFacet {
    content: Blob,
    length: Item,
    length_only: AtomicBool,
    label: &'static str,
}

impl BodyFacet {
    fn new(label: &'static str) -> Self {
        Self {
            content: Blob::new(),
            length: Item::new(),
            length_only: AtomicBool::new(false),
            label,
        }
    }

    fn add(&self, body: &[u8]) {
        self.content.add(Payload::Bytes(body));
        self.length.add(body.len().to_string().as_bytes());
    }

    fn add_length(&self, length: &str) {
        self.length.add(length.as_bytes());
    }

    /// Re-evaluate the adaptive policy, then compare either the full
    /// content or just the length.
    fn compare(&self, body: &[u8], config: &Config) -> Vec<Diff> {
        self.refresh_policy(config);
        if self.length_only.load(Ordering::Relaxed) {
            self.length
                .compare(DiffKind::Replaced, body.len().to_string().as_bytes())
        } else {
            self.content.compare(Payload::Bytes(body))
        }
    }

    /// Switch to length-only when calibration saw exactly one distinct
    /// length above the cutoff; revert once a second distinct length
    /// appears.
    fn refresh_policy(&self, config: &Config) {
        if config.analyze_all {
            return;
        }
        let lone_large = self
            .length
            .lone_sample()
            .and_then(|s| crate::stats::parse_integer(&s))
            .is_some_and(|len| len > config.body_length_cutoff as i64);
        if lone_large {
            if !self.length_only.swap(true, Ordering::Relaxed) {
                tracing::info!("only analyzing {} length", self.label);
            }
        } else if self.length.sample_count() > 1 && self.length_only.swap(false, Ordering::Relaxed)
        {
            tracing::info!("reverting to full {} analysis", self.label);
        }
    }
}

struct FacetSet {
    status: Blob,
    reason: Blob,
    headers: Blob,
    body: BodyFacet,
}

impl FacetSet {
    fn new(body_label: &'static str) -> Self {
        Self {
            status: Blob::new(),
            reason: Blob::new(),
            headers: Blob::new(),
            body: BodyFacet::new(body_label),
        }
    }
}

/// Learns the behavioral baseline of a probed endpoint and classifies
/// candidate responses against it.
///
/// One `Analyzer` lives for one calibration session and may be shared
/// across threads; all mutation is interior and per-facet.
pub struct Analyzer {
    config: Config,
    extension: Box<dyn Extension>,
    main: FacetSet,
    redirect: FacetSet,
    response_time: ResponseTimeBlob,
    error: Blob,
}

impl Analyzer {
    /// Create an analyzer with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create an analyzer with an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            extension: Box::new(NoopExtension),
            main: FacetSet::new("body"),
            redirect: FacetSet::new("redirect body"),
            response_time: ResponseTimeBlob::new(),
            error: Blob::new(),
        }
    }

    /// Inject an extension hook, replacing the default no-op.
    pub fn extension(mut self, extension: impl Extension + 'static) -> Self {
        self.extension = Box::new(extension);
        self
    }

    /// Feed one baseline observation into every facet.
    ///
    /// The extension hook runs first; its failure is logged and does not
    /// block the built-ins. A transport failure (absent response) feeds
    /// only the error and elapsed-time facets.
    pub fn calibrate(&self, observation: &Observation<'_>) {
        if let Err(err) = self.extension.calibrate(observation) {
            tracing::debug!("extension calibrate hook failed: {err}");
        }
        let Some(response) = observation.response else {
            self.error.add(Payload::Text(observation.error));
            self.response_time.add(observation.elapsed);
            return;
        };

        if let Some(prior) = response.history.first() {
            self.redirect.status.add(Payload::Text(&prior.status.to_string()));
            self.redirect.reason.add(Payload::Text(&prior.reason));
            self.redirect.headers.add(Payload::Text(&prior.header_text()));
            self.redirect.body.add(&prior.body);
        } else {
            self.redirect.status.add(Payload::Text(NO_REDIRECT_STATUS));
            self.redirect.reason.add(Payload::Text(""));
            self.redirect.headers.add(Payload::Text(""));
            self.redirect.body.content.add(Payload::Bytes(b""));
            self.redirect.body.add_length(NO_REDIRECT_LENGTH);
        }

        self.main.status.add(Payload::Text(&response.status.to_string()));
        self.main.reason.add(Payload::Text(&response.reason));
        self.main.headers.add(Payload::Text(&response.header_text()));
        self.main.body.add(&response.body);
        self.response_time.add(observation.elapsed);
        self.error.add(Payload::Text(observation.error));
    }

    /// Classify a candidate observation against the baseline.
    ///
    /// Returns a lazy, finite sequence of findings: each facet is
    /// evaluated when the iterator reaches it, and every call produces a
    /// fresh, independent iterator. Findings are not deduplicated;
    /// consumers dedup via [`Diff`] equality.
    pub fn compare<'a>(&'a self, observation: &Observation<'a>) -> impl Iterator<Item = Diff> + 'a {
        let observation = *observation;
        let mut stages: Vec<Box<dyn FnOnce() -> Vec<Diff> + 'a>> = Vec::new();

        stages.push(Box::new(move || {
            match self.extension.compare(&observation) {
                Ok(diffs) => diffs,
                Err(err) => {
                    tracing::debug!("extension compare hook failed: {err}");
                    Vec::new()
                }
            }
        }));

        match observation.response {
            None => {
                stages.push(Box::new(move || {
                    self.error.compare(Payload::Text(observation.error))
                }));
                stages.push(Box::new(move || {
                    self.response_time.compare(observation.elapsed)
                }));
            }
            Some(response) => {
                match response.history.first() {
                    Some(prior) => {
                        stages.push(Box::new(move || {
                            self.redirect
                                .status
                                .compare(Payload::Text(&prior.status.to_string()))
                        }));
                        stages.push(Box::new(move || {
                            self.redirect.reason.compare(Payload::Text(&prior.reason))
                        }));
                        stages.push(Box::new(move || {
                            self.redirect.body.compare(&prior.body, &self.config)
                        }));
                        stages.push(Box::new(move || {
                            self.redirect
                                .headers
                                .compare(Payload::Text(&prior.header_text()))
                        }));
                    }
                    None => {
                        stages.push(Box::new(move || {
                            self.redirect.status.compare(Payload::Text(NO_REDIRECT_STATUS))
                        }));
                        stages.push(Box::new(move || {
                            self.redirect.reason.compare(Payload::Text(""))
                        }));
                        stages.push(Box::new(move || {
                            self.redirect.body.content.compare(Payload::Bytes(b""))
                        }));
                        stages.push(Box::new(move || {
                            self.redirect
                                .body
                                .length
                                .compare(DiffKind::Replaced, NO_REDIRECT_LENGTH.as_bytes())
                        }));
                        stages.push(Box::new(move || {
                            self.redirect.headers.compare(Payload::Text(""))
                        }));
                    }
                }

                stages.push(Box::new(move || {
                    self.main
                        .status
                        .compare(Payload::Text(&response.status.to_string()))
                }));
                stages.push(Box::new(move || {
                    self.main.reason.compare(Payload::Text(&response.reason))
                }));
                stages.push(Box::new(move || {
                    self.main.body.compare(&response.body, &self.config)
                }));
                stages.push(Box::new(move || {
                    self.main
                        .headers
                        .compare(Payload::Text(&response.header_text()))
                }));
                stages.push(Box::new(move || {
                    self.response_time.compare(observation.elapsed)
                }));
                stages.push(Box::new(move || {
                    self.error.compare(Payload::Text(observation.error))
                }));
            }
        }

        stages.into_iter().flat_map(|stage| stage())
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Response;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn analyzer_is_shareable_across_threads() {
        assert_send_sync::<Analyzer>();
    }

    #[test]
    fn baseline_response_compares_clean() {
        let analyzer = Analyzer::new();
        let response = Response::new(200, "OK")
            .header("Server", "nginx")
            .body("hello world");
        for _ in 0..3 {
            analyzer.calibrate(&Observation::of(&response, "100"));
        }
        let diffs: Vec<Diff> = analyzer.compare(&Observation::of(&response, "100")).collect();
        assert!(diffs.is_empty(), "unexpected findings: {diffs:?}");
    }

    #[test]
    fn transport_failure_path_only_checks_error_and_time() {
        let analyzer = Analyzer::new();
        analyzer.calibrate(&Observation::failure("connection reset", "100"));
        analyzer.calibrate(&Observation::failure("connection reset", "104"));

        let clean: Vec<Diff> = analyzer
            .compare(&Observation::failure("connection reset", "102"))
            .collect();
        assert!(clean.is_empty());

        let diffs: Vec<Diff> = analyzer
            .compare(&Observation::failure("connection refused", "102"))
            .collect();
        assert!(!diffs.is_empty());
    }
}
