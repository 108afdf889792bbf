//! End-to-end calibrate/compare behavior of the analyzer.
//!
//! These tests drive the public API the way a probing tool would:
//! calibrate with a handful of normal responses, then compare candidate
//! responses and inspect the findings.

use respdiff::{
    Analyzer, Diff, DiffKind, Extension, ExtensionError, Item, Observation, Response,
};

fn page(body: &str) -> Response {
    Response::new(200, "OK").header("Server", "nginx").body(body)
}

#[test]
fn baseline_with_normal_variance_compares_clean() {
    let analyzer = Analyzer::new();
    for (id, elapsed) in [("1001", "100"), ("1002", "104"), ("1003", "102")] {
        let response = page(&format!("hello user {id}"));
        analyzer.calibrate(&Observation::of(&response, elapsed));
    }
    let candidate = page("hello user 1009");
    let diffs: Vec<Diff> = analyzer
        .compare(&Observation::of(&candidate, "103"))
        .collect();
    assert!(diffs.is_empty(), "unexpected findings: {diffs:?}");
}

#[test]
fn status_change_is_reported() {
    let analyzer = Analyzer::new();
    let base = page("hello");
    analyzer.calibrate(&Observation::of(&base, "100"));
    analyzer.calibrate(&Observation::of(&base, "100"));

    let probe = Response::new(500, "Internal Server Error")
        .header("Server", "nginx")
        .body("hello");
    let diffs: Vec<Diff> = analyzer.compare(&Observation::of(&probe, "100")).collect();
    assert!(diffs.iter().any(|d| d.kind == DiffKind::NovelReplaced));
}

#[test]
fn adaptive_body_policy_switches_and_reverts() {
    let analyzer = Analyzer::new();
    let big = "x".repeat(2500);
    analyzer.calibrate(&Observation::of(&page(&big), "100"));

    // One calibrated body length above the cutoff: content is ignored,
    // only the length is compared.
    let same_len = "y".repeat(2500);
    let diffs: Vec<Diff> = analyzer
        .compare(&Observation::of(&page(&same_len), "100"))
        .collect();
    assert!(
        diffs.is_empty(),
        "length-only mode should ignore content: {diffs:?}"
    );

    // A second, differently sized calibration sample reverts to full
    // content comparison on the next call.
    let other = "z".repeat(1300);
    analyzer.calibrate(&Observation::of(&page(&other), "100"));
    let diffs: Vec<Diff> = analyzer
        .compare(&Observation::of(&page(""), "100"))
        .collect();
    assert!(
        diffs.iter().any(|d| d.kind == DiffKind::Replaced),
        "full-content mode should flag the emptied body: {diffs:?}"
    );
}

#[test]
fn identical_findings_across_calls_are_equal() {
    let analyzer = Analyzer::new();
    let base = page("aaa");
    analyzer.calibrate(&Observation::of(&base, "100"));
    analyzer.calibrate(&Observation::of(&base, "100"));

    let probe = page("bbb");
    let first: Vec<Diff> = analyzer.compare(&Observation::of(&probe, "100")).collect();
    let second: Vec<Diff> = analyzer.compare(&Observation::of(&probe, "100")).collect();
    assert_eq!(first.len(), 1);
    assert_eq!(first, second);

    // Same kind from a different unit is a different finding.
    let reason_probe = Response::new(200, "NO").header("Server", "nginx").body("aaa");
    let third: Vec<Diff> = analyzer
        .compare(&Observation::of(&reason_probe, "100"))
        .collect();
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].kind, first[0].kind);
    assert_ne!(third[0], first[0]);
}

#[test]
fn unexpected_redirect_is_reported() {
    let analyzer = Analyzer::new();
    let base = page("hello");
    analyzer.calibrate(&Observation::of(&base, "100"));
    analyzer.calibrate(&Observation::of(&base, "100"));

    let prior = Response::new(302, "Found").header("Location", "/login");
    let probe = page("hello").redirected_from(prior);
    let diffs: Vec<Diff> = analyzer.compare(&Observation::of(&probe, "100")).collect();
    assert!(
        !diffs.is_empty(),
        "a redirect never seen in calibration must be a finding"
    );
}

#[test]
fn missing_redirect_is_reported() {
    let analyzer = Analyzer::new();
    let prior = Response::new(301, "Moved Permanently").header("Location", "/new");
    let base = page("hi").redirected_from(prior);
    analyzer.calibrate(&Observation::of(&base, "100"));
    analyzer.calibrate(&Observation::of(&base, "100"));

    let probe = page("hi");
    let diffs: Vec<Diff> = analyzer.compare(&Observation::of(&probe, "100")).collect();
    assert!(
        !diffs.is_empty(),
        "losing the calibrated redirect must be a finding"
    );
}

#[test]
fn non_numeric_elapsed_time_is_flagged() {
    let analyzer = Analyzer::new();
    let base = page("hello");
    analyzer.calibrate(&Observation::of(&base, "100"));
    let diffs: Vec<Diff> = analyzer.compare(&Observation::of(&base, "fast")).collect();
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].kind, DiffKind::ExpectedInteger);
}

/// Extension holding its own item, in the spirit of a reflection check:
/// it learns whether the probe payload normally appears in the body.
struct ReflectionCheck {
    marker: Item,
}

impl ReflectionCheck {
    fn new() -> Self {
        Self { marker: Item::new() }
    }

    fn marker_for(observation: &Observation<'_>) -> &'static [u8] {
        let reflected = observation
            .response
            .map(|r| {
                !observation.payload.is_empty()
                    && r.body
                        .windows(observation.payload.len().max(1))
                        .any(|w| w == observation.payload.as_bytes())
            })
            .unwrap_or(false);
        if reflected {
            b"reflected"
        } else {
            b"clean"
        }
    }
}

impl Extension for ReflectionCheck {
    fn calibrate(&self, observation: &Observation<'_>) -> Result<(), ExtensionError> {
        self.marker.add(Self::marker_for(observation));
        Ok(())
    }

    fn compare(&self, observation: &Observation<'_>) -> Result<Vec<Diff>, ExtensionError> {
        Ok(self
            .marker
            .compare(DiffKind::Replaced, Self::marker_for(observation)))
    }
}

#[test]
fn extension_findings_surface() {
    let analyzer = Analyzer::new().extension(ReflectionCheck::new());
    let base = page("static content");
    analyzer.calibrate(&Observation::of(&base, "100").payload("probe-a"));
    analyzer.calibrate(&Observation::of(&base, "100").payload("probe-b"));

    // Payload now reflected into the body: only the extension notices,
    // because the body facet sees it as a fresh token it can also flag.
    let reflected = page("static content probe-c");
    let diffs: Vec<Diff> = analyzer
        .compare(&Observation::of(&reflected, "100").payload("probe-c"))
        .collect();
    assert!(!diffs.is_empty());
}

struct Exploding;

impl Extension for Exploding {
    fn calibrate(&self, _: &Observation<'_>) -> Result<(), ExtensionError> {
        Err("extension storage offline".into())
    }

    fn compare(&self, _: &Observation<'_>) -> Result<Vec<Diff>, ExtensionError> {
        Err("extension storage offline".into())
    }
}

#[test]
fn failing_extension_never_blocks_builtins() {
    let analyzer = Analyzer::new().extension(Exploding);
    let base = page("hello");
    analyzer.calibrate(&Observation::of(&base, "100"));
    analyzer.calibrate(&Observation::of(&base, "100"));

    assert!(analyzer
        .compare(&Observation::of(&base, "100"))
        .next()
        .is_none());

    let probe = page("changed");
    let diffs: Vec<Diff> = analyzer.compare(&Observation::of(&probe, "100")).collect();
    assert!(!diffs.is_empty(), "built-in checks must still run");
}

#[test]
fn concurrent_calibrate_and_compare() {
    let analyzer = Analyzer::new();
    analyzer.calibrate(&Observation::of(&page("user 1000"), "100"));

    std::thread::scope(|scope| {
        for worker in 0..4u64 {
            let analyzer = &analyzer;
            scope.spawn(move || {
                for round in 0..50u64 {
                    let body = format!("user {}", 1000 + (worker * 50 + round) % 7);
                    let response = page(&body);
                    analyzer.calibrate(&Observation::of(&response, "100"));
                    let _: Vec<Diff> = analyzer
                        .compare(&Observation::of(&response, "100"))
                        .collect();
                }
            });
        }
    });

    // Convergence: all observed variants are within the learned envelope.
    let diffs: Vec<Diff> = analyzer
        .compare(&Observation::of(&page("user 1004"), "100"))
        .collect();
    assert!(diffs.is_empty(), "unexpected findings: {diffs:?}");
}
