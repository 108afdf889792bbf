//! Tokenizing container that aligns payloads across samples.
//!
//! A [`Blob`] owns one response facet (body, headers, ...). The first
//! calibration payload becomes the immutable reference token sequence;
//! every later payload is edit-aligned against it and each non-equal
//! slot is routed into a per-position [`Item`] that learns how that slot
//! varies. Comparison replays the same alignment read-only: slots with a
//! learned item delegate to it, slots that never varied synthesize a
//! structural-novelty finding against a lazily created placeholder.
//!
//! Locking is deliberately light. The reference sequence is write-once,
//! so comparison never takes a blob-wide lock; only the item maps are
//! individually locked, and only long enough to fetch or create an
//! `Arc<Item>`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::align::{align, render_token, tokenize, AlignOp, SplitMode};
use crate::diff::{Diff, DiffKind};
use crate::item::Item;

/// A payload handed to a blob: UTF-8 text or raw bytes.
///
/// The variant of the first calibration payload fixes the blob's
/// [`SplitMode`].
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    /// Text payload (status line, reason, headers, error strings).
    Text(&'a str),
    /// Byte payload (response bodies).
    Bytes(&'a [u8]),
}

impl<'a> Payload<'a> {
    fn bytes(&self) -> &'a [u8] {
        match self {
            Payload::Text(s) => s.as_bytes(),
            Payload::Bytes(b) => b,
        }
    }

    fn mode(&self) -> SplitMode {
        match self {
            Payload::Text(_) => SplitMode::Text,
            Payload::Bytes(_) => SplitMode::Bytes,
        }
    }
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(s: &'a str) -> Self {
        Payload::Text(s)
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(b: &'a [u8]) -> Self {
        Payload::Bytes(b)
    }
}

/// Position key for placeholder items: alignment operation plus the
/// reference (or anchor) index it occurred at.
type SlotKey = (AlignOp, usize);

/// Tokenizing, aligning container for one response facet.
pub struct Blob {
    mode: OnceLock<SplitMode>,
    reference: OnceLock<Vec<Vec<u8>>>,
    positions: Mutex<HashMap<usize, Arc<Item>>>,
    insertions: Mutex<HashMap<usize, Arc<Item>>>,
    placeholders: Mutex<HashMap<SlotKey, Arc<Item>>>,
}

impl Blob {
    /// Create an empty blob awaiting its first calibration payload.
    pub fn new() -> Self {
        Self {
            mode: OnceLock::new(),
            reference: OnceLock::new(),
            positions: Mutex::new(HashMap::new()),
            insertions: Mutex::new(HashMap::new()),
            placeholders: Mutex::new(HashMap::new()),
        }
    }

    /// Feed a calibration payload.
    ///
    /// The first payload is stored verbatim as the reference token
    /// sequence and creates no items. Later payloads are aligned against
    /// the reference and each replaced, deleted or inserted slot feeds
    /// its per-position item.
    pub fn add(&self, payload: Payload<'_>) {
        let mut tokens = tokenize(payload.bytes());
        if self.reference.get().is_none() {
            let _ = self.mode.set(payload.mode());
            match self.reference.set(tokens) {
                Ok(()) => return,
                // Lost a first-add race; align against the winner.
                Err(rejected) => tokens = rejected,
            }
        }
        let Some(reference) = self.reference.get() else {
            return;
        };

        for span in align(reference, &tokens) {
            match span.op {
                AlignOp::Equal => {}
                AlignOp::Replace => {
                    for (i, j) in (span.old_start..span.old_end).zip(span.new_start..span.new_end)
                    {
                        self.position_item(i, &reference[i]).add(&tokens[j]);
                    }
                }
                AlignOp::Delete => {
                    // The value vanished but the position persists.
                    for i in span.old_start..span.old_end {
                        self.position_item(i, &reference[i]).add(b"");
                    }
                }
                AlignOp::Insert => {
                    for j in span.new_start..span.new_end {
                        self.insertion_item(span.old_start, &tokens[j]).add(&tokens[j]);
                    }
                }
            }
        }
    }

    /// Compare a candidate payload against the calibrated baseline.
    ///
    /// Findings are concatenated across alignment operations without
    /// deduplication; callers dedup via [`Diff`] equality. A blob that
    /// never saw a calibration payload reports nothing.
    pub fn compare(&self, payload: Payload<'_>) -> Vec<Diff> {
        let Some(reference) = self.reference.get() else {
            return Vec::new();
        };
        let mode = self.mode.get().copied().unwrap_or(SplitMode::Text);
        let tokens = tokenize(payload.bytes());
        let mut out = Vec::new();

        for span in align(reference, &tokens) {
            match span.op {
                AlignOp::Equal => {}
                AlignOp::Replace => {
                    for (i, j) in (span.old_start..span.old_end).zip(span.new_start..span.new_end)
                    {
                        match self.existing_position(i) {
                            Some(item) => {
                                out.extend(item.compare(DiffKind::Replaced, &tokens[j]));
                            }
                            None => out.push(self.novel(
                                DiffKind::NovelReplaced,
                                (AlignOp::Replace, i),
                                format!(
                                    "\"{}\" - \"{}\"",
                                    render_token(&reference[i], mode),
                                    render_token(&tokens[j], mode)
                                ),
                            )),
                        }
                    }
                }
                AlignOp::Delete => {
                    for i in span.old_start..span.old_end {
                        match self.existing_position(i) {
                            Some(item) => out.extend(item.compare(DiffKind::Deleted, b"")),
                            None => out.push(self.novel(
                                DiffKind::NovelDeleted,
                                (AlignOp::Delete, i),
                                format!("\"{}\" - None", render_token(&reference[i], mode)),
                            )),
                        }
                    }
                }
                AlignOp::Insert => {
                    let anchor = span.old_start;
                    for j in span.new_start..span.new_end {
                        match self.existing_insertion(anchor) {
                            Some(item) => {
                                out.extend(item.compare(DiffKind::Inserted, &tokens[j]));
                            }
                            None => out.push(self.novel(
                                DiffKind::NovelInserted,
                                (AlignOp::Insert, anchor),
                                format!("None - \"{}\"", render_token(&tokens[j], mode)),
                            )),
                        }
                    }
                }
            }
        }
        out
    }

    /// Whether a reference sequence has been learned.
    pub fn is_calibrated(&self) -> bool {
        self.reference.get().is_some()
    }

    fn position_item(&self, index: usize, seed: &[u8]) -> Arc<Item> {
        let Ok(mut positions) = self.positions.lock() else {
            return Arc::new(Item::seeded(seed));
        };
        positions
            .entry(index)
            .or_insert_with(|| Arc::new(Item::seeded(seed)))
            .clone()
    }

    fn existing_position(&self, index: usize) -> Option<Arc<Item>> {
        self.positions.lock().ok()?.get(&index).cloned()
    }

    fn existing_insertion(&self, anchor: usize) -> Option<Arc<Item>> {
        self.insertions.lock().ok()?.get(&anchor).cloned()
    }

    fn insertion_item(&self, anchor: usize, seed: &[u8]) -> Arc<Item> {
        let Ok(mut insertions) = self.insertions.lock() else {
            return Arc::new(Item::seeded(seed));
        };
        insertions
            .entry(anchor)
            .or_insert_with(|| Arc::new(Item::seeded(seed)))
            .clone()
    }

    /// Synthesize a structural-novelty finding against the placeholder
    /// item for a position never seen varying during calibration.
    fn novel(&self, kind: DiffKind, key: SlotKey, message: String) -> Diff {
        let unit = match self.placeholders.lock() {
            Ok(mut placeholders) => placeholders
                .entry(key)
                .or_insert_with(|| Arc::new(Item::new()))
                .id(),
            Err(_) => Item::new().id(),
        };
        Diff::new(kind, unit, message)
    }
}

impl Default for Blob {
    fn default() -> Self {
        Self::new()
    }
}
