//! Tokenization and edit alignment of variable-length payloads.
//!
//! Payloads are split into positional token slots on a fixed delimiter
//! class, then a candidate token sequence is aligned against the learned
//! reference sequence with a Levenshtein edit script. The script maps
//! every candidate token either onto a reference position (equal,
//! replace, delete) or onto an insertion anchor, which is what lets the
//! per-position learning survive unstable token counts.
//!
//! The alignment is implemented here rather than imported: it is the
//! structural core of the crate and needs exactly one algorithm, the
//! classic O(m*n) dynamic program with opcode backtracking.

use crate::constants::is_delimiter;

/// How a payload is split and rendered.
///
/// Fixed by the type of the first calibration payload. Both modes split
/// on the same ASCII delimiter class; the mode governs how tokens are
/// rendered into finding messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Payloads are UTF-8 text; tokens render lossily as text.
    Text,
    /// Payloads are raw bytes; tokens render with ASCII escapes.
    Bytes,
}

/// Render a token for a finding message according to the split mode.
pub(crate) fn render_token(token: &[u8], mode: SplitMode) -> String {
    match mode {
        SplitMode::Text => String::from_utf8_lossy(token).into_owned(),
        SplitMode::Bytes => token.escape_ascii().to_string(),
    }
}

/// Split a payload into tokens on the fixed delimiter class.
///
/// Empty segments are preserved: consecutive delimiters produce empty
/// tokens and an empty payload produces a single empty token. Dropping
/// them would shift positions between samples and break alignment.
pub fn tokenize(payload: &[u8]) -> Vec<Vec<u8>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (i, &byte) in payload.iter().enumerate() {
        if is_delimiter(byte) {
            tokens.push(payload[start..i].to_vec());
            start = i + 1;
        }
    }
    tokens.push(payload[start..].to_vec());
    tokens
}

/// One edit operation kind in an alignment script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlignOp {
    /// Tokens match; both sides advance.
    Equal,
    /// Reference tokens were substituted by candidate tokens of the
    /// same count.
    Replace,
    /// Reference tokens are absent from the candidate.
    Delete,
    /// Candidate tokens were inserted at a reference anchor.
    Insert,
}

/// A maximal run of one edit operation over index ranges.
///
/// `old_start..old_end` indexes the reference sequence and
/// `new_start..new_end` the candidate. For `Insert` the old range is
/// empty and `old_start` is the anchor index; for `Delete` the new
/// range is empty. `Replace` ranges have equal lengths on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignSpan {
    /// Operation applied over the ranges.
    pub op: AlignOp,
    /// Start of the reference range (anchor index for `Insert`).
    pub old_start: usize,
    /// End of the reference range, exclusive.
    pub old_end: usize,
    /// Start of the candidate range.
    pub new_start: usize,
    /// End of the candidate range, exclusive.
    pub new_end: usize,
}

/// Compute the Levenshtein edit script between two token sequences.
///
/// Returns maximal spans in order; concatenating the candidate ranges
/// of `Equal`/`Replace`/`Insert` spans reproduces `new`, and the
/// reference ranges of `Equal`/`Replace`/`Delete` spans reproduce
/// `old`. Uniform costs (insert = delete = substitute = 1).
pub fn align<T: PartialEq>(old: &[T], new: &[T]) -> Vec<AlignSpan> {
    let m = old.len();
    let n = new.len();

    // Full cost matrix; payload token counts are modest and the
    // backtrack needs every cell.
    let width = n + 1;
    let mut cost = vec![0u32; (m + 1) * width];
    for j in 0..=n {
        cost[j] = j as u32;
    }
    for i in 1..=m {
        cost[i * width] = i as u32;
        for j in 1..=n {
            let sub = cost[(i - 1) * width + (j - 1)]
                + u32::from(old[i - 1] != new[j - 1]);
            let del = cost[(i - 1) * width + j] + 1;
            let ins = cost[i * width + (j - 1)] + 1;
            cost[i * width + j] = sub.min(del).min(ins);
        }
    }

    // Backtrack from the corner, collecting single-step ops.
    let mut steps = Vec::with_capacity(m.max(n));
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        let here = cost[i * width + j];
        if i > 0 && j > 0 && old[i - 1] == new[j - 1] && here == cost[(i - 1) * width + (j - 1)] {
            steps.push(AlignOp::Equal);
            i -= 1;
            j -= 1;
        } else if i > 0 && j > 0 && here == cost[(i - 1) * width + (j - 1)] + 1 {
            steps.push(AlignOp::Replace);
            i -= 1;
            j -= 1;
        } else if i > 0 && here == cost[(i - 1) * width + j] + 1 {
            steps.push(AlignOp::Delete);
            i -= 1;
        } else {
            steps.push(AlignOp::Insert);
            j -= 1;
        }
    }
    steps.reverse();

    // Merge consecutive identical ops into maximal spans.
    let mut spans: Vec<AlignSpan> = Vec::new();
    let (mut oi, mut ni) = (0usize, 0usize);
    for op in steps {
        let (do_, dn) = match op {
            AlignOp::Equal | AlignOp::Replace => (1, 1),
            AlignOp::Delete => (1, 0),
            AlignOp::Insert => (0, 1),
        };
        match spans.last_mut() {
            Some(last) if last.op == op => {
                last.old_end += do_;
                last.new_end += dn;
            }
            _ => spans.push(AlignSpan {
                op,
                old_start: oi,
                old_end: oi + do_,
                new_start: ni,
                new_end: ni + dn,
            }),
        }
        oi += do_;
        ni += dn;
    }
    spans
}
