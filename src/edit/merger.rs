//! Edit merging and application
//!
//! Turns an aggregated edit list plus the original source into the final
//! text. Invalid edits are excluded up front; the survivors are
//! stable-sorted by start offset (ties keep aggregation order) and applied
//! with a greedy leftmost-first cursor walk, so the output is a pure
//! function of the aggregated list, independent of plugin identity and of
//! how concurrently the plugins ran.

use serde::Serialize;

use crate::edit::model::{AggregatedEdit, RejectReason};

/// An edit excluded from the merged output, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedEdit {
    pub edit: AggregatedEdit,
    pub reason: RejectReason,
}

/// Accounting for one merge: every input edit lands in exactly one list.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    pub applied: Vec<AggregatedEdit>,
    pub rejected: Vec<RejectedEdit>,
}

/// Final text plus the applied/rejected report.
#[derive(Debug, Clone, Serialize)]
pub struct MergeOutcome {
    pub text: String,
    pub report: MergeReport,
}

impl MergeOutcome {
    /// True when at least one edit was applied.
    pub fn changed(&self) -> bool {
        !self.report.applied.is_empty()
    }
}

/// Apply an aggregated edit list to the source text.
///
/// Edits carry codepoint offsets; the byte positions needed for slicing are
/// derived here once per merge.
pub fn merge(source: &str, edits: Vec<AggregatedEdit>) -> MergeOutcome {
    // Byte offset of every codepoint, plus the end-of-source sentinel.
    let offsets: Vec<usize> = source
        .char_indices()
        .map(|(byte, _)| byte)
        .chain(std::iter::once(source.len()))
        .collect();
    let len = offsets.len() - 1;

    let mut candidates = Vec::with_capacity(edits.len());
    let mut rejected = Vec::new();

    for aggregated in edits {
        match aggregated.edit.validate(len) {
            Ok(()) => candidates.push(aggregated),
            Err(reason) => rejected.push(RejectedEdit {
                edit: aggregated,
                reason,
            }),
        }
    }

    // Stable: equal starts keep declaration order.
    candidates.sort_by_key(|aggregated| aggregated.edit.start);

    let mut text = String::with_capacity(source.len());
    let mut applied = Vec::with_capacity(candidates.len());
    let mut cursor = 0usize;

    for aggregated in candidates {
        if aggregated.edit.start < cursor {
            rejected.push(RejectedEdit {
                reason: RejectReason::Overlap {
                    start: aggregated.edit.start,
                    prior_end: cursor,
                },
                edit: aggregated,
            });
            continue;
        }

        text.push_str(&source[offsets[cursor]..offsets[aggregated.edit.start]]);
        text.push_str(&aggregated.edit.replacement);
        cursor = aggregated.edit.end;
        applied.push(aggregated);
    }

    text.push_str(&source[offsets[cursor]..]);

    MergeOutcome {
        text,
        report: MergeReport { applied, rejected },
    }
}
