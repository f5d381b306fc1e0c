//! Duplicate detection for lookup table extension.

use std::collections::HashSet;

use solana_sdk::pubkey::Pubkey;

use crate::address::truncate_middle;

/// How many duplicate addresses are shown before collapsing into "+N more".
pub const DUPLICATE_PREVIEW_LEN: usize = 3;

/// Candidates partitioned by whether a table already stores them.
///
/// Membership is only checked against the table. A candidate repeated in the
/// input appears in the output as many times as it was entered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateAnalysis {
    /// Candidates not in the table, in input order
    pub unique: Vec<Pubkey>,
    /// Candidates already in the table, in input order
    pub duplicate: Vec<Pubkey>,
}

/// Partition `candidates` against the addresses already in a table.
///
/// A single pass over each input; never fails.
pub fn analyze(candidates: &[Pubkey], existing: &[Pubkey]) -> DuplicateAnalysis {
    let existing = existing.iter().collect::<HashSet<_>>();
    let mut analysis = DuplicateAnalysis::default();
    for candidate in candidates {
        if existing.contains(candidate) {
            analysis.duplicate.push(*candidate);
        } else {
            analysis.unique.push(*candidate);
        }
    }
    analysis
}

impl DuplicateAnalysis {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicate.is_empty()
    }

    /// Proceeding only makes sense when something would be added.
    pub fn can_proceed(&self) -> bool {
        !self.unique.is_empty()
    }

    /// The addresses to submit after confirmation.
    ///
    /// With `dedup_candidates`, repeats within the unique list are dropped,
    /// keeping the first occurrence.
    pub fn to_submit(&self, dedup_candidates: bool) -> Vec<Pubkey> {
        if dedup_candidates {
            dedup_preserving_order(&self.unique)
        } else {
            self.unique.clone()
        }
    }

    pub fn preview(&self) -> DuplicatePreview {
        let shown = self
            .duplicate
            .iter()
            .take(DUPLICATE_PREVIEW_LEN)
            .map(|address| truncate_middle(&address.to_string(), 4))
            .collect();
        DuplicatePreview {
            unique_count: self.unique.len(),
            duplicate_count: self.duplicate.len(),
            shown,
            more: self.duplicate.len().saturating_sub(DUPLICATE_PREVIEW_LEN),
        }
    }
}

/// A short summary of an analysis for human review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePreview {
    pub unique_count: usize,
    pub duplicate_count: usize,
    /// The first few duplicates, shortened
    pub shown: Vec<String>,
    /// Duplicates not included in `shown`
    pub more: usize,
}

impl DuplicatePreview {
    /// The "+N more" label, if any duplicates were left out
    pub fn more_label(&self) -> Option<String> {
        (self.more > 0).then(|| format!("+{} more", self.more))
    }
}

pub fn dedup_preserving_order(addresses: &[Pubkey]) -> Vec<Pubkey> {
    let mut seen = HashSet::with_capacity(addresses.len());
    addresses
        .iter()
        .filter(|address| seen.insert(**address))
        .copied()
        .collect()
}
