//! Per-item outcomes of a run.

use std::path::PathBuf;

use crate::error::Error;

/// What happened to one file.
#[derive(Debug)]
pub enum ItemOutcome {
    Downloaded { bytes: u64 },
    AlreadyPresent,
    Skipped { reason: String },
    Failed { error: Error },
}

/// An outcome and the path (relative to the output directory) it concerns.
#[derive(Debug)]
pub struct ItemRecord {
    pub path: PathBuf,
    pub outcome: ItemOutcome,
}

/// Everything a run did, in processing order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub items: Vec<ItemRecord>,
    /// Unsupported attachments seen while listing.
    pub unsupported: usize,
}

impl RunReport {
    pub fn record(&mut self, path: PathBuf, outcome: ItemOutcome) {
        self.items.push(ItemRecord { path, outcome });
    }

    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Downloaded { .. }))
    }

    pub fn already_present(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::AlreadyPresent))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    /// Total bytes written.
    pub fn bytes(&self) -> u64 {
        self.items
            .iter()
            .map(|r| match r.outcome {
                ItemOutcome::Downloaded { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }

    /// Records that need the user's attention.
    pub fn problems(&self) -> impl Iterator<Item = &ItemRecord> {
        self.items.iter().filter(|r| {
            matches!(
                r.outcome,
                ItemOutcome::Skipped { .. } | ItemOutcome::Failed { .. }
            )
        })
    }

    fn count(&self, pred: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.items.iter().filter(|r| pred(&r.outcome)).count()
    }
}
