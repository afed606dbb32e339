//! The public diff operations
//!
//! `compute` and `compute_patience` never fail: if the edit-graph search
//! errors on an input it cannot handle, the engine logs a warning and
//! degrades to the position-by-position fallback, tagging the result
//! accordingly.

use crate::artifacts::diff::myers::MyersDiff;
use crate::artifacts::diff::patience::PatienceDiff;
use crate::artifacts::diff::{
    Algorithm, Change, DiffResult, DiffStats, join_lines, split_lines,
};
use chrono::Utc;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("line {index} does not match the original: expected {expected:?}, found {found:?}")]
    LineMismatch {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("change references line {index} but the original has {len} lines")]
    OutOfRange { index: usize, len: usize },
}

/// Compute the minimal line-level edit script via the Myers search
pub fn compute(original: &str, modified: &str) -> DiffResult {
    compute_with(Algorithm::Myers, original, modified)
}

/// Compute an edit script anchored on uniquely-occurring lines
pub fn compute_patience(original: &str, modified: &str) -> DiffResult {
    compute_with(Algorithm::Patience, original, modified)
}

fn compute_with(requested: Algorithm, original: &str, modified: &str) -> DiffResult {
    let a = split_lines(original);
    let b = split_lines(modified);

    let script = match requested {
        Algorithm::Myers => MyersDiff::new(&a, &b).script(),
        Algorithm::Patience => PatienceDiff::new(&a, &b).script(),
        Algorithm::Positional => Ok(positional(&a, &b)),
    };

    let (algorithm, changes) = match script {
        Ok(changes) => (requested, changes),
        Err(error) => {
            warn!(
                algorithm = %requested,
                error = %error,
                "diff search failed, degrading to the positional fallback"
            );
            (Algorithm::Positional, positional(&a, &b))
        }
    };

    DiffResult::new(
        algorithm,
        changes,
        a.len(),
        b.len(),
        original.ends_with('\n'),
        modified.ends_with('\n'),
        Utc::now(),
    )
}

/// Pair lines by position: a mismatched pair becomes a delete plus an
/// insert, and the longer side's tail becomes pure deletes or inserts
fn positional(a: &[String], b: &[String]) -> Vec<Change> {
    let mut changes = Vec::new();

    for index in 0..a.len().min(b.len()) {
        if a[index] == b[index] {
            changes.push(Change::Equal {
                old_index: index,
                new_index: index,
                lines: vec![a[index].clone()],
            });
        } else {
            changes.push(Change::Delete {
                old_index: index,
                lines: vec![a[index].clone()],
            });
            changes.push(Change::Insert {
                new_index: index,
                lines: vec![b[index].clone()],
            });
        }
    }
    for index in b.len()..a.len() {
        changes.push(Change::Delete {
            old_index: index,
            lines: vec![a[index].clone()],
        });
    }
    for index in a.len()..b.len() {
        changes.push(Change::Insert {
            new_index: index,
            lines: vec![b[index].clone()],
        });
    }

    changes
}

/// Coalesce adjacent same-kind changes into multi-line changes
///
/// Indices come from the first change of each run; everything else,
/// including the creation time, carries over unchanged.
pub fn optimize(diff: &DiffResult) -> DiffResult {
    let mut changes: Vec<Change> = Vec::new();

    for change in diff.changes() {
        match changes.last_mut() {
            Some(last) if last.extends(change) => last.absorb(change),
            _ => changes.push(change.clone()),
        }
    }

    DiffResult::new(
        diff.algorithm(),
        changes,
        diff.old_len(),
        diff.new_len(),
        diff.old_ends_with_newline(),
        diff.new_ends_with_newline(),
        diff.created_at(),
    )
}

/// Replay a script against the original it was computed from
///
/// Equal and insert lines are emitted in order, deletes are skipped, and
/// the modified side's trailing newline is restored. Equal and delete lines
/// are cross-checked against the original; a mismatch means the script does
/// not belong to this original and is reported as an error.
pub fn apply(original: &str, diff: &DiffResult) -> Result<String, DiffError> {
    let source = split_lines(original);
    let mut output: Vec<String> = Vec::with_capacity(diff.new_len());

    for change in diff.changes() {
        match change {
            Change::Equal {
                old_index, lines, ..
            } => {
                verify(&source, *old_index, lines)?;
                output.extend(lines.iter().cloned());
            }
            Change::Delete { old_index, lines } => {
                verify(&source, *old_index, lines)?;
            }
            Change::Insert { lines, .. } => output.extend(lines.iter().cloned()),
        }
    }

    Ok(join_lines(&output, diff.new_ends_with_newline()))
}

/// Reconstruct the modified side from the script alone, without an original
/// to check against
pub(crate) fn replay(diff: &DiffResult) -> String {
    let mut output: Vec<String> = Vec::with_capacity(diff.new_len());

    for change in diff.changes() {
        match change {
            Change::Equal { lines, .. } | Change::Insert { lines, .. } => {
                output.extend(lines.iter().cloned())
            }
            Change::Delete { .. } => {}
        }
    }

    join_lines(&output, diff.new_ends_with_newline())
}

fn verify(source: &[String], start: usize, lines: &[String]) -> Result<(), DiffError> {
    for (offset, line) in lines.iter().enumerate() {
        let index = start + offset;
        let found = source.get(index).ok_or(DiffError::OutOfRange {
            index,
            len: source.len(),
        })?;
        if found != line {
            return Err(DiffError::LineMismatch {
                index,
                expected: line.clone(),
                found: found.clone(),
            });
        }
    }

    Ok(())
}

/// Count added, deleted, and unchanged lines across the script
pub fn stats(diff: &DiffResult) -> DiffStats {
    let mut stats = DiffStats::default();

    for change in diff.changes() {
        match change {
            Change::Equal { lines, .. } => stats.unchanged += lines.len(),
            Change::Insert { lines, .. } => stats.additions += lines.len(),
            Change::Delete { lines, .. } => stats.deletions += lines.len(),
        }
    }
    stats.modifications = stats.additions.min(stats.deletions);

    stats
}
