//! Line-level diff types and algorithms
//!
//! This module implements the diff engine:
//!
//! - `myers`: Myers' O(N*D) shortest-edit-script search
//! - `patience`: unique-line anchoring with Myers recursion on the gaps
//! - `engine`: the public compute/optimize/apply/stats operations
//! - `codec`: compact token encoding with a zlib-compressed wire form
//!
//! Diffs operate on whole lines. A trailing newline is consumed by the line
//! split and remembered as a flag on the result, so a final blank line never
//! registers as a spurious change.

pub mod codec;
pub mod engine;
pub mod myers;
pub mod patience;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which algorithm produced a [`DiffResult`]
///
/// `Positional` marks the degraded position-by-position fallback used when
/// the Myers search fails on an input it cannot handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Myers,
    Patience,
    Positional,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Myers => write!(f, "myers"),
            Algorithm::Patience => write!(f, "patience"),
            Algorithm::Positional => write!(f, "positional"),
        }
    }
}

/// One step of an edit script
///
/// Indices are zero-based line positions in the original (`old_index`) and
/// modified (`new_index`) texts. The algorithms emit one line per change;
/// [`engine::optimize`] coalesces adjacent same-kind changes so `lines`
/// carries the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Equal {
        old_index: usize,
        new_index: usize,
        lines: Vec<String>,
    },
    Insert {
        new_index: usize,
        lines: Vec<String>,
    },
    Delete {
        old_index: usize,
        lines: Vec<String>,
    },
}

impl Change {
    pub fn lines(&self) -> &[String] {
        match self {
            Change::Equal { lines, .. }
            | Change::Insert { lines, .. }
            | Change::Delete { lines, .. } => lines,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines().len()
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, Change::Equal { .. })
    }

    /// Append the other change's lines onto this one
    ///
    /// Only meaningful when `self.extends(other)` holds.
    pub(crate) fn absorb(&mut self, other: &Change) {
        let extra = other.lines().to_vec();
        match self {
            Change::Equal { lines, .. }
            | Change::Insert { lines, .. }
            | Change::Delete { lines, .. } => lines.extend(extra),
        }
    }

    /// True when two changes are the same kind and the second continues
    /// directly where the first ends, so they can be coalesced.
    pub(crate) fn extends(&self, other: &Change) -> bool {
        match (self, other) {
            (
                Change::Equal {
                    old_index: o1,
                    new_index: n1,
                    lines,
                },
                Change::Equal {
                    old_index: o2,
                    new_index: n2,
                    ..
                },
            ) => o1 + lines.len() == *o2 && n1 + lines.len() == *n2,
            (
                Change::Insert {
                    new_index: n1,
                    lines,
                },
                Change::Insert { new_index: n2, .. },
            ) => n1 + lines.len() == *n2,
            (
                Change::Delete {
                    old_index: o1,
                    lines,
                },
                Change::Delete { old_index: o2, .. },
            ) => o1 + lines.len() == *o2,
            _ => false,
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self {
            Change::Equal { .. } => ' ',
            Change::Insert { .. } => '+',
            Change::Delete { .. } => '-',
        };
        let mut first = true;
        for line in self.lines() {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{prefix}{line}")?;
            first = false;
        }
        Ok(())
    }
}

/// An immutable edit script between two texts
///
/// Produced once per compute call and never mutated afterwards. Equality is
/// full structural equality, including the creation timestamp, so the codec
/// round-trip can be asserted with `==`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffResult {
    algorithm: Algorithm,
    changes: Vec<Change>,
    old_len: usize,
    new_len: usize,
    old_ends_with_newline: bool,
    new_ends_with_newline: bool,
    created_at: DateTime<Utc>,
}

impl DiffResult {
    pub(crate) fn new(
        algorithm: Algorithm,
        changes: Vec<Change>,
        old_len: usize,
        new_len: usize,
        old_ends_with_newline: bool,
        new_ends_with_newline: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        DiffResult {
            algorithm,
            changes,
            old_len,
            new_len,
            old_ends_with_newline,
            new_ends_with_newline,
            created_at,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    pub fn old_len(&self) -> usize {
        self.old_len
    }

    pub fn new_len(&self) -> usize {
        self.new_len
    }

    pub fn old_ends_with_newline(&self) -> bool {
        self.old_ends_with_newline
    }

    pub fn new_ends_with_newline(&self) -> bool {
        self.new_ends_with_newline
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// True when the script contains no insertions or deletions
    pub fn is_identity(&self) -> bool {
        self.changes.iter().all(Change::is_equal)
    }
}

/// Aggregate line counts for an edit script
///
/// `modifications` is the heuristic `min(additions, deletions)`, not a true
/// paired-line match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffStats {
    pub additions: usize,
    pub deletions: usize,
    pub modifications: usize,
    pub unchanged: usize,
}

/// Split a text into lines, consuming a single trailing newline
///
/// The empty text has zero lines. Whether the text ended with a newline is
/// reported separately so it can be restored on apply.
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = text.split('\n').map(str::to_string).collect::<Vec<_>>();
    if text.ends_with('\n') {
        lines.pop();
    }

    lines
}

/// Join lines back into a text, restoring the trailing newline flag
pub(crate) fn join_lines(lines: &[String], ends_with_newline: bool) -> String {
    if lines.is_empty() {
        return String::new();
    }

    let mut text = lines.join("\n");
    if ends_with_newline {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("", vec![])]
    #[case("a", vec!["a"])]
    #[case("a\n", vec!["a"])]
    #[case("a\nb", vec!["a", "b"])]
    #[case("a\nb\n", vec!["a", "b"])]
    #[case("\n", vec![""])]
    #[case("a\n\nb", vec!["a", "", "b"])]
    fn split_consumes_single_trailing_newline(#[case] text: &str, #[case] expected: Vec<&str>) {
        assert_eq!(split_lines(text), expected);
    }

    #[rstest]
    #[case("")]
    #[case("a")]
    #[case("a\n")]
    #[case("a\nb\n")]
    #[case("\n")]
    #[case("a\n\n")]
    fn join_inverts_split(#[case] text: &str) {
        let lines = split_lines(text);
        assert_eq!(join_lines(&lines, text.ends_with('\n')), text);
    }

    #[test]
    fn contiguous_same_kind_changes_extend() {
        let first = Change::Delete {
            old_index: 2,
            lines: vec!["x".to_string(), "y".to_string()],
        };
        let second = Change::Delete {
            old_index: 4,
            lines: vec!["z".to_string()],
        };
        let gap = Change::Delete {
            old_index: 6,
            lines: vec!["w".to_string()],
        };

        assert!(first.extends(&second));
        assert!(!first.extends(&gap));
        assert!(!first.extends(&Change::Insert {
            new_index: 4,
            lines: vec!["z".to_string()],
        }));
    }
}
