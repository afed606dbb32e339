//! Rendering, parsing and replaying of unified-diff text
//!
//! Rendering walks an edit script and groups changed runs into hunks by the
//! `proximity` threshold. Parsing is deliberately tolerant so foreign diffs
//! (git headers, section text after `@@`, `\ No newline` markers) still
//! yield their hunks; input with no recognizable hunk header parses to an
//! empty list, never an error.

use crate::artifacts::diff::engine::compute;
use crate::artifacts::diff::{Change, DiffResult, join_lines, split_lines};
use crate::artifacts::unified::{Hunk, HunkLine, UnifiedOptions};
use regex::Regex;
use thiserror::Error;

const HUNK_HEADER_PATTERN: &str = r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@";

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("hunk -{start},{len} does not fit a {target_len}-line target")]
    RangeOutOfBounds {
        start: usize,
        len: usize,
        target_len: usize,
    },
    #[error("line {line}: hunk expects {expected:?}, target has {found:?}")]
    ContextMismatch {
        line: usize,
        expected: String,
        found: String,
    },
}

/// Addition/deletion tallies of a unified-diff text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnifiedDiffStats {
    pub additions: usize,
    pub deletions: usize,
    pub changes: usize,
}

/// Best-effort sources recovered from a unified-diff text
///
/// Only lines inside hunk windows are recoverable, so both sides are
/// approximations of the true inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconstructedSource {
    pub original: String,
    pub modified: String,
}

/// Diff two texts and render the unified wire form
///
/// `None` when the texts are line-identical (a trailing-newline-only
/// difference counts as identical here).
pub fn create_unified_diff(
    original: &str,
    modified: &str,
    file_path: &str,
    options: &UnifiedOptions,
) -> Option<String> {
    render_unified_diff(&compute(original, modified), file_path, options)
}

/// Render an already-computed edit script as unified-diff text
pub fn render_unified_diff(
    diff: &DiffResult,
    file_path: &str,
    options: &UnifiedOptions,
) -> Option<String> {
    let hunks = hunks_of(diff, options);
    if hunks.is_empty() {
        return None;
    }

    let mut lines = vec![format!("--- a/{file_path}"), format!("+++ b/{file_path}")];
    for hunk in &hunks {
        lines.push(hunk.header());
        lines.extend(hunk.lines().iter().map(ToString::to_string));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    Some(text)
}

/// Hunks of an edit script, grouped by `proximity` with `context` lines
pub(crate) fn hunks_of(diff: &DiffResult, options: &UnifiedOptions) -> Vec<Hunk> {
    let elements = flatten(diff);
    let changed: Vec<usize> = elements
        .iter()
        .enumerate()
        .filter(|(_, element)| element.is_change())
        .map(|(index, _)| index)
        .collect();
    if changed.is_empty() {
        return Vec::new();
    }

    let groups = group_changes(&changed, options.proximity());
    build_hunks(&elements, &groups, options.context())
}

/// Parse unified-diff text into its hunks, tolerantly
pub fn parse_unified_diff(text: &str) -> Vec<Hunk> {
    let Ok(header) = Regex::new(HUNK_HEADER_PATTERN) else {
        return Vec::new();
    };

    struct OpenHunk {
        old_start: usize,
        old_len: usize,
        new_start: usize,
        new_len: usize,
        lines: Vec<HunkLine>,
    }

    let mut hunks = Vec::new();
    let mut pending: Option<OpenHunk> = None;
    let flush = |pending: &mut Option<OpenHunk>, hunks: &mut Vec<Hunk>| {
        if let Some(open) = pending.take() {
            hunks.push(Hunk::new(
                open.old_start,
                open.old_len,
                open.new_start,
                open.new_len,
                open.lines,
            ));
        }
    };

    for line in text.lines() {
        if let Some(captures) = header.captures(line) {
            flush(&mut pending, &mut hunks);
            pending = Some(OpenHunk {
                old_start: capture_number(&captures, 1, 0),
                old_len: capture_number(&captures, 2, 1),
                new_start: capture_number(&captures, 3, 0),
                new_len: capture_number(&captures, 4, 1),
                lines: Vec::new(),
            });
            continue;
        }

        let Some(open) = pending.as_mut() else {
            continue;
        };
        if line.starts_with("---") || line.starts_with("+++") || line.starts_with('\\') {
            continue;
        }

        if let Some(added) = line.strip_prefix('+') {
            open.lines.push(HunkLine::Add(added.to_string()));
        } else if let Some(deleted) = line.strip_prefix('-') {
            open.lines.push(HunkLine::Delete(deleted.to_string()));
        } else if let Some(context) = line.strip_prefix(' ') {
            open.lines.push(HunkLine::Context(context.to_string()));
        } else if line.is_empty() {
            open.lines.push(HunkLine::Context(String::new()));
        }
        // anything else (diff --git, index, mode lines) is skipped
    }
    flush(&mut pending, &mut hunks);

    hunks
}

/// Tally `+`/`-` body lines of a unified-diff text
pub fn diff_stats(text: &str) -> UnifiedDiffStats {
    let mut stats = UnifiedDiffStats::default();
    for line in text.lines() {
        if line.starts_with('+') && !line.starts_with("+++") {
            stats.additions += 1;
        } else if line.starts_with('-') && !line.starts_with("---") {
            stats.deletions += 1;
        }
    }
    stats.changes = stats.additions + stats.deletions;
    stats
}

/// Recover the original/modified line content covered by the hunks
pub fn reconstruct(text: &str) -> ReconstructedSource {
    let mut original = Vec::new();
    let mut modified = Vec::new();

    for hunk in parse_unified_diff(text) {
        for line in hunk.lines() {
            match line {
                HunkLine::Context(text) => {
                    original.push(text.clone());
                    modified.push(text.clone());
                }
                HunkLine::Delete(text) => original.push(text.clone()),
                HunkLine::Add(text) => modified.push(text.clone()),
            }
        }
    }

    ReconstructedSource {
        original: original.join("\n"),
        modified: modified.join("\n"),
    }
}

/// Replay hunks against a target text
///
/// Hunks are taken in order with a running line offset, so the whole list
/// applies against one original snapshot. Context and delete lines must
/// match the target exactly.
pub fn apply_hunks(original: &str, hunks: &[Hunk]) -> Result<String, PatchError> {
    let mut lines = split_lines(original);
    let mut offset = 0isize;

    for hunk in hunks {
        let next = splice_hunk(&lines, hunk, offset)?;
        offset += next.len() as isize - lines.len() as isize;
        lines = next;
    }

    Ok(join_lines(&lines, original.ends_with('\n')))
}

/// Like [`apply_hunks`] but a mismatching hunk is skipped instead of
/// failing the whole replay. Returns the patched text and the skip count.
pub(crate) fn apply_hunks_lenient(original: &str, hunks: &[Hunk]) -> (String, usize) {
    let mut lines = split_lines(original);
    let mut offset = 0isize;
    let mut skipped = 0;

    for hunk in hunks {
        match splice_hunk(&lines, hunk, offset) {
            Ok(next) => {
                offset += next.len() as isize - lines.len() as isize;
                lines = next;
            }
            Err(_) => skipped += 1,
        }
    }

    (join_lines(&lines, original.ends_with('\n')), skipped)
}

fn splice_hunk(lines: &[String], hunk: &Hunk, offset: isize) -> Result<Vec<String>, PatchError> {
    let out_of_range = || PatchError::RangeOutOfBounds {
        start: hunk.old_start(),
        len: hunk.old_len(),
        target_len: lines.len(),
    };

    // a zero-length old side anchors AFTER old_start, everything else ON it
    let anchor = if hunk.old_len() == 0 {
        hunk.old_start() as isize
    } else {
        hunk.old_start() as isize - 1
    };
    let start = anchor
        .checked_add(offset)
        .and_then(|at| usize::try_from(at).ok())
        .ok_or_else(out_of_range)?;
    // the declared lengths come from foreign text and can be arbitrary
    if start.checked_add(hunk.old_len()).is_none_or(|end| end > lines.len()) {
        return Err(out_of_range());
    }

    let mut cursor = start;
    let mut replacement = Vec::with_capacity(hunk.lines().len());
    for line in hunk.lines() {
        match line {
            HunkLine::Context(expected) | HunkLine::Delete(expected) => {
                let found = lines.get(cursor).ok_or_else(out_of_range)?;
                if found != expected {
                    return Err(PatchError::ContextMismatch {
                        line: cursor + 1,
                        expected: expected.clone(),
                        found: found.clone(),
                    });
                }
                if matches!(line, HunkLine::Context(_)) {
                    replacement.push(expected.clone());
                }
                cursor += 1;
            }
            HunkLine::Add(added) => replacement.push(added.clone()),
        }
    }

    let mut next = lines[..start].to_vec();
    next.extend(replacement);
    next.extend_from_slice(&lines[cursor..]);
    Ok(next)
}

fn capture_number(captures: &regex::Captures<'_>, group: usize, default: usize) -> usize {
    captures
        .get(group)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(default)
}

/// Per-line view of an edit script with 1-based line numbers on each side
enum Element {
    Equal {
        old_line: usize,
        new_line: usize,
        text: String,
    },
    Delete {
        old_line: usize,
        text: String,
    },
    Insert {
        new_line: usize,
        text: String,
    },
}

impl Element {
    fn is_change(&self) -> bool {
        !matches!(self, Element::Equal { .. })
    }

    fn old_line(&self) -> Option<usize> {
        match self {
            Element::Equal { old_line, .. } | Element::Delete { old_line, .. } => Some(*old_line),
            Element::Insert { .. } => None,
        }
    }

    fn new_line(&self) -> Option<usize> {
        match self {
            Element::Equal { new_line, .. } | Element::Insert { new_line, .. } => Some(*new_line),
            Element::Delete { .. } => None,
        }
    }

    fn hunk_line(&self) -> HunkLine {
        match self {
            Element::Equal { text, .. } => HunkLine::Context(text.clone()),
            Element::Delete { text, .. } => HunkLine::Delete(text.clone()),
            Element::Insert { text, .. } => HunkLine::Add(text.clone()),
        }
    }
}

fn flatten(diff: &DiffResult) -> Vec<Element> {
    let mut elements = Vec::new();
    for change in diff.changes() {
        match change {
            Change::Equal {
                old_index,
                new_index,
                lines,
            } => {
                for (i, line) in lines.iter().enumerate() {
                    elements.push(Element::Equal {
                        old_line: old_index + i + 1,
                        new_line: new_index + i + 1,
                        text: line.clone(),
                    });
                }
            }
            Change::Delete { old_index, lines } => {
                for (i, line) in lines.iter().enumerate() {
                    elements.push(Element::Delete {
                        old_line: old_index + i + 1,
                        text: line.clone(),
                    });
                }
            }
            Change::Insert { new_index, lines } => {
                for (i, line) in lines.iter().enumerate() {
                    elements.push(Element::Insert {
                        new_line: new_index + i + 1,
                        text: line.clone(),
                    });
                }
            }
        }
    }
    elements
}

/// Merge change positions whose equal-line separation is within `proximity`
fn group_changes(changed: &[usize], proximity: usize) -> Vec<(usize, usize)> {
    let mut groups: Vec<(usize, usize)> = Vec::new();
    for &position in changed {
        match groups.last_mut() {
            Some((_, end)) if position - *end - 1 <= proximity => *end = position,
            _ => groups.push((position, position)),
        }
    }
    groups
}

fn build_hunks(elements: &[Element], groups: &[(usize, usize)], context: usize) -> Vec<Hunk> {
    let mut hunks = Vec::with_capacity(groups.len());
    let mut prev_end: Option<usize> = None;

    for (index, &(first, last)) in groups.iter().enumerate() {
        let mut start = first.saturating_sub(context);
        if let Some(end) = prev_end {
            start = start.max(end + 1);
        }
        let mut end = (last + context).min(elements.len() - 1);
        if let Some(&(next_first, _)) = groups.get(index + 1) {
            end = end.min(next_first - 1);
        }

        let slice = &elements[start..=end];
        let old_len = slice.iter().filter(|e| e.old_line().is_some()).count();
        let new_len = slice.iter().filter(|e| e.new_line().is_some()).count();
        let old_start = slice
            .iter()
            .find_map(Element::old_line)
            .unwrap_or_else(|| preceding(elements, start, Element::old_line));
        let new_start = slice
            .iter()
            .find_map(Element::new_line)
            .unwrap_or_else(|| preceding(elements, start, Element::new_line));

        hunks.push(Hunk::new(
            old_start,
            old_len,
            new_start,
            new_len,
            slice.iter().map(Element::hunk_line).collect(),
        ));
        prev_end = Some(end);
    }

    hunks
}

/// Line number of the nearest element before `start` on the given side,
/// or 0 when there is none (a zero-length side at the very top)
fn preceding(elements: &[Element], start: usize, side: fn(&Element) -> Option<usize>) -> usize {
    elements[..start].iter().rev().find_map(side).unwrap_or(0)
}
