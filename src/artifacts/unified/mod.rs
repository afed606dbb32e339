//! Unified-diff wire format
//!
//! [`Hunk`] and [`HunkLine`] model the `@@`-delimited blocks of a unified
//! diff. [`codec`] renders, parses and applies them.

pub mod codec;

use derive_new::new;
use std::fmt::{self, Display, Formatter};

/// One `@@`-delimited block of a unified diff
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Hunk {
    old_start: usize,
    old_len: usize,
    new_start: usize,
    new_len: usize,
    lines: Vec<HunkLine>,
}

impl Hunk {
    pub fn old_start(&self) -> usize {
        self.old_start
    }

    pub fn old_len(&self) -> usize {
        self.old_len
    }

    pub fn new_start(&self) -> usize {
        self.new_start
    }

    pub fn new_len(&self) -> usize {
        self.new_len
    }

    pub fn lines(&self) -> &[HunkLine] {
        &self.lines
    }

    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_len, self.new_start, self.new_len
        )
    }
}

/// One prefixed body line inside a hunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Add(String),
    Delete(String),
}

impl HunkLine {
    pub fn content(&self) -> &str {
        match self {
            HunkLine::Context(text) | HunkLine::Add(text) | HunkLine::Delete(text) => text,
        }
    }
}

impl Display for HunkLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HunkLine::Context(text) => write!(f, " {text}"),
            HunkLine::Add(text) => write!(f, "+{text}"),
            HunkLine::Delete(text) => write!(f, "-{text}"),
        }
    }
}

/// Rendering knobs for [`codec::create_unified_diff`]
///
/// `context` is the number of unchanged lines kept on each side of a hunk.
/// `proximity` is the grouping threshold: changed runs separated by at most
/// this many unchanged lines share a hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnifiedOptions {
    context: usize,
    proximity: usize,
}

impl Default for UnifiedOptions {
    fn default() -> Self {
        Self {
            context: 3,
            proximity: 3,
        }
    }
}

impl UnifiedOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_context(&mut self, context: usize) -> &mut Self {
        self.context = context;
        self
    }

    pub fn set_proximity(&mut self, proximity: usize) -> &mut Self {
        self.proximity = proximity;
        self
    }

    pub fn context(&self) -> usize {
        self.context
    }

    pub fn proximity(&self) -> usize {
        self.proximity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hunk_header_carries_both_ranges() {
        let hunk = Hunk::new(3, 2, 4, 5, Vec::new());
        assert_eq!(hunk.header(), "@@ -3,2 +4,5 @@");
    }

    #[test]
    fn hunk_lines_render_with_their_prefix() {
        assert_eq!(HunkLine::Context("a".to_string()).to_string(), " a");
        assert_eq!(HunkLine::Add("b".to_string()).to_string(), "+b");
        assert_eq!(HunkLine::Delete("c".to_string()).to_string(), "-c");
    }

    #[test]
    fn options_build_fluently() {
        let mut options = UnifiedOptions::new();
        options.set_context(1).set_proximity(6);

        assert_eq!(options.context(), 1);
        assert_eq!(options.proximity(), 6);
    }
}
