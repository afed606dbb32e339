use crate::artifacts::diff::DiffResult;
use crate::artifacts::diff::engine::{compute, compute_patience, stats};
use crate::artifacts::unified::codec::hunks_of;
use crate::artifacts::unified::{HunkLine, UnifiedOptions};
use crate::commands::Console;
use anyhow::Context;
use colored::Colorize;
use std::io::Write;
use std::path::Path;

impl Console {
    pub fn diff(
        &self,
        old: &Path,
        new: &Path,
        options: &UnifiedOptions,
        patience: bool,
        stat: bool,
    ) -> anyhow::Result<()> {
        let original = std::fs::read_to_string(old)
            .with_context(|| format!("could not read {}", old.display()))?;
        let modified = std::fs::read_to_string(new)
            .with_context(|| format!("could not read {}", new.display()))?;

        let diff = if patience {
            compute_patience(&original, &modified)
        } else {
            compute(&original, &modified)
        };

        if stat {
            let tallies = stats(&diff);
            writeln!(
                self.writer(),
                "{} additions, {} deletions",
                tallies.additions, tallies.deletions
            )?;
            return Ok(());
        }

        if diff.is_identity() {
            writeln!(
                self.writer(),
                "files {} and {} are identical",
                old.display(),
                new.display()
            )?;
            return Ok(());
        }

        self.print_unified(&diff, old, new, options)
    }

    fn print_unified(
        &self,
        diff: &DiffResult,
        old: &Path,
        new: &Path,
        options: &UnifiedOptions,
    ) -> anyhow::Result<()> {
        writeln!(
            self.writer(),
            "{}",
            format!("--- a/{}", old.display()).bold()
        )?;
        writeln!(
            self.writer(),
            "{}",
            format!("+++ b/{}", new.display()).bold()
        )?;

        for hunk in hunks_of(diff, options) {
            writeln!(self.writer(), "{}", hunk.header().cyan())?;
            for line in hunk.lines() {
                match line {
                    HunkLine::Add(_) => writeln!(self.writer(), "{}", line.to_string().green())?,
                    HunkLine::Delete(_) => writeln!(self.writer(), "{}", line.to_string().red())?,
                    HunkLine::Context(_) => writeln!(self.writer(), "{line}")?,
                }
            }
        }

        Ok(())
    }
}
