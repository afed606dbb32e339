use crate::artifacts::unified::codec::diff_stats;
use crate::commands::Console;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

impl Console {
    pub fn stats(&self, patch: &Path) -> anyhow::Result<()> {
        let text = std::fs::read_to_string(patch)
            .with_context(|| format!("could not read {}", patch.display()))?;

        let stats = diff_stats(&text);
        writeln!(
            self.writer(),
            "{} additions, {} deletions, {} changes",
            stats.additions,
            stats.deletions,
            stats.changes
        )?;

        Ok(())
    }
}
