use crate::artifacts::unified::codec::{apply_hunks, parse_unified_diff};
use crate::commands::Console;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

impl Console {
    pub fn apply(&self, target: &Path, patch: &Path, output: Option<&Path>) -> anyhow::Result<()> {
        let original = std::fs::read_to_string(target)
            .with_context(|| format!("could not read {}", target.display()))?;
        let patch_text = std::fs::read_to_string(patch)
            .with_context(|| format!("could not read {}", patch.display()))?;

        let hunks = parse_unified_diff(&patch_text);
        if hunks.is_empty() {
            anyhow::bail!("no hunks found in {}", patch.display());
        }

        let patched = apply_hunks(&original, &hunks).with_context(|| {
            format!(
                "could not apply {} to {}",
                patch.display(),
                target.display()
            )
        })?;

        match output {
            Some(path) => {
                std::fs::write(path, patched)
                    .with_context(|| format!("could not write {}", path.display()))?;
                writeln!(
                    self.writer(),
                    "patched {} -> {}",
                    target.display(),
                    path.display()
                )?;
            }
            None => write!(self.writer(), "{patched}")?,
        }

        Ok(())
    }
}
