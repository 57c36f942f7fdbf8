use super::Renderer;
use anyhow::Result;
use deepdiff_common::{DiffResult, DiffStats};
use std::io::Write;

/// Serializes the full result (or just the stats) as pretty JSON.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn render(&mut self, result: &DiffResult) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, result)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn render_stats(&mut self, stats: &DiffStats) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, stats)?;
        writeln!(self.out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepdiff_common::{DiffDepth, FileComparison, FileStatus};
    use std::path::PathBuf;

    #[test]
    fn output_is_valid_json_with_string_enums() {
        let comparisons = vec![FileComparison::structural(
            "new.txt".to_string(),
            FileStatus::Added,
            None,
            Some(PathBuf::from("/right/new.txt")),
        )];
        let result = DiffResult {
            left_root: PathBuf::from("/left"),
            right_root: PathBuf::from("/right"),
            depth: DiffDepth::Structure,
            stats: DiffStats::from_comparisons(&comparisons),
            comparisons,
        };

        let mut buffer = Vec::new();
        JsonRenderer::new(&mut buffer).render(&result).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["depth"], "structure");
        assert_eq!(value["stats"]["added"], 1);
        assert!(value["comparisons"][0]["left_path"].is_null());
    }

    #[test]
    fn stats_mode_emits_only_the_summary() {
        let stats = DiffStats {
            total_files: 3,
            identical: 1,
            modified: 1,
            added: 1,
            removed: 0,
        };

        let mut buffer = Vec::new();
        JsonRenderer::new(&mut buffer).render_stats(&stats).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["total_files"], 3);
        assert!(value.get("comparisons").is_none());
    }
}
