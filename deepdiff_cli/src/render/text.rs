use super::{truncate_hash, Renderer};
use anyhow::Result;
use deepdiff_common::{
    ChangeType, DiffDepth, DiffResult, DiffStats, FileComparison, FileStatus,
};
use std::io::Write;

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";

fn status_prefix(status: FileStatus) -> char {
    match status {
        FileStatus::Added => '+',
        FileStatus::Removed => '-',
        FileStatus::Modified => '~',
        FileStatus::Identical => ' ',
    }
}

fn status_color(status: FileStatus) -> &'static str {
    match status {
        FileStatus::Added => GREEN,
        FileStatus::Removed => RED,
        FileStatus::Modified => YELLOW,
        FileStatus::Identical => DIM,
    }
}

fn root_label(root: &std::path::Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

/// Console renderer with depth-appropriate formatting: an indented tree
/// for structure, a hash table for content, unified diffs for text.
pub struct TextRenderer<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn render_structure(&mut self, result: &DiffResult) -> Result<()> {
        writeln!(
            self.out,
            "{} vs {}",
            root_label(&result.left_root),
            root_label(&result.right_root)
        )?;

        // Comparisons are sorted, so directory headers can be emitted by
        // tracking the currently open directory chain.
        let mut open_dirs: Vec<String> = Vec::new();
        for comp in &result.comparisons {
            let parts: Vec<&str> = comp.relative_path.split('/').collect();
            // split('/') always yields at least one element.
            let Some((name, dirs)) = parts.split_last() else {
                continue;
            };

            let common = open_dirs
                .iter()
                .zip(dirs.iter())
                .take_while(|(open, dir)| open.as_str() == **dir)
                .count();
            open_dirs.truncate(common);
            for dir in &dirs[common..] {
                let indent = "  ".repeat(open_dirs.len());
                writeln!(self.out, "{indent}{dir}/")?;
                open_dirs.push((*dir).to_string());
            }

            let indent = "  ".repeat(open_dirs.len());
            let line = format!("{} {name}", status_prefix(comp.status));
            let line = self.paint(&line, status_color(comp.status));
            writeln!(self.out, "{indent}{line}")?;
        }
        Ok(())
    }

    fn render_content(&mut self, result: &DiffResult) -> Result<()> {
        writeln!(
            self.out,
            "{} vs {}",
            root_label(&result.left_root),
            root_label(&result.right_root)
        )?;

        let path_width = result
            .comparisons
            .iter()
            .map(|c| c.relative_path.len())
            .chain(std::iter::once("File".len()))
            .max()
            .unwrap_or(4);

        writeln!(
            self.out,
            "{:<path_width$}  {:<11}  {:<8}  {:<8}",
            "File", "Status", "Left", "Right"
        )?;
        for comp in &result.comparisons {
            let status = format!("{} {}", status_prefix(comp.status), comp.status);
            let line = format!(
                "{:<path_width$}  {:<11}  {:<8}  {:<8}",
                comp.relative_path,
                status,
                truncate_hash(comp.content_hash_left.as_deref()),
                truncate_hash(comp.content_hash_right.as_deref()),
            );
            let line = self.paint(&line, status_color(comp.status));
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    fn render_text_depth(&mut self, result: &DiffResult) -> Result<()> {
        writeln!(
            self.out,
            "{} vs {}",
            root_label(&result.left_root),
            root_label(&result.right_root)
        )?;
        writeln!(self.out)?;

        for comp in &result.comparisons {
            match comp.status {
                FileStatus::Identical => {
                    let line = format!("  {} (identical)", comp.relative_path);
                    let line = self.paint(&line, DIM);
                    writeln!(self.out, "{line}")?;
                }
                FileStatus::Added => {
                    let line = format!("+ {} (added)", comp.relative_path);
                    let line = self.paint(&line, GREEN);
                    writeln!(self.out, "{line}")?;
                }
                FileStatus::Removed => {
                    let line = format!("- {} (removed)", comp.relative_path);
                    let line = self.paint(&line, RED);
                    writeln!(self.out, "{line}")?;
                }
                FileStatus::Modified if !comp.hunks.is_empty() => self.render_hunks(comp)?,
                FileStatus::Modified => {
                    let line = format!("~ {} (binary, modified)", comp.relative_path);
                    let line = self.paint(&line, YELLOW);
                    writeln!(self.out, "{line}")?;
                }
            }
        }
        Ok(())
    }

    fn render_hunks(&mut self, comp: &FileComparison) -> Result<()> {
        let similarity = comp
            .similarity
            .map(|ratio| format!(" ({:.0}% similar)", ratio * 100.0))
            .unwrap_or_default();
        let header = format!("~ {}{similarity}", comp.relative_path);
        let header = self.paint(&header, YELLOW);
        writeln!(self.out, "{header}")?;

        for hunk in &comp.hunks {
            let hunk_header = format!(
                "@@ -{},{} +{},{} @@",
                hunk.start_left, hunk.count_left, hunk.start_right, hunk.count_right
            );
            let hunk_header = self.paint(&hunk_header, CYAN);
            writeln!(self.out, "{hunk_header}")?;

            for change in &hunk.changes {
                let mut content = change.content.clone();
                if !content.ends_with('\n') {
                    content.push('\n');
                }
                let (prefix, code) = match change.change_type {
                    ChangeType::Delete => ('-', RED),
                    ChangeType::Insert => ('+', GREEN),
                    _ => (' ', DIM),
                };
                let line = format!("{prefix}{content}");
                let line = self.paint(&line, code);
                write!(self.out, "{line}")?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, result: &DiffResult) -> Result<()> {
        match result.depth {
            DiffDepth::Structure => self.render_structure(result),
            DiffDepth::Content => self.render_content(result),
            DiffDepth::Text => self.render_text_depth(result),
        }
    }

    fn render_stats(&mut self, stats: &DiffStats) -> Result<()> {
        writeln!(
            self.out,
            "{} files compared: {} added, {} removed, {} modified, {} identical",
            stats.total_files, stats.added, stats.removed, stats.modified, stats.identical
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepdiff_common::{FileComparison, Hunk, TextChange};
    use std::path::PathBuf;

    fn render_to_string(result: &DiffResult) -> String {
        let mut buffer = Vec::new();
        TextRenderer::new(&mut buffer, false).render(result).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn structural(path: &str, status: FileStatus) -> FileComparison {
        FileComparison::structural(
            path.to_string(),
            status,
            Some(PathBuf::from("/left").join(path)),
            Some(PathBuf::from("/right").join(path)),
        )
    }

    #[test]
    fn structure_tree_nests_directories() {
        let comparisons = vec![
            structural("common.txt", FileStatus::Identical),
            structural("sub/nested.txt", FileStatus::Added),
        ];
        let result = DiffResult {
            left_root: PathBuf::from("/tmp/left"),
            right_root: PathBuf::from("/tmp/right"),
            depth: DiffDepth::Structure,
            stats: DiffStats::from_comparisons(&comparisons),
            comparisons,
        };

        let output = render_to_string(&result);
        assert!(output.starts_with("left vs right\n"));
        assert!(output.contains("  common.txt"));
        assert!(output.contains("sub/"));
        assert!(output.contains("  + nested.txt"));
    }

    #[test]
    fn text_depth_prints_unified_hunk_headers() {
        let comparisons = vec![FileComparison {
            relative_path: "a.txt".to_string(),
            status: FileStatus::Modified,
            left_path: Some(PathBuf::from("/left/a.txt")),
            right_path: Some(PathBuf::from("/right/a.txt")),
            hunks: vec![Hunk {
                start_left: 1,
                count_left: 2,
                start_right: 1,
                count_right: 2,
                changes: vec![
                    TextChange {
                        change_type: ChangeType::Delete,
                        content: "old\n".to_string(),
                        line_left: Some(1),
                        line_right: None,
                    },
                    TextChange {
                        change_type: ChangeType::Insert,
                        content: "new\n".to_string(),
                        line_left: None,
                        line_right: Some(1),
                    },
                ],
            }],
            content_hash_left: None,
            content_hash_right: None,
            similarity: Some(0.5),
        }];
        let result = DiffResult {
            left_root: PathBuf::from("/left"),
            right_root: PathBuf::from("/right"),
            depth: DiffDepth::Text,
            stats: DiffStats::from_comparisons(&comparisons),
            comparisons,
        };

        let output = render_to_string(&result);
        assert!(output.contains("~ a.txt (50% similar)"));
        assert!(output.contains("@@ -1,2 +1,2 @@"));
        assert!(output.contains("-old\n"));
        assert!(output.contains("+new\n"));
    }

    #[test]
    fn stats_line_lists_every_bucket() {
        let stats = DiffStats {
            total_files: 4,
            identical: 2,
            modified: 0,
            added: 1,
            removed: 1,
        };
        let mut buffer = Vec::new();
        TextRenderer::new(&mut buffer, false)
            .render_stats(&stats)
            .unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "4 files compared: 1 added, 1 removed, 0 modified, 2 identical\n"
        );
    }
}
