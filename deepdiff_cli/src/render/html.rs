use super::{truncate_hash, Renderer};
use anyhow::Result;
use deepdiff_common::{ChangeType, DiffDepth, DiffResult, DiffStats, FileStatus};
use std::io::Write;

const STYLE: &str = r#"
body { font-family: -apple-system, 'Segoe UI', sans-serif; margin: 2em; color: #222; }
h1 { font-size: 1.4em; }
table { border-collapse: collapse; margin: 1em 0; }
th, td { border: 1px solid #ccc; padding: 0.3em 0.8em; text-align: left; }
th { background: #f0f0f0; }
.added { color: #1a7f37; }
.removed { color: #cf222e; }
.modified { color: #9a6700; }
.identical { color: #888; }
pre.diff { background: #f6f8fa; border: 1px solid #ddd; padding: 0.8em; overflow-x: auto; }
pre.diff .hunk { color: #0550ae; }
pre.diff .del { background: #ffebe9; }
pre.diff .ins { background: #dafbe1; }
"#;

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn status_class(status: FileStatus) -> &'static str {
    match status {
        FileStatus::Added => "added",
        FileStatus::Removed => "removed",
        FileStatus::Modified => "modified",
        FileStatus::Identical => "identical",
    }
}

/// Renders a self-contained HTML report with embedded styling.
pub struct HtmlRenderer<W: Write> {
    out: W,
    title: String,
}

impl<W: Write> HtmlRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            title: "deepdiff report".to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn write_header(&mut self) -> Result<()> {
        writeln!(self.out, "<!DOCTYPE html>")?;
        writeln!(self.out, "<html lang=\"en\"><head>")?;
        writeln!(self.out, "<meta charset=\"utf-8\">")?;
        writeln!(self.out, "<title>{}</title>", escape(&self.title))?;
        writeln!(self.out, "<style>{STYLE}</style>")?;
        writeln!(self.out, "</head><body>")?;
        writeln!(self.out, "<h1>{}</h1>", escape(&self.title))?;
        Ok(())
    }

    fn write_footer(&mut self) -> Result<()> {
        writeln!(self.out, "</body></html>")?;
        Ok(())
    }

    fn write_stats_table(&mut self, stats: &DiffStats) -> Result<()> {
        writeln!(self.out, "<table>")?;
        writeln!(
            self.out,
            "<tr><th>Total</th><th>Added</th><th>Removed</th><th>Modified</th><th>Identical</th></tr>"
        )?;
        writeln!(
            self.out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            stats.total_files, stats.added, stats.removed, stats.modified, stats.identical
        )?;
        writeln!(self.out, "</table>")?;
        Ok(())
    }

    fn write_comparison_table(&mut self, result: &DiffResult) -> Result<()> {
        let with_hashes = result.depth == DiffDepth::Content;
        writeln!(self.out, "<table>")?;
        if with_hashes {
            writeln!(
                self.out,
                "<tr><th>File</th><th>Status</th><th>Left hash</th><th>Right hash</th></tr>"
            )?;
        } else {
            writeln!(self.out, "<tr><th>File</th><th>Status</th></tr>")?;
        }
        for comp in &result.comparisons {
            write!(
                self.out,
                "<tr class=\"{}\"><td>{}</td><td>{}</td>",
                status_class(comp.status),
                escape(&comp.relative_path),
                comp.status
            )?;
            if with_hashes {
                write!(
                    self.out,
                    "<td><code>{}</code></td><td><code>{}</code></td>",
                    escape(truncate_hash(comp.content_hash_left.as_deref())),
                    escape(truncate_hash(comp.content_hash_right.as_deref())),
                )?;
            }
            writeln!(self.out, "</tr>")?;
        }
        writeln!(self.out, "</table>")?;
        Ok(())
    }

    fn write_diffs(&mut self, result: &DiffResult) -> Result<()> {
        for comp in &result.comparisons {
            if comp.status != FileStatus::Modified || comp.hunks.is_empty() {
                continue;
            }
            let similarity = comp
                .similarity
                .map(|ratio| format!(" ({:.0}% similar)", ratio * 100.0))
                .unwrap_or_default();
            writeln!(
                self.out,
                "<h2>{}{}</h2>",
                escape(&comp.relative_path),
                escape(&similarity)
            )?;
            writeln!(self.out, "<pre class=\"diff\">")?;
            for hunk in &comp.hunks {
                writeln!(
                    self.out,
                    "<span class=\"hunk\">@@ -{},{} +{},{} @@</span>",
                    hunk.start_left, hunk.count_left, hunk.start_right, hunk.count_right
                )?;
                for change in &hunk.changes {
                    let mut content = change.content.clone();
                    if !content.ends_with('\n') {
                        content.push('\n');
                    }
                    let content = escape(&content);
                    match change.change_type {
                        ChangeType::Delete => {
                            write!(self.out, "<span class=\"del\">-{content}</span>")?
                        }
                        ChangeType::Insert => {
                            write!(self.out, "<span class=\"ins\">+{content}</span>")?
                        }
                        _ => write!(self.out, " {content}")?,
                    }
                }
            }
            writeln!(self.out, "</pre>")?;
        }
        Ok(())
    }
}

impl<W: Write> Renderer for HtmlRenderer<W> {
    fn render(&mut self, result: &DiffResult) -> Result<()> {
        self.write_header()?;
        writeln!(
            self.out,
            "<p><code>{}</code> vs <code>{}</code> ({} depth)</p>",
            escape(&result.left_root.display().to_string()),
            escape(&result.right_root.display().to_string()),
            result.depth
        )?;
        self.write_stats_table(&result.stats)?;
        self.write_comparison_table(result)?;
        if result.depth == DiffDepth::Text {
            self.write_diffs(result)?;
        }
        self.write_footer()
    }

    fn render_stats(&mut self, stats: &DiffStats) -> Result<()> {
        self.write_header()?;
        self.write_stats_table(stats)?;
        self.write_footer()
    }
}
