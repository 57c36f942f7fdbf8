use crate::content::validate_file;
use deepdiff_common::{
    ChangeType, DiffError, FileComparison, FileStatus, Hunk, Result, Side, TextChange,
};
use encoding_rs::Encoding;
use similar::{capture_diff_slices, get_diff_ratio, group_diff_ops, Algorithm, DiffOp, DiffTag};
use std::fs;
use std::path::Path;

const BINARY_SAMPLE_BYTES: usize = 8192;

/// How to handle byte sequences the configured encoding cannot decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Substitute U+FFFD and continue. Graceful degradation, not an error.
    #[default]
    Replace,
    /// Fail the comparison with a decode error.
    Strict,
}

/// Look up an encoding by WHATWG label ("utf-8", "latin1", ...).
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| DiffError::Unsupported(format!("unknown encoding label '{label}'")))
}

/// Produces line-level diff hunks for modified text files.
///
/// Binary pairs (NUL byte within the first 8 KiB of either file) are
/// compared for byte equality only and never produce hunks.
pub struct TextComparator {
    context_lines: usize,
    encoding: &'static Encoding,
    decode_policy: DecodePolicy,
}

impl TextComparator {
    pub fn new(context_lines: usize) -> Self {
        Self {
            context_lines,
            encoding: encoding_rs::UTF_8,
            decode_policy: DecodePolicy::default(),
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    /// Compare two files; an empty `relative_path` falls back to the left
    /// file's name.
    pub fn compare(&self, left: &Path, right: &Path, relative_path: &str) -> Result<FileComparison> {
        validate_file(left, Side::Left)?;
        validate_file(right, Side::Right)?;

        let relative_path = if relative_path.is_empty() {
            left.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            relative_path.to_string()
        };

        let left_bytes = fs::read(left)?;
        let right_bytes = fs::read(right)?;

        if is_binary(&left_bytes) || is_binary(&right_bytes) {
            let (status, similarity) = if left_bytes == right_bytes {
                (FileStatus::Identical, Some(1.0))
            } else {
                (FileStatus::Modified, None)
            };
            return Ok(FileComparison {
                relative_path,
                status,
                left_path: Some(left.to_path_buf()),
                right_path: Some(right.to_path_buf()),
                hunks: Vec::new(),
                content_hash_left: None,
                content_hash_right: None,
                similarity,
            });
        }

        let left_text = self.decode(&left_bytes, left)?;
        let right_text = self.decode(&right_bytes, right)?;

        // Lines keep their terminators, so a missing trailing newline is
        // an observable difference.
        let left_lines = split_lines(&left_text);
        let right_lines = split_lines(&right_text);

        let ops = capture_diff_slices(Algorithm::Myers, &left_lines, &right_lines);
        let similarity = f64::from(get_diff_ratio(&ops, left_lines.len(), right_lines.len()));

        if ops.iter().all(|op| op.tag() == DiffTag::Equal) {
            return Ok(FileComparison {
                relative_path,
                status: FileStatus::Identical,
                left_path: Some(left.to_path_buf()),
                right_path: Some(right.to_path_buf()),
                hunks: Vec::new(),
                content_hash_left: None,
                content_hash_right: None,
                similarity: Some(1.0),
            });
        }

        let hunks = self.build_hunks(ops, &left_lines, &right_lines);
        Ok(FileComparison {
            relative_path,
            status: FileStatus::Modified,
            left_path: Some(left.to_path_buf()),
            right_path: Some(right.to_path_buf()),
            hunks,
            content_hash_left: None,
            content_hash_right: None,
            similarity: Some(similarity),
        })
    }

    fn decode(&self, bytes: &[u8], path: &Path) -> Result<String> {
        let (text, _, had_errors) = self.encoding.decode(bytes);
        if had_errors && self.decode_policy == DecodePolicy::Strict {
            return Err(DiffError::Decode {
                path: path.to_path_buf(),
                encoding: self.encoding.name().to_string(),
            });
        }
        Ok(text.into_owned())
    }

    fn build_hunks(&self, ops: Vec<DiffOp>, left_lines: &[&str], right_lines: &[&str]) -> Vec<Hunk> {
        group_diff_ops(ops, self.context_lines)
            .into_iter()
            .map(|group| {
                let first = group[0];
                let last = group[group.len() - 1];
                Hunk {
                    start_left: first.old_range().start + 1,
                    count_left: last.old_range().end - first.old_range().start,
                    start_right: first.new_range().start + 1,
                    count_right: last.new_range().end - first.new_range().start,
                    changes: build_changes(&group, left_lines, right_lines),
                }
            })
            .collect()
    }
}

fn is_binary(data: &[u8]) -> bool {
    data[..data.len().min(BINARY_SAMPLE_BYTES)].contains(&0)
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

fn build_changes(group: &[DiffOp], left_lines: &[&str], right_lines: &[&str]) -> Vec<TextChange> {
    let mut changes = Vec::new();

    for op in group {
        match op.tag() {
            DiffTag::Equal => {
                let new_start = op.new_range().start;
                for (offset, idx) in op.old_range().enumerate() {
                    changes.push(TextChange {
                        change_type: ChangeType::Equal,
                        content: left_lines[idx].to_string(),
                        line_left: Some(idx + 1),
                        line_right: Some(new_start + offset + 1),
                    });
                }
            }
            DiffTag::Delete => push_deletes(&mut changes, op.old_range(), left_lines),
            DiffTag::Insert => push_inserts(&mut changes, op.new_range(), right_lines),
            DiffTag::Replace => {
                // Deletions always precede insertions within a replaced
                // block; the two spans are never interleaved.
                push_deletes(&mut changes, op.old_range(), left_lines);
                push_inserts(&mut changes, op.new_range(), right_lines);
            }
        }
    }

    changes
}

fn push_deletes(changes: &mut Vec<TextChange>, range: std::ops::Range<usize>, lines: &[&str]) {
    for idx in range {
        changes.push(TextChange {
            change_type: ChangeType::Delete,
            content: lines[idx].to_string(),
            line_left: Some(idx + 1),
            line_right: None,
        });
    }
}

fn push_inserts(changes: &mut Vec<TextChange>, range: std::ops::Range<usize>, lines: &[&str]) {
    for idx in range {
        changes.push(TextChange {
            change_type: ChangeType::Insert,
            content: lines[idx].to_string(),
            line_left: None,
            line_right: Some(idx + 1),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn compare(left: &[u8], right: &[u8]) -> FileComparison {
        let temp = TempDir::new().unwrap();
        let l = write(&temp, "left", left);
        let r = write(&temp, "right", right);
        TextComparator::new(3).compare(&l, &r, "pair").unwrap()
    }

    #[test]
    fn identical_text_short_circuits_without_hunks() {
        let comp = compare(b"line 1\nline 2\n", b"line 1\nline 2\n");
        assert_eq!(comp.status, FileStatus::Identical);
        assert_eq!(comp.similarity, Some(1.0));
        assert!(comp.hunks.is_empty());
        assert!(comp.content_hash_left.is_none());
    }

    #[test]
    fn single_changed_line_produces_one_full_file_hunk() {
        let comp = compare(
            b"line 1\nline 2\nline 3\n",
            b"line 1\nchanged line 2\nline 3\n",
        );
        assert_eq!(comp.status, FileStatus::Modified);
        assert_eq!(comp.hunks.len(), 1);

        let hunk = &comp.hunks[0];
        assert_eq!(
            (hunk.start_left, hunk.count_left, hunk.start_right, hunk.count_right),
            (1, 3, 1, 3)
        );

        let tags: Vec<(ChangeType, &str)> = hunk
            .changes
            .iter()
            .map(|c| (c.change_type, c.content.as_str()))
            .collect();
        assert_eq!(
            tags,
            vec![
                (ChangeType::Equal, "line 1\n"),
                (ChangeType::Delete, "line 2\n"),
                (ChangeType::Insert, "changed line 2\n"),
                (ChangeType::Equal, "line 3\n"),
            ]
        );

        // 2 of 3 lines matched on each side: ratio = 2*2 / 6.
        let similarity = comp.similarity.unwrap();
        assert!((similarity - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn line_numbers_are_one_based_and_one_sided_for_changes() {
        let comp = compare(b"a\nb\nc\n", b"a\nB\nc\n");
        let hunk = &comp.hunks[0];

        let equal_first = &hunk.changes[0];
        assert_eq!(equal_first.line_left, Some(1));
        assert_eq!(equal_first.line_right, Some(1));

        let delete = &hunk.changes[1];
        assert_eq!(delete.change_type, ChangeType::Delete);
        assert_eq!(delete.line_left, Some(2));
        assert_eq!(delete.line_right, None);

        let insert = &hunk.changes[2];
        assert_eq!(insert.change_type, ChangeType::Insert);
        assert_eq!(insert.line_left, None);
        assert_eq!(insert.line_right, Some(2));
    }

    #[test]
    fn replace_block_emits_all_deletes_before_all_inserts() {
        let comp = compare(
            b"keep\nold 1\nold 2\nold 3\nkeep end\n",
            b"keep\nnew 1\nnew 2\nkeep end\n",
        );
        let hunk = &comp.hunks[0];
        let tags: Vec<ChangeType> = hunk.changes.iter().map(|c| c.change_type).collect();

        let first_insert = tags.iter().position(|t| *t == ChangeType::Insert).unwrap();
        let last_delete = tags.iter().rposition(|t| *t == ChangeType::Delete).unwrap();
        assert!(last_delete < first_insert, "deletes must precede inserts");
        assert!(tags.iter().all(|t| *t != ChangeType::Substitute));
    }

    #[test]
    fn distant_changes_split_into_separate_hunks() {
        let mut left = String::new();
        let mut right = String::new();
        for i in 0..40 {
            left.push_str(&format!("line {i}\n"));
            if i == 2 || i == 35 {
                right.push_str(&format!("changed {i}\n"));
            } else {
                right.push_str(&format!("line {i}\n"));
            }
        }
        let comp = compare(left.as_bytes(), right.as_bytes());
        assert_eq!(comp.hunks.len(), 2);

        // Context is clamped to at most 3 lines on either side of a change.
        let first = &comp.hunks[0];
        assert_eq!(first.start_left, 1);
        assert!(first.count_left <= 7);
    }

    #[test]
    fn missing_trailing_newline_is_a_difference() {
        let comp = compare(b"only line\n", b"only line");
        assert_eq!(comp.status, FileStatus::Modified);
        let hunk = &comp.hunks[0];
        assert_eq!(hunk.changes[0].content, "only line\n");
        assert_eq!(hunk.changes[1].content, "only line");
    }

    #[test]
    fn binary_pairs_never_produce_hunks() {
        let equal = compare(b"\x00\x01\x02", b"\x00\x01\x02");
        assert_eq!(equal.status, FileStatus::Identical);
        assert_eq!(equal.similarity, Some(1.0));
        assert!(equal.hunks.is_empty());

        let different = compare(b"\x00\x01\x02", b"\x00\x01\x03");
        assert_eq!(different.status, FileStatus::Modified);
        assert_eq!(different.similarity, None);
        assert!(different.hunks.is_empty());
    }

    #[test]
    fn one_binary_side_makes_the_pair_binary() {
        let comp = compare(b"plain text\n", b"text\x00with nul\n");
        assert_eq!(comp.status, FileStatus::Modified);
        assert!(comp.hunks.is_empty());
    }

    #[test]
    fn similarity_stays_within_bounds() {
        let comp = compare(b"a\nb\n", b"x\ny\nz\n");
        let similarity = comp.similarity.unwrap();
        assert!((0.0..=1.0).contains(&similarity));
        assert!(similarity < 1.0);
    }

    #[test]
    fn invalid_utf8_is_replaced_by_default() {
        let comp = compare(b"caf\xff\n", b"cafe\n");
        assert_eq!(comp.status, FileStatus::Modified);
        assert!(comp.hunks[0]
            .changes
            .iter()
            .any(|c| c.content.contains('\u{FFFD}')));
    }

    #[test]
    fn strict_decoding_fails_on_invalid_bytes() {
        let temp = TempDir::new().unwrap();
        let left = write(&temp, "left", b"caf\xff\n");
        let right = write(&temp, "right", b"cafe\n");

        let comparator = TextComparator::new(3).with_decode_policy(DecodePolicy::Strict);
        let err = comparator.compare(&left, &right, "pair").unwrap_err();
        assert!(matches!(err, DiffError::Decode { .. }));
    }

    #[test]
    fn alternate_encoding_decodes_via_label() {
        let temp = TempDir::new().unwrap();
        // "café" in latin1 on both sides.
        let left = write(&temp, "left", b"caf\xe9\n");
        let right = write(&temp, "right", b"caf\xe9\n");

        let encoding = encoding_for_label("latin1").unwrap();
        let comp = TextComparator::new(3)
            .with_encoding(encoding)
            .compare(&left, &right, "pair")
            .unwrap();
        assert_eq!(comp.status, FileStatus::Identical);
    }

    #[test]
    fn unknown_encoding_label_is_unsupported() {
        assert!(matches!(
            encoding_for_label("definitely-not-an-encoding"),
            Err(DiffError::Unsupported(_))
        ));
    }

    #[test]
    fn empty_files_are_identical() {
        let comp = compare(b"", b"");
        assert_eq!(comp.status, FileStatus::Identical);
        assert_eq!(comp.similarity, Some(1.0));
    }
}
