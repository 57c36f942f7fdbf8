use crate::content::ContentComparator;
use crate::structure::StructureComparator;
use crate::text::{DecodePolicy, TextComparator};
use deepdiff_common::{
    DiffDepth, DiffError, DiffResult, DiffStats, FileComparison, FilterConfig, HashAlgorithm,
    Result, Side,
};
use encoding_rs::Encoding;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Orchestrates the comparison pipeline: depth resolution, the structure
/// pass, and per-file content/text enrichment.
///
/// Built once per invocation; all defaults are explicit fields, never
/// hidden module state.
pub struct Comparator {
    depth: Option<DiffDepth>,
    filter_config: FilterConfig,
    context_lines: usize,
    hash_algorithm: HashAlgorithm,
    encoding: &'static Encoding,
    decode_policy: DecodePolicy,
}

impl Comparator {
    pub fn new() -> Self {
        Self {
            depth: None,
            filter_config: FilterConfig::default(),
            context_lines: 3,
            hash_algorithm: HashAlgorithm::default(),
            encoding: encoding_rs::UTF_8,
            decode_policy: DecodePolicy::default(),
        }
    }

    /// Fix the depth explicitly instead of auto-detecting it.
    pub fn with_depth(mut self, depth: DiffDepth) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_filter_config(mut self, config: FilterConfig) -> Self {
        self.filter_config = config;
        self
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    /// Run the pipeline. Any comparator-level error aborts the whole run;
    /// there is no partial-result mode and no retry.
    pub fn compare(&self, left: &Path, right: &Path) -> Result<DiffResult> {
        if !left.exists() {
            return Err(DiffError::PathNotFound {
                side: Side::Left,
                path: left.to_path_buf(),
            });
        }
        if !right.exists() {
            return Err(DiffError::PathNotFound {
                side: Side::Right,
                path: right.to_path_buf(),
            });
        }

        let left = left.canonicalize()?;
        let right = right.canonicalize()?;

        let depth = self.resolve_depth(&left, &right)?;
        info!(
            "comparing {} vs {} at {depth} depth",
            left.display(),
            right.display()
        );

        let comparisons = match depth {
            DiffDepth::Structure => {
                StructureComparator::new(&self.filter_config)?.compare(&left, &right)?
            }
            DiffDepth::Content => {
                let content = ContentComparator::new(self.hash_algorithm);
                self.run_enriched(&left, &right, |l, r, rel| content.compare(l, r, rel))?
            }
            DiffDepth::Text => {
                let text = TextComparator::new(self.context_lines)
                    .with_encoding(self.encoding)
                    .with_decode_policy(self.decode_policy);
                self.run_enriched(&left, &right, |l, r, rel| text.compare(l, r, rel))?
            }
        };

        let stats = DiffStats::from_comparisons(&comparisons);
        debug!(
            "finished: {} files ({} modified, {} added, {} removed)",
            stats.total_files, stats.modified, stats.added, stats.removed
        );

        Ok(DiffResult {
            left_root: left,
            right_root: right,
            depth,
            comparisons,
            stats,
        })
    }

    fn resolve_depth(&self, left: &Path, right: &Path) -> Result<DiffDepth> {
        if let Some(depth) = self.depth {
            return Ok(depth);
        }

        let left_is_dir = left.is_dir();
        let right_is_dir = right.is_dir();
        match (left_is_dir, right_is_dir) {
            (true, true) => Ok(DiffDepth::Structure),
            (false, false) => Ok(DiffDepth::Text),
            _ => {
                let kind = |is_dir: bool| if is_dir { "directory" } else { "file" };
                Err(DiffError::MixedPathTypes {
                    left: left.to_path_buf(),
                    left_kind: kind(left_is_dir),
                    right: right.to_path_buf(),
                    right_kind: kind(right_is_dir),
                })
            }
        }
    }

    /// Structure pass fanned out into per-pair enrichment, or a bare pair
    /// comparison when both inputs are plain files.
    ///
    /// The fan-out key is "both paths present", not the status value; the
    /// two coincide at structure depth but the coupling is deliberate.
    fn run_enriched<F>(&self, left: &Path, right: &Path, compare_pair: F) -> Result<Vec<FileComparison>>
    where
        F: Fn(&Path, &Path, &str) -> Result<FileComparison> + Sync,
    {
        if left.is_file() && right.is_file() {
            return Ok(vec![compare_pair(left, right, "")?]);
        }

        let structural = StructureComparator::new(&self.filter_config)?.compare(left, right)?;

        // Each pair's classification is independent; the input is already
        // sorted and the ordered collect preserves that order.
        structural
            .into_par_iter()
            .map(|fc| {
                let pair: Option<(PathBuf, PathBuf)> =
                    match (fc.left_path.as_deref(), fc.right_path.as_deref()) {
                        (Some(l), Some(r)) => Some((l.to_path_buf(), r.to_path_buf())),
                        _ => None,
                    };
                match pair {
                    Some((l, r)) => compare_pair(&l, &r, &fc.relative_path),
                    None => Ok(fc),
                }
            })
            .collect()
    }
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new()
    }
}
