mod git;
mod render;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use deepdiff_common::{load_config, DiffDepth, DiffError, HashAlgorithm};
use deepdiff_core::{encoding_for_label, Comparator, DecodePolicy};
use git::{GitError, GitResolver};
use render::{HtmlRenderer, JsonRenderer, Renderer, TextRenderer};
use std::io::{stdout, IsTerminal, Write};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: u8 = 1;
const EXIT_USAGE: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DepthArg {
    Structure,
    Content,
    Text,
}

impl From<DepthArg> for DiffDepth {
    fn from(depth: DepthArg) -> Self {
        match depth {
            DepthArg::Structure => DiffDepth::Structure,
            DepthArg::Content => DiffDepth::Content,
            DepthArg::Text => DiffDepth::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Html,
}

/// Compare two directory trees, files, or git refs.
///
/// Arguments are plain paths or `git:REF` (branch, tag, or commit); git
/// refs are extracted into temporary trees before comparison.
#[derive(Debug, Parser)]
#[command(name = "deepdiff", version, about)]
struct Cli {
    /// Left side: path or git:REF
    left: String,

    /// Right side: path or git:REF
    right: String,

    /// Comparison depth (auto-detected from the argument types by default)
    #[arg(short, long, value_enum)]
    depth: Option<DepthArg>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Do not honor .gitignore files when scanning
    #[arg(long)]
    no_gitignore: bool,

    /// Include hidden files and directories
    #[arg(long)]
    hidden: bool,

    /// Only compare files matching this glob (repeatable)
    #[arg(short = 'I', long = "include", value_name = "GLOB")]
    include: Vec<String>,

    /// Skip files matching this glob (repeatable)
    #[arg(short = 'E', long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Print summary statistics only
    #[arg(long)]
    stat: bool,

    /// Hash algorithm for content depth (sha256, sha512, md5, blake3)
    #[arg(long, value_name = "ALGO")]
    hash: Option<String>,

    /// Context lines around text changes
    #[arg(short = 'C', long, value_name = "N")]
    context: Option<usize>,

    /// Text encoding label (e.g. utf-8, latin1)
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,

    /// Fail on undecodable bytes instead of replacing them
    #[arg(long)]
    strict_decode: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Prefer a config file next to the executable
    #[arg(long)]
    portable_config: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

/// Input errors exit with 2, everything else with 1.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<GitError>().is_some() {
        return EXIT_USAGE;
    }
    match err.downcast_ref::<DiffError>() {
        Some(
            DiffError::PathNotFound { .. }
            | DiffError::NotADirectory(_)
            | DiffError::IsADirectory { .. }
            | DiffError::MixedPathTypes { .. }
            | DiffError::Pattern { .. }
            | DiffError::Unsupported(_),
        ) => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let loaded = load_config(cli.portable_config)?;
    debug!(
        "config: {} ({})",
        loaded.path.display(),
        if loaded.exists { "loaded" } else { "defaults" }
    );
    let mut config = loaded.config;

    if cli.no_gitignore {
        config.respect_gitignore = false;
    }
    if cli.hidden {
        config.include_hidden = true;
    }
    config.include_patterns.extend(cli.include.iter().cloned());
    config.exclude_patterns.extend(cli.exclude.iter().cloned());
    if let Some(hash) = &cli.hash {
        config.hash_algorithm = hash.parse::<HashAlgorithm>()?;
    }
    if let Some(context) = cli.context {
        config.context_lines = context;
    }

    let mut comparator = Comparator::new()
        .with_filter_config(config.filter_config())
        .with_hash_algorithm(config.hash_algorithm)
        .with_context_lines(config.context_lines);
    if let Some(depth) = cli.depth {
        comparator = comparator.with_depth(depth.into());
    }
    if let Some(label) = &cli.encoding {
        comparator = comparator.with_encoding(encoding_for_label(label)?);
    }
    if cli.strict_decode {
        comparator = comparator.with_decode_policy(DecodePolicy::Strict);
    }

    // The resolver owns any temp trees extracted from git refs; it must
    // stay alive until rendering finishes.
    let mut resolver = GitResolver::new(None);
    let (left, right) = resolver.resolve_pair(&cli.left, &cli.right)?;

    let result = comparator
        .compare(&left, &right)
        .with_context(|| format!("comparing '{}' and '{}'", cli.left, cli.right))?;

    let out = stdout();
    let color = !cli.no_color && out.is_terminal();
    let mut renderer: Box<dyn Renderer> = match cli.output {
        OutputFormat::Text => Box::new(TextRenderer::new(out.lock(), color)),
        OutputFormat::Json => Box::new(JsonRenderer::new(out.lock())),
        OutputFormat::Html => Box::new(
            HtmlRenderer::new(out.lock())
                .with_title(format!("{} vs {}", cli.left, cli.right)),
        ),
    };

    if cli.stat {
        renderer.render_stats(&result.stats)?;
    } else {
        renderer.render(&result)?;
    }
    stdout().flush()?;
    Ok(())
}
