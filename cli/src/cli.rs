use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use squeezer_core::{CompressOptions, Mode, ResultKind};

/// Compress images by racing several encoders and keeping the smallest result
#[derive(Debug, Parser)]
#[command(name = "squeezer", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Keep dimensions, only re-encode
    KeepSize,
    /// Allow resizing via target/max dimensions
    KeepQuality,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::KeepSize => Mode::KeepSize,
            ModeArg::KeepQuality => Mode::KeepQuality,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compress images
    Compress {
        /// Input file or directory
        input: PathBuf,

        /// Output file or directory (default: overwrite in-place)
        output: Option<PathBuf>,

        /// Quality 0.0–1.0
        #[arg(short, long, default_value_t = 0.6, value_parser = parse_quality)]
        quality: f32,

        #[arg(short, long, value_enum, default_value_t = ModeArg::KeepSize)]
        mode: ModeArg,

        /// Exact output width (keep-quality only)
        #[arg(long)]
        target_width: Option<u32>,

        /// Exact output height (keep-quality only)
        #[arg(long)]
        target_height: Option<u32>,

        /// Upper bound on output width (keep-quality only)
        #[arg(long)]
        max_width: Option<u32>,

        /// Upper bound on output height (keep-quality only)
        #[arg(long)]
        max_height: Option<u32>,

        /// Only use strategies that keep EXIF metadata
        #[arg(long)]
        preserve_exif: bool,

        /// Process directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Create .bak backup before overwriting
        #[arg(long)]
        backup: bool,

        /// Show what would be done without writing files
        #[arg(long)]
        dry_run: bool,

        /// Print per-strategy telemetry as JSON for each file
        #[arg(long)]
        report: bool,
    },

    /// List the compression strategies and what they support
    Strategies,
}

fn parse_quality(s: &str) -> Result<f32, String> {
    let q: f32 = s.parse().map_err(|_| format!("not a number: {s}"))?;
    if (0.0..=1.0).contains(&q) {
        Ok(q)
    } else {
        Err(format!("quality must be within 0.0..=1.0, got {q}"))
    }
}

/// Build core options from the `compress` arguments. The comparison report
/// is always requested: the batch summary needs the winning strategy.
pub fn to_options(
    quality: f32,
    mode: ModeArg,
    target_width: Option<u32>,
    target_height: Option<u32>,
    max_width: Option<u32>,
    max_height: Option<u32>,
    preserve_exif: bool,
) -> CompressOptions {
    CompressOptions {
        quality,
        mode: mode.into(),
        target_width,
        target_height,
        max_width,
        max_height,
        preserve_exif,
        return_all_results: true,
        result_kind: ResultKind::Blob,
    }
}
