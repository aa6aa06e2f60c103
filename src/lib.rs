//! Thermalprep: turn a thermal-imagery bounding-box table into a YOLO dataset.
//!
//! A single CSV table lists pixel-space boxes for images kept in two pools
//! (`Positive/` with objects, `Negative/` without). Thermalprep normalizes
//! every box into YOLO label lines, splits the whole corpus deterministically
//! into train/val/test, and lays out `images/` + `labels/` directories with a
//! dataset descriptor a detector trainer can read.
//!
//! # Modules
//!
//! - [`table`]: annotation table reader
//! - [`pool`]: image pools, filename resolution and corpus enumeration
//! - [`geom`]: pixel and normalized boxes
//! - [`labels`]: per-image label aggregation
//! - [`split`]: seeded train/val/test partitioning
//! - [`materialize`]: split directory layout
//! - [`manifest`]: `classes.txt` and the dataset descriptor
//! - [`codec`]: image dimensions and RGB conversion
//! - [`pipeline`]: the end-to-end run
//! - [`error`]: error types for thermalprep operations

pub mod codec;
pub mod config;
pub mod error;
pub mod geom;
pub mod labels;
pub mod logging;
pub mod manifest;
pub mod materialize;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod split;
pub mod table;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use codec::{FsCodec, ImageFormat};
use config::{
    BoxPolicy, PipelineConfig, SplitConfig, DEFAULT_MANIFEST_NAME, DEFAULT_NEGATIVE_DIR,
    DEFAULT_POSITIVE_DIR, DEFAULT_SEED, DEFAULT_TABLE_NAME, DEFAULT_TEST_FRACTION,
    DEFAULT_TRAIN_FRACTION,
};
use logging::LogConfig;
use pool::{Pool, PoolKind};
use report::PrepareReport;

pub use error::PrepError;

/// The thermalprep CLI application.
#[derive(Parser)]
#[command(name = "thermalprep")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Show debug diagnostics on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only show errors on stderr.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build a YOLO dataset from an annotation table and image pools.
    Prepare(PrepareArgs),
    /// Rewrite every image under the given directories as 3-channel RGB.
    Rgb(RgbArgs),
    /// Convert pool images to one format without building a dataset.
    Convert(ConvertArgs),
}

/// Pool directory names, relative to the data directory.
#[derive(clap::Args)]
struct PoolArgs {
    /// Directory of images containing objects.
    #[arg(long, default_value = DEFAULT_POSITIVE_DIR)]
    positive: String,

    /// Directory of background images.
    #[arg(long, default_value = DEFAULT_NEGATIVE_DIR)]
    negative: String,
}

impl PoolArgs {
    fn pools(&self, data_dir: &std::path::Path) -> Vec<Pool> {
        vec![
            Pool::new(data_dir.join(&self.positive), PoolKind::Positive),
            Pool::new(data_dir.join(&self.negative), PoolKind::Negative),
        ]
    }
}

/// Arguments for the prepare subcommand.
#[derive(clap::Args)]
struct PrepareArgs {
    /// Directory holding the annotation table and the image pools.
    data_dir: PathBuf,

    /// Annotation table (default: '<DATA_DIR>/Bounding Box Label.csv').
    #[arg(long)]
    table: Option<PathBuf>,

    /// Output root for images/, labels/ and the descriptor (default: DATA_DIR).
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    pools: PoolArgs,

    /// Seed for the train/val/test shuffle.
    #[arg(long, env = "THERMALPREP_SEED", default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Share of the corpus assigned to train.
    #[arg(long, default_value_t = DEFAULT_TRAIN_FRACTION)]
    train_fraction: f64,

    /// Share of the non-train remainder assigned to test.
    #[arg(long, default_value_t = DEFAULT_TEST_FRACTION)]
    test_fraction: f64,

    /// Convert pool images to this format before preparing.
    #[arg(long, value_enum)]
    convert_to: Option<ImageFormat>,

    /// Keep the original files after --convert-to.
    #[arg(long)]
    keep_originals: bool,

    /// How to treat boxes that reach outside their image.
    #[arg(long, value_enum, default_value_t = BoxPolicy::Warn)]
    box_policy: BoxPolicy,

    /// File name of the dataset descriptor written under the output root.
    #[arg(long, default_value = DEFAULT_MANIFEST_NAME)]
    manifest_name: String,

    /// Keep the intermediate all_labels/ directory.
    #[arg(long)]
    keep_staging: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

/// Arguments for the rgb subcommand.
#[derive(clap::Args)]
struct RgbArgs {
    /// Directories to walk recursively.
    #[arg(required = true)]
    dirs: Vec<PathBuf>,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory holding the image pools.
    data_dir: PathBuf,

    /// Target image format.
    #[arg(long, value_enum, default_value_t = ImageFormat::Png)]
    to: ImageFormat,

    #[command(flatten)]
    pools: PoolArgs,

    /// Keep the original files next to the converted ones.
    #[arg(long)]
    keep_originals: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

/// Report rendering selected with `--report`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    fn parse(value: &str) -> Result<Self, PrepError> {
        match value {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(PrepError::UnsupportedFormat(format!(
                "report format '{}' (supported: text, json)",
                other
            ))),
        }
    }
}

/// Run the thermalprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PrepError> {
    let cli = Cli::parse();

    if let Err(message) = logging::init_logging(&LogConfig::from_flags(cli.verbose, cli.quiet)) {
        eprintln!("Warning: {message}");
    }

    match cli.command {
        Some(Commands::Prepare(args)) => run_prepare(args),
        Some(Commands::Rgb(args)) => run_rgb(args),
        Some(Commands::Convert(args)) => run_convert(args),
        None => {
            println!("thermalprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Prepare thermal-imagery bounding-box datasets for YOLO-style detectors.");
            println!();
            println!("Run 'thermalprep --help' for usage information.");
            Ok(())
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<(), PrepError> {
    // Reject a bad --report before any output is written.
    let format = ReportFormat::parse(&args.report)?;

    let mut config = PipelineConfig::for_data_dir(&args.data_dir);
    config.table_path = args
        .table
        .unwrap_or_else(|| args.data_dir.join(DEFAULT_TABLE_NAME));
    config.pools = args.pools.pools(&args.data_dir);
    if let Some(output) = args.output {
        config.output_root = output;
    }
    config.split = SplitConfig {
        seed: args.seed,
        train_fraction: args.train_fraction,
        test_fraction: args.test_fraction,
    };
    config.box_policy = args.box_policy;
    config.target_format = args.convert_to;
    config.keep_originals = args.keep_originals;
    config.manifest_name = args.manifest_name;
    config.keep_staging = args.keep_staging;

    let report = pipeline::prepare(&config, &FsCodec)?;

    match format {
        ReportFormat::Json => print_json(&report)?,
        ReportFormat::Text => {
            println!("Prepared dataset in {}:", config.output_root.display());
            print!("{}", report);
        }
    }
    Ok(())
}

fn run_rgb(args: RgbArgs) -> Result<(), PrepError> {
    let format = ReportFormat::parse(&args.report)?;

    let mut report = PrepareReport::new();
    let converted = codec::convert_dirs_to_rgb(&args.dirs, &FsCodec, &mut report)?;
    print_conversion(format, converted, &report)
}

fn run_convert(args: ConvertArgs) -> Result<(), PrepError> {
    let format = ReportFormat::parse(&args.report)?;

    let pools = args.pools.pools(&args.data_dir);
    let mut report = PrepareReport::new();
    let converted =
        codec::convert_pools(&pools, args.to, args.keep_originals, &FsCodec, &mut report)?;
    print_conversion(format, converted, &report)
}

fn print_conversion(
    format: ReportFormat,
    converted: usize,
    report: &PrepareReport,
) -> Result<(), PrepError> {
    match format {
        ReportFormat::Json => print_json(report),
        ReportFormat::Text => {
            println!("Converted {} image(s)", converted);
            print!("{}", report.issues_summary());
            Ok(())
        }
    }
}

fn print_json(report: &PrepareReport) -> Result<(), PrepError> {
    let json = serde_json::to_string_pretty(report).map_err(PrepError::ReportJson)?;
    println!("{}", json);
    Ok(())
}
