//! chessvision CLI: build boards from configs and export occlusion datasets.

use chessvision::board::{
    Board, BoardCreateConfig, DltEstimator, OcclusionDatasetReport, SquareFeatureParams,
};
use chessvision::image_io;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "chessvision")]
#[command(about = "Map photographed chessboards onto their squares and export occlusion datasets")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit structured JSON logs (requires the `tracing` feature).
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a board from an image and point correspondences, then save it.
    Create {
        /// JSON config with the image path and the correspondences.
        #[arg(long)]
        config: PathBuf,

        /// Where to write the saved board (overrides the config).
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Label a saved board from an occlusion file and export features + labels.
    Dataset {
        /// Saved board JSON.
        #[arg(long)]
        board: PathBuf,

        /// Occlusion annotation: 8 lines of 8 whitespace-separated labels.
        #[arg(long)]
        occlusions: PathBuf,

        /// Report path (default: `<board name>_dataset.json`).
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        features: FeatureArgs,
    },

    /// Print a saved board's correspondences and square layout.
    Info {
        /// Saved board JSON.
        #[arg(long)]
        board: PathBuf,

        #[command(flatten)]
        features: FeatureArgs,
    },
}

/// Square feature settings; saved boards do not record them, so pass the
/// values the board was created with.
#[derive(Debug, Clone, Args)]
struct FeatureArgs {
    /// Side of the warped square patch, in pixels.
    #[arg(long, default_value_t = SquareFeatureParams::default().patch_px)]
    patch_px: usize,

    /// Number of intensity histogram bins.
    #[arg(long, default_value_t = SquareFeatureParams::default().histogram_bins)]
    histogram_bins: usize,
}

impl FeatureArgs {
    fn to_params(&self) -> SquareFeatureParams {
        SquareFeatureParams {
            patch_px: self.patch_px,
            histogram_bins: self.histogram_bins,
        }
    }

    fn load_board(&self, path: &Path) -> CliResult<Board> {
        Ok(Board::load_json_with(path, &DltEstimator, &self.to_params())?)
    }
}

fn init_logging(verbose: u8, json: bool) -> CliResult<()> {
    let level = chessvision::core::level_from_verbosity(verbose);
    #[cfg(feature = "tracing")]
    {
        chessvision::core::init_tracing(json, level);
        // No-op when the subscriber already bridged `log`.
        let _ = tracing_log::LogTracer::init();
        Ok(())
    }
    #[cfg(not(feature = "tracing"))]
    {
        if json {
            return Err("--log-json requires the `tracing` feature".into());
        }
        chessvision::core::init_with_level(level)?;
        Ok(())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    init_logging(cli.verbose, cli.log_json)?;

    match cli.command {
        Commands::Create { config, output } => run_create(&config, output),
        Commands::Dataset {
            board,
            occlusions,
            output,
            features,
        } => run_dataset(&board, &occlusions, output, &features),
        Commands::Info { board, features } => run_info(&board, &features),
    }
}

fn run_create(config_path: &Path, output: Option<PathBuf>) -> CliResult<()> {
    let cfg = BoardCreateConfig::load_json(config_path)?;
    log::info!("creating board from {}", cfg.image_path);
    let board = image_io::board_from_config(&cfg)?;

    let out = output.unwrap_or_else(|| cfg.output_path());
    board.save_json(&out)?;
    println!("saved board {} to {}", board.name(), out.display());
    Ok(())
}

fn run_dataset(
    board_path: &Path,
    occlusions: &Path,
    output: Option<PathBuf>,
    features: &FeatureArgs,
) -> CliResult<()> {
    let mut board = features.load_board(board_path)?;
    board.add_occlusions_from_file(occlusions)?;
    let report = OcclusionDatasetReport::from_board(&board)?;

    let out = output.unwrap_or_else(|| PathBuf::from(format!("{}_dataset.json", board.name())));
    report.write_json(&out)?;
    println!(
        "wrote {} samples ({} features each) to {}",
        report.labels.len(),
        report.feature_len,
        out.display()
    );
    Ok(())
}

fn run_info(board_path: &Path, features: &FeatureArgs) -> CliResult<()> {
    let board = features.load_board(board_path)?;
    let image = board.image();
    println!("board: {}", board.name());
    println!("image: {}x{}", image.width, image.height);
    println!(
        "features per square: {}",
        board.feature_params().feature_len()
    );
    if let Some(summary) = board.correspondence_summary() {
        println!("{summary}");
    }
    print!("{}", board.grid());
    Ok(())
}
