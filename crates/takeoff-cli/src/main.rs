mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "takeoff",
    version,
    about = "Cable tray takeoff from containment drawings"
)]
struct Cli {
    /// Log progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure tray runs on one page of a PDF drawing
    Extract {
        /// Path to the drawing PDF
        pdf_file: PathBuf,

        /// Page to measure (1-based)
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Drawing scale, e.g. 100 or 1:100 (default: detected from the drawing)
        #[arg(long, value_name = "RATIO")]
        scale: Option<String>,

        /// Paper size A0-A4 (default: detected from the drawing)
        #[arg(long, value_name = "SIZE")]
        paper: Option<String>,

        /// Engine config JSON file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the result as JSON to a file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Write an SVG overlay of the measured runs
        #[arg(long, value_name = "FILE")]
        overlay: Option<PathBuf>,
    },
    /// Estimate cable for a saved takeoff result
    Cable {
        /// Result JSON written by `extract --out`
        result_file: PathBuf,

        /// Tray type to include (LV, FA, ...) or "all"
        #[arg(long, value_name = "TYPE")]
        filter: Option<String>,

        /// Tray duty rating: light, medium or heavy
        #[arg(long, value_name = "DUTY")]
        duty: Option<String>,

        /// Cable allowance per drop, metres
        #[arg(long, value_name = "METRES")]
        drop_metres: Option<String>,

        /// Run from tray to first point, metres per circuit
        #[arg(long, value_name = "METRES")]
        first_point_metres: Option<String>,

        /// Number of circuits pulled along the tray
        #[arg(long, value_name = "N")]
        circuits: Option<u32>,

        /// Extra cable on top of the subtotal, percent
        #[arg(long, value_name = "PERCENT")]
        additional_percent: Option<String>,

        /// Engine config JSON file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Render the SVG overlay for a saved takeoff result
    Overlay {
        /// Result JSON written by `extract --out`
        result_file: PathBuf,

        /// SVG file to write
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: PathBuf,
    },
    /// Measure coloured vector runs from pre-extracted page paths
    Vector {
        /// Page paths JSON (page_width, page_height, text, paths)
        paths_file: PathBuf,

        /// Drawing scale, e.g. 100 or 1:100 (default: detected from page text)
        #[arg(long, value_name = "RATIO")]
        scale: Option<String>,

        /// Paper size A0-A4 (default: detected from page text)
        #[arg(long, value_name = "SIZE")]
        paper: Option<String>,

        /// Engine config JSON file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Print the default engine configuration as JSON
    Config,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            pdf_file,
            page,
            scale,
            paper,
            config,
            output,
            out,
            overlay,
        } => commands::extract::run(commands::extract::ExtractArgs {
            pdf_file,
            page,
            scale,
            paper,
            config,
            output_format: output,
            out,
            overlay,
        }),
        Commands::Cable {
            result_file,
            filter,
            duty,
            drop_metres,
            first_point_metres,
            circuits,
            additional_percent,
            config,
            output,
        } => commands::cable::run(commands::cable::CableArgs {
            result_file,
            filter,
            duty,
            drop_metres,
            first_point_metres,
            circuits,
            additional_percent,
            config,
            output_format: output,
        }),
        Commands::Overlay { result_file, out } => commands::overlay::run(&result_file, &out),
        Commands::Vector {
            paths_file,
            scale,
            paper,
            config,
            output,
        } => commands::vector::run(paths_file, scale, paper, config, &output),
        Commands::Config => commands::config::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
