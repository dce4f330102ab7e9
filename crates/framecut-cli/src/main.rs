use clap::{Parser, Subcommand};
use flexi_logger::{Logger, LoggerHandle};
use framecut_cli::{
    apply_overrides, load_calibration, parse_margin, parse_output_format, parse_prefix,
    parse_threads, resolve_config, ExtractOverrides,
};
use framecut_core::OutputFormat;
use std::path::PathBuf;

mod commands;

use commands::{
    cmd_detect, cmd_extract, cmd_perf_stats, cmd_profile_list, cmd_profile_save,
    cmd_profile_show,
};

#[derive(Parser)]
#[command(name = "framecut")]
#[command(version, about = "Perforation-calibrated 35mm frame extractor", long_about = None)]
struct Cli {
    /// Log per-stage details
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (overrides FRAMECUT_CONFIG and the default locations)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect frame boxes and print them without writing crops
    Detect {
        /// Input files or directories
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Detection profile (built-in or user profile name)
        #[arg(short, long, value_name = "NAME")]
        profile: Option<String>,

        /// Precomputed perforation statistics (JSON from `perf-stats`)
        #[arg(long, value_name = "FILE")]
        perf_stats: Option<PathBuf>,

        /// Scan directories recursively
        #[arg(short, long)]
        recursive: bool,

        /// Print the detections as JSON
        #[arg(long)]
        json: bool,
    },

    /// Measure perforations and emit their statistics as JSON
    PerfStats {
        /// Input file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Write the JSON here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Detection profile (built-in or user profile name)
        #[arg(short, long, value_name = "NAME")]
        profile: Option<String>,
    },

    /// Detect frames and save each one as an image
    Extract {
        /// Input files or directories
        #[arg(value_name = "INPUT", required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory (default: ./output)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Detection profile (built-in or user profile name)
        #[arg(short, long, value_name = "NAME")]
        profile: Option<String>,

        /// Precomputed perforation statistics (JSON from `perf-stats`)
        #[arg(long, value_name = "FILE")]
        perf_stats: Option<PathBuf>,

        /// Output format: jpeg, png or tiff
        #[arg(short, long, value_name = "FORMAT", value_parser = parse_output_format)]
        format: Option<OutputFormat>,

        /// Prefix prepended to every crop name
        #[arg(long, value_name = "PREFIX", value_parser = parse_prefix)]
        prefix: Option<String>,

        /// Pixels added around every box before clamping
        #[arg(long, value_name = "PIXELS", value_parser = parse_margin)]
        margin: Option<u32>,

        /// Number of parallel threads
        #[arg(short = 'j', long, value_name = "N", value_parser = parse_threads)]
        threads: Option<usize>,

        /// Scan directories recursively
        #[arg(short, long)]
        recursive: bool,
    },

    /// Manage detection profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// List built-in and user profiles
    List {
        /// Profile directory (default: ~/framecut/profiles)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Print a profile as YAML
    Show {
        /// Profile name
        #[arg(value_name = "NAME")]
        name: String,

        /// Profile directory (default: ~/framecut/profiles)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },

    /// Save the active configuration as a user profile
    Save {
        /// Profile name
        #[arg(value_name = "NAME")]
        name: String,

        /// Start from this profile instead of the loaded configuration
        #[arg(long, value_name = "PROFILE")]
        from: Option<String>,

        /// Profile directory (default: ~/framecut/profiles)
        #[arg(short, long, value_name = "DIR")]
        dir: Option<PathBuf>,

        /// Overwrite an existing profile
        #[arg(long)]
        force: bool,
    },
}

fn init_logging(verbose: bool) -> Result<LoggerHandle, String> {
    let level = if verbose { "debug" } else { "info" };
    Logger::try_with_env_or_str(level)
        .map_err(|e| format!("Invalid log specification: {}", e))?
        .log_to_stderr()
        .start()
        .map_err(|e| format!("Logger initialization failed: {}", e))
}

fn main() {
    let cli = Cli::parse();

    let _logger = match init_logging(cli.verbose) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Warning: {}", e);
            None
        }
    };

    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Detect {
            inputs,
            profile,
            perf_stats,
            recursive,
            json,
        } => resolve_config(config_path, profile.as_deref()).and_then(|config| {
            let calibration = load_calibration(perf_stats.as_deref())?;
            cmd_detect(inputs, recursive, &config, &calibration, json)
        }),

        Commands::PerfStats {
            input,
            out,
            profile,
        } => resolve_config(config_path, profile.as_deref())
            .and_then(|config| cmd_perf_stats(input, &config, out)),

        Commands::Extract {
            inputs,
            out,
            profile,
            perf_stats,
            format,
            prefix,
            margin,
            threads,
            recursive,
        } => resolve_config(config_path, profile.as_deref()).and_then(|config| {
            let config = apply_overrides(
                config,
                ExtractOverrides {
                    format,
                    prefix,
                    margin,
                },
            );
            let calibration = load_calibration(perf_stats.as_deref())?;
            cmd_extract(inputs, out, recursive, threads, &config, &calibration)
        }),

        Commands::Profile { action } => match action {
            ProfileAction::List { dir } => cmd_profile_list(dir),
            ProfileAction::Show { name, dir } => cmd_profile_show(name, dir),
            ProfileAction::Save {
                name,
                from,
                dir,
                force,
            } => resolve_config(config_path, from.as_deref())
                .and_then(|config| cmd_profile_save(name, &config, dir, force)),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
