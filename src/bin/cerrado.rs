use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use cerrado_cover_wasm::{AcquisitionMode, AnalysisConfig, AnalysisError, analyze_bytes, encode_masks, map_bytes, validate_bytes};
use anyhow::Context;
use anyhow::Result;
use log::{error, info};

/// Classify Cerrado terrain cover from field photographs.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON configuration file (command-line flags override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Longest side after downscaling
    #[arg(short = 's', long, global = true)]
    max_side: Option<u32>,

    /// Output directory for masks / overlays
    #[arg(short = 'd', long, global = true)]
    out_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Whole-image cover percentages, texture and rupestre hypothesis
    Analyze {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Handheld, oblique capture (suppresses sky-as-rock)
        #[arg(long)]
        close_range: bool,
    },
    /// Stricter Lab + roughness rock validation
    Validate {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Grid map of phytophysiognomies
    Map {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Cells per side
        #[arg(short, long)]
        grid_size: Option<u32>,

        /// Waterlogged soil observed in the field
        #[arg(long)]
        wet: bool,

        /// Rock outcrops observed in the field
        #[arg(long)]
        rocks: bool,
    },
}

fn write_output(dir: &Path, input: &Path, suffix: &str, bytes: &[u8]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let out_path = dir.join(format!("{stem}_{suffix}.png"));
    fs::write(&out_path, bytes)?;
    info!("Saved → {}", out_path.display());
    Ok(())
}

/// Log a caller-facing explanation before propagating an analysis failure.
fn explain<T>(input: &Path, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        if let Some(analysis_err) = err.downcast_ref::<AnalysisError>() {
            error!("{}: {}", input.display(), analysis_err.user_message());
        }
    }
    result
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(cap) = args.max_side {
        config.max_side = cap;
    }

    match &args.command {
        Command::Analyze { inputs, close_range } => {
            if *close_range {
                config.mode = AcquisitionMode::CloseRange;
            }
            for input in inputs {
                let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
                let analysis = explain(input, analyze_bytes(&bytes, &config))?;
                println!("{}", serde_json::to_string_pretty(&analysis.summary)?);

                if let Some(dir) = &args.out_dir {
                    let [veg, soil, rock] = encode_masks(&analysis.masks)?;
                    write_output(dir, input, "vegetation", &veg)?;
                    write_output(dir, input, "soil", &soil)?;
                    write_output(dir, input, "rock", &rock)?;
                }
            }
        }
        Command::Validate { inputs } => {
            for input in inputs {
                let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
                let result = explain(input, validate_bytes(&bytes, &config))?;
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
        Command::Map { inputs, grid_size, wet, rocks } => {
            if let Some(n) = grid_size {
                config.grid_size = *n;
            }
            config.wet_context |= *wet;
            config.rock_override |= *rocks;
            for input in inputs {
                let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
                let (grid, overlay) = explain(input, map_bytes(&bytes, &config))?;
                println!("{}", serde_json::to_string_pretty(&grid)?);

                if let Some(dir) = &args.out_dir {
                    write_output(dir, input, "overlay", &overlay)?;
                }
            }
        }
    }

    Ok(())
}
