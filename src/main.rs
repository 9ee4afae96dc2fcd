use anyhow::{Context, Result};
use clap::Parser;
use keyshift::{Mode, Note, TransposeConfig, TransposePipeline, TransposeReport};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "keyshift")]
#[command(about = "Detect the key of a recording and transpose it to another key", long_about = None)]
struct Args {
    /// Input audio file (anything symphonia can decode)
    input: String,

    /// Target key root: C, C#, D, D#, E, F, F#, G, G#, A, A# or B (no flats)
    #[arg(short = 't', long, required_unless_present = "analyze_only")]
    target: Option<String>,

    /// Mode of the original piece; play a scale along with the song to check
    #[arg(short = 'm', long, default_value = "major")]
    mode: String,

    /// Original key if already known (e.g. "E" or "E minor"); skips detection
    #[arg(long, conflicts_with = "analyze_only")]
    original: Option<String>,

    /// Output WAV path (default: "<input> - shifted.wav" next to the input)
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Search major and minor keys instead of only the given mode
    #[arg(long)]
    both_modes: bool,

    /// Only detect the key, don't write anything
    #[arg(long)]
    analyze_only: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Expand ~ in paths
    let input = PathBuf::from(shellexpand::tilde(&args.input).as_ref());
    let output = match &args.output {
        Some(path) => PathBuf::from(shellexpand::tilde(path).as_ref()),
        None => default_output(&input),
    };

    let mode: Mode = args.mode.parse().context("Invalid --mode")?;
    let mut config = TransposeConfig::new(input, output)
        .with_mode(mode)
        .with_both_modes(args.both_modes);

    if !args.analyze_only {
        let target = args
            .target
            .as_deref()
            .context("--target is required unless --analyze-only is given")?;
        let target: Note = target.parse().context("Invalid --target")?;
        config = config.with_target(target);
    }
    if let Some(original) = args.original {
        config = config.with_original_key(original);
    }

    let pipeline = TransposePipeline::new(config).context("Invalid analysis configuration")?;
    let report = pipeline
        .run()
        .with_context(|| format!("Key shift failed for {:?}", pipeline.config().input))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{} - shifted.wav", stem))
}

fn print_report(report: &TransposeReport) {
    match &report.estimate {
        Some(estimate) => println!(
            "Detected key: {} (correlation {:.3})",
            estimate.key, estimate.correlation
        ),
        None => println!("Original key: {}", report.original),
    }
    if let (Some(semitones), Some(target)) = (report.semitones, report.target) {
        println!("Shifted by {:+} semitones to reach {}.", semitones, target);
    }
    if let Some(output) = &report.output {
        println!("Output: {}", output.display());
    }
}
