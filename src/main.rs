//! beatcut CLI entry point

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use beatcut::cancel::CancelToken;
use beatcut::config::{Cli, Settings};
use beatcut::pipeline;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli);

    // Build settings from CLI
    let settings = Settings::from_cli(&cli);

    // Validate inputs
    if let Err(e) = validate_inputs(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let cancel = CancelToken::new();

    match pipeline::run(&settings, &cancel) {
        Ok(result) => {
            println!();
            if let Some(path) = &result.plan_path {
                println!(
                    "Summary: {:.1} BPM, {} beats, {} events from {} clips ({} discovered)",
                    result.bpm,
                    result.beat_count,
                    result.event_count,
                    result.usable_clips,
                    result.discovered_clips
                );
                println!("Edit plan: {}", path.display());
                println!("Seed: {} (pass --seed {} to reproduce this cut)", result.seed, result.seed);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = if cli.quiet { "error" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn validate_inputs(cli: &Cli) -> Result<(), String> {
    if !cli.audio.exists() {
        return Err(format!(
            "Audio file does not exist: {}\n\n  Tip: Check the path is correct and accessible.\n  Example: beatcut -a ~/Music/track.mp3 -c ./footage -o ./out",
            cli.audio.display()
        ));
    }

    if !cli.clips.exists() {
        return Err(format!(
            "Clips path does not exist: {}\n\n  Tip: Point --clips at a directory of video files with '<file>.json' sidecars.",
            cli.clips.display()
        ));
    }

    // The output directory itself is created automatically
    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(format!(
                "Output parent directory does not exist: {}\n\n  Tip: The output directory will be created automatically,\n  but its parent directory must exist.\n  Example: mkdir -p {}",
                parent.display(),
                parent.display()
            ));
        }
    }

    Ok(())
}
