//! drumless CLI entry point

use clap::Parser;
use drumless::config::{Cli, Settings};
use drumless::engine::check_dependencies;
use drumless::pipeline;
use std::io;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli);

    if let Err(e) = validate_inputs(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = check_dependencies() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    // Ask whatever the flags did not answer
    let stdin = io::stdin();
    let settings = match Settings::from_cli(&cli, &mut stdin.lock(), &mut io::stdout()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Run the pipeline
    match pipeline::run(&settings) {
        Ok(result) => {
            if result.total_files == 0 {
                println!("No supported audio files found in {}", settings.root.display());
                return ExitCode::SUCCESS;
            }

            println!();
            println!(
                "Summary: {} drumless, {} skipped (of {} total)",
                result.successful, result.skipped, result.total_files
            );
            if settings.context.create_normalised {
                println!("  {} normalised MP3s", result.normalised.len());
            }
            info!("All processing complete");

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_target(false)
        .init();
}

fn validate_inputs(cli: &Cli) -> Result<(), String> {
    if !cli.dir.is_dir() {
        return Err(format!(
            "Folder does not exist: {}\n\n  Tip: Check the path is correct and accessible.\n  Example:\n    drumless --dir ~/Music/Album",
            cli.dir.display()
        ));
    }
    Ok(())
}
