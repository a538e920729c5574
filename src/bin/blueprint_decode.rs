//! CLI front-end for the blueprint library decoder (SPEC_FULL.md §4.J).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Decode a factory-automation game's personal blueprint library file to JSON.
#[derive(Parser, Debug)]
#[command(name = "blueprint-decode", version)]
struct Args {
    /// Skip blueprints that fail to decode instead of aborting the whole file.
    #[arg(short = 's', long = "skip-bad")]
    skip_bad: bool,

    /// Increase log verbosity; repeat for more detail (-v, -vv, -vvv).
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Enable debug-mode tracing (threaded through as a span field; the
    /// core decoder's behavior is otherwise unaffected).
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Include migrations and the prototype table in the JSON output.
    #[arg(short = 'x', long = "extended")]
    extended: bool,

    /// Path to the library file.
    #[arg(default_value = "blueprint-storage.dat")]
    path: PathBuf,
}

fn verbosity_filter(level: u8) -> &'static str {
    match level {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(verbosity_filter(args.verbose))),
        )
        .with_writer(std::io::stderr)
        .init();

    let _debug_span = tracing::info_span!("blueprint_decode", debug = args.debug).entered();

    let data = match std::fs::read(&args.path) {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(path = %args.path.display(), error = %e, "failed to read library file");
            return ExitCode::FAILURE;
        }
    };

    let filename = args.path.to_string_lossy().into_owned();
    let result = blueprint_decoder::decode_library_bytes(&data, &filename, args.skip_bad, args.extended);

    match result {
        Ok(decoded) => match serde_json::to_writer_pretty(std::io::stdout(), &decoded.document) {
            Ok(()) => {
                println!();
                if decoded.skipped > 0 {
                    tracing::warn!(skipped = decoded.skipped, "skipped blueprints while decoding");
                    ExitCode::from(2)
                } else {
                    ExitCode::SUCCESS
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize output");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "fatal parse failure");
            ExitCode::FAILURE
        }
    }
}
