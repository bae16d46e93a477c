//! PaperForge CLI - bridge interface for the web backend
//!
//! Commands: styles, validate, layout, generate
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation/generation failure

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use paperforge_core::{EngineConfig, ExportRequest, GenerationError, GenerationPipeline};

#[derive(Parser)]
#[command(name = "paperforge-cli")]
#[command(about = "PaperForge CLI - IEEE Document Assembly & Layout Engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to an engine config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the style catalog
    Styles,

    /// Validate an export request
    Validate {
        /// Export request JSON file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the layout blocks of an export request
    Layout {
        /// Export request JSON file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Generate the .docx package
    Generate {
        /// Export request JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output path (defaults to a name derived from the title)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to encode output: {}", e),
    }
}

fn failure(error: &GenerationError) -> ExitCode {
    let mut output = serde_json::json!({
        "success": false,
        "code": error.code(),
        "error": error.to_string(),
    });
    if let GenerationError::Validation(v) = error {
        output["violations"] = serde_json::json!(v.violations());
    }
    print_json(&output);
    ExitCode::from(2)
}

fn read_request(path: &Path) -> Result<ExportRequest, ExitCode> {
    let content = fs::read_to_string(path).map_err(|e| {
        print_json(&serde_json::json!({
            "success": false,
            "error": format!("Failed to read {}: {}", path.display(), e),
        }));
        ExitCode::FAILURE
    })?;

    ExportRequest::from_json(&content).map_err(|e| failure(&GenerationError::from(e)))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                print_json(&serde_json::json!({ "success": false, "error": e.to_string() }));
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };
    log::debug!("engine config: {:?}", config);

    let pipeline = GenerationPipeline::new(config);

    match cli.command {
        Commands::Styles => {
            print_json(&serde_json::json!(pipeline.catalog()));
            ExitCode::SUCCESS
        }

        Commands::Validate { input } => {
            let request = match read_request(&input) {
                Ok(r) => r,
                Err(code) => return code,
            };

            match pipeline.validate_request(&request) {
                Ok((document, _)) => {
                    print_json(&serde_json::json!({ "valid": true, "paper": document }));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_json(&serde_json::json!({
                        "valid": false,
                        "violations": e.violations(),
                    }));
                    ExitCode::from(2)
                }
            }
        }

        Commands::Layout { input } => {
            let request = match read_request(&input) {
                Ok(r) => r,
                Err(code) => return code,
            };

            match pipeline.layout_request(&request) {
                Ok(blocks) => {
                    print_json(&serde_json::json!({ "success": true, "blocks": blocks }));
                    ExitCode::SUCCESS
                }
                Err(e) => failure(&e),
            }
        }

        Commands::Generate { input, output } => {
            let request = match read_request(&input) {
                Ok(r) => r,
                Err(code) => return code,
            };

            let generated = match pipeline.generate_request(&request) {
                Ok(g) => g,
                Err(e) => return failure(&e),
            };

            let path = output.unwrap_or_else(|| PathBuf::from(&generated.filename));
            if let Err(e) = fs::write(&path, &generated.bytes) {
                print_json(&serde_json::json!({
                    "success": false,
                    "error": format!("Failed to write {}: {}", path.display(), e),
                }));
                return ExitCode::FAILURE;
            }

            print_json(&serde_json::json!({
                "success": true,
                "path": path.display().to_string(),
                "document": generated,
            }));
            ExitCode::SUCCESS
        }
    }
}
