//! ggufsmith - interactive llama.cpp converter and batch quantizer.
//!
//! Converts a Hugging Face model directory to an F16 GGUF, quantizes it to
//! every selected profile, and gathers the results in `<name>-GGUF/`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use ggufsmith_core::{
    Pipeline, ProfileCatalog, StdConsole, SystemRunner, ToolPaths, ToolsConfig,
};
use tracing::{debug, error, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "ggufsmith")]
#[command(about = "Convert a model to GGUF and quantize it with llama.cpp")]
struct Args {
    /// llama.cpp directory holding convert_hf_to_gguf.py and bin/llama-quantize
    #[arg(long, default_value = ToolsConfig::DEFAULT_LLAMA_DIR)]
    llama_dir: PathBuf,

    /// Python interpreter used to run the conversion script
    #[arg(long, default_value = ToolsConfig::PYTHON)]
    python: PathBuf,

    /// Directory the GGUF files and the output folder are written to
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Print the available quantization types and exit
    #[arg(long)]
    list_profiles: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr; stdout is the interactive channel.
    let log_level = if args.debug { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    if let Err(e) = install_interrupt_handler() {
        error!("{:#}", e);
    }

    match run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            println!("Unexpected error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<u8> {
    let catalog = ProfileCatalog::llama_cpp();

    if args.list_profiles {
        print_profiles(&catalog);
        return Ok(0);
    }

    let tools = ToolPaths::under(&args.llama_dir).with_python(args.python);
    debug!("Tools: {:?}", tools);

    let runner = SystemRunner::new();
    let pipeline = Pipeline::new(tools, &catalog, &runner, args.work_dir);
    let outcome = pipeline.run(&mut StdConsole::new()).await?;

    Ok(outcome.exit_code())
}

/// Ctrl+C ends the run wherever it is, including mid-prompt. The running
/// tool shares our process group and receives the same signal.
fn install_interrupt_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        println!("\n\nProcess interrupted by user");
        std::process::exit(1);
    })
    .context("Failed to install Ctrl+C handler")
}

fn print_profiles(catalog: &ProfileCatalog) {
    println!("Available quantization types:");
    for option in catalog.options() {
        let marker = if option.recommended { " (recommended)" } else { "" };
        println!(
            "  {:<7} {:>5.2} bpw  {}{}",
            option.name, option.bits_per_weight, option.description, marker
        );
    }
}
