//! The end-to-end run: collect input, convert, quantize, organize.
//!
//! Each step hands its declared outputs to the next. Only a failed conversion
//! stops the run early; everything after it degrades to summary lines.

use std::path::PathBuf;

use tracing::{info, warn};

use super::command::CommandRunner;
use super::llama_cpp::LlamaCpp;
use super::organize::{OrganizeReport, ResultOrganizer};
use super::types::{ProducedArtifact, ProfileCatalog, QuantizeReport, RunConfig};
use crate::config::{OutputConfig, ToolPaths};
use crate::console::Console;
use crate::input::InputCollector;
use crate::{ForgeError, Result};

/// Everything a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub config: RunConfig,
    pub intermediate: ProducedArtifact,
    pub quantize: QuantizeReport,
    pub organize: OrganizeReport,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Conversion succeeded; quantization failures are listed in the summary.
    Completed(RunSummary),
    /// The conversion step failed and nothing else was attempted.
    Aborted { reason: ForgeError },
}

impl RunOutcome {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Completed(_) => 0,
            RunOutcome::Aborted { .. } => 1,
        }
    }
}

/// Wires the steps together for one run.
pub struct Pipeline<'a> {
    tools: ToolPaths,
    catalog: &'a ProfileCatalog,
    runner: &'a dyn CommandRunner,
    work_dir: PathBuf,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        tools: ToolPaths,
        catalog: &'a ProfileCatalog,
        runner: &'a dyn CommandRunner,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tools,
            catalog,
            runner,
            work_dir: work_dir.into(),
        }
    }

    /// Prompt for the configuration, then execute it.
    ///
    /// `Err` is reserved for unexpected failures such as closed input.
    pub async fn run(&self, console: &mut dyn Console) -> Result<RunOutcome> {
        let config = InputCollector::new(self.catalog).collect(console)?;
        self.execute(&config, console).await
    }

    /// Execute an already collected configuration.
    pub async fn execute(
        &self,
        config: &RunConfig,
        console: &mut dyn Console,
    ) -> Result<RunOutcome> {
        console.say("\nStarting conversion process...");
        console.say(&format!("Model path: {}", config.model_path.display()));
        console.say(&format!("Output name: {}", config.output_name));
        console.say(&format!("Quantization types: {}", config.profiles.join(", ")));

        let llama = LlamaCpp::new(&self.tools, self.runner, &self.work_dir);

        console.say("\nStep 1: Converting to GGUF format");
        let intermediate = match llama.convert_to_f16(config, console).await {
            Ok(artifact) => artifact,
            Err(reason) => {
                warn!("Conversion failed: {}", reason);
                console.say("❌ Conversion failed. Exiting.");
                return Ok(RunOutcome::Aborted { reason });
            }
        };
        console.say(&format!(
            "📦 Created {} ({:.1} MB)",
            intermediate.file_name(),
            intermediate.size_mb()
        ));

        console.say("\nStep 2: Quantizing model");
        let quantize = match llama
            .quantize_all(&intermediate.path, config, self.catalog, console)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                warn!("Quantization skipped: {}", e);
                QuantizeReport::default()
            }
        };
        info!(
            "Quantization finished: {} succeeded, {} failed",
            quantize.succeeded.len(),
            quantize.failed.len()
        );

        self.print_summary(config, &quantize, console);

        let organize = ResultOrganizer::new(&self.work_dir).organize(config, &quantize, console)?;
        if organize.move_error.is_none() {
            console.say("\n📁 Processing completed successfully!");
            console.say(&format!(
                "All GGUF files have been moved to: {}/",
                config.output_dir_name()
            ));
        }

        Ok(RunOutcome::Completed(RunSummary {
            config: config.clone(),
            intermediate,
            quantize,
            organize,
        }))
    }

    fn print_summary(&self, config: &RunConfig, report: &QuantizeReport, console: &mut dyn Console) {
        console.say("\nProcess completed!");
        console.say(&"=".repeat(OutputConfig::RULE_WIDTH));

        if !report.succeeded.is_empty() {
            console.say(&format!(
                "✅ Successfully created {} quantized models:",
                report.succeeded.len()
            ));
            for profile in &report.succeeded {
                console.say(&format!("   - {}", config.quantized_file_name(profile)));
            }
        }

        if !report.failed.is_empty() {
            console.say(&format!(
                "❌ Failed to create {} quantized models:",
                report.failed.len()
            ));
            for profile in &report.failed {
                console.say(&format!("   - {}", config.quantized_file_name(profile)));
            }
        }
    }
}
