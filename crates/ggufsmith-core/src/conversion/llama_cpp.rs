//! llama.cpp conversion and quantization steps.
//!
//! Wraps `convert_hf_to_gguf.py` (Hugging Face directory to F16 GGUF) and
//! `llama-quantize` (F16 GGUF to one quantized GGUF per profile). A step only
//! counts as successful when the tool exits cleanly *and* the file it was
//! asked to write exists afterwards.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::command::{CommandRunner, ToolCommand};
use super::types::{ProducedArtifact, ProfileCatalog, QuantizeReport, RunConfig};
use crate::config::{ToolPaths, ToolsConfig};
use crate::console::Console;
use crate::{ForgeError, Result};

/// Drives the llama.cpp tools for a single run.
pub struct LlamaCpp<'a> {
    tools: &'a ToolPaths,
    runner: &'a dyn CommandRunner,
    work_dir: &'a Path,
}

impl<'a> LlamaCpp<'a> {
    /// Artifacts are written into `work_dir`.
    pub fn new(tools: &'a ToolPaths, runner: &'a dyn CommandRunner, work_dir: &'a Path) -> Self {
        Self {
            tools,
            runner,
            work_dir,
        }
    }

    /// Whether the conversion script is where it is expected.
    pub fn has_converter(&self) -> bool {
        self.tools.convert_script.exists()
    }

    /// Whether the `llama-quantize` binary is where it is expected.
    pub fn has_quantizer(&self) -> bool {
        self.tools.quantizer.exists()
    }

    /// Path of the F16 intermediate for this run.
    pub fn intermediate_path(&self, config: &RunConfig) -> PathBuf {
        self.work_dir.join(config.intermediate_file_name())
    }

    /// Path of the quantized output for `profile`.
    pub fn quantized_path(&self, config: &RunConfig, profile: &str) -> PathBuf {
        self.work_dir.join(config.quantized_file_name(profile))
    }

    pub fn convert_command(&self, config: &RunConfig) -> ToolCommand {
        let f16 = self.intermediate_path(config);
        ToolCommand::new(&self.tools.python, &f16)
            .arg(&self.tools.convert_script)
            .arg(&config.model_path)
            .arg("--outfile")
            .arg(&f16)
            .arg("--outtype")
            .arg(ToolsConfig::CONVERT_OUTTYPE)
    }

    pub fn quantize_command(&self, f16: &Path, config: &RunConfig, profile: &str) -> ToolCommand {
        let output = self.quantized_path(config, profile);
        ToolCommand::new(&self.tools.quantizer, &output)
            .arg(f16)
            .arg(&output)
            .arg(profile)
    }

    /// Convert the model directory to an F16 GGUF.
    ///
    /// Any error returned here is fatal to the run.
    pub async fn convert_to_f16(
        &self,
        config: &RunConfig,
        console: &mut dyn Console,
    ) -> Result<ProducedArtifact> {
        if !self.has_converter() {
            console.say(&format!(
                "❌ Conversion script not found: {}",
                self.tools.convert_script.display()
            ));
            console.say("Make sure you're running this from the llama.cpp directory");
            return Err(ForgeError::ToolNotFound {
                tool: "Conversion script".to_string(),
                path: self.tools.convert_script.clone(),
            });
        }

        let command = self.convert_command(config);
        let description = format!("Converting {} to GGUF format", config.model_path.display());
        info!("Converting {} to F16 GGUF", config.model_path.display());

        let exited_ok = self.runner.run(&command, &description).await;
        let f16 = command.produces();

        if exited_ok && f16.exists() {
            return ProducedArtifact::from_path(f16);
        }

        console.say(&format!("❌ Failed to create {}", display_name(f16)));
        let message = if exited_ok {
            format!("converter exited cleanly but {} was not written", f16.display())
        } else {
            format!("converter failed for {}", config.model_path.display())
        };
        Err(ForgeError::ConversionFailed { message })
    }

    /// Quantize `f16` once per selected profile, in selection order.
    ///
    /// One profile failing never stops the others. The only error is a
    /// missing quantizer, which leaves every profile unattempted.
    pub async fn quantize_all(
        &self,
        f16: &Path,
        config: &RunConfig,
        catalog: &ProfileCatalog,
        console: &mut dyn Console,
    ) -> Result<QuantizeReport> {
        if !self.has_quantizer() {
            console.say(&format!(
                "❌ Quantizer not found: {}",
                self.tools.quantizer.display()
            ));
            console.say("Make sure you have the llama.cpp release binary");
            return Err(ForgeError::ToolNotFound {
                tool: "Quantizer".to_string(),
                path: self.tools.quantizer.clone(),
            });
        }

        let mut report = QuantizeReport::default();

        for profile in &config.profiles {
            if report.contains(profile) {
                debug!("{} already quantized in this run", profile);
                continue;
            }
            if !catalog.contains(profile) {
                warn!("Skipping unknown quantization type {}", profile);
                report.record(profile, false);
                continue;
            }

            let command = self.quantize_command(f16, config, profile);
            let exited_ok = self
                .runner
                .run(&command, &format!("Quantizing to {profile}"))
                .await;
            let output = command.produces();

            let artifact = if exited_ok && output.exists() {
                ProducedArtifact::from_path(output).ok()
            } else {
                None
            };

            match artifact {
                Some(artifact) => {
                    console.say(&format!(
                        "📦 Created {} ({:.1} MB)",
                        artifact.file_name(),
                        artifact.size_mb()
                    ));
                    report.record(profile, true);
                }
                None => {
                    debug!("{} produced no output at {}", profile, output.display());
                    report.record(profile, false);
                }
            }
        }

        Ok(report)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::command::SystemRunner;

    fn run_config() -> RunConfig {
        RunConfig {
            model_path: PathBuf::from("my-model"),
            output_name: "my-model".into(),
            profiles: vec!["Q4_K_M".into(), "Q8_0".into()],
        }
    }

    #[test]
    fn test_convert_command_layout() {
        let tools = ToolPaths::default();
        let runner = SystemRunner::new();
        let llama = LlamaCpp::new(&tools, &runner, Path::new("."));

        let cmd = llama.convert_command(&run_config());
        assert_eq!(cmd.program(), Path::new("python3"));
        assert_eq!(
            cmd.to_string(),
            "python3 ./llama/convert_hf_to_gguf.py my-model --outfile ./my-model-f16.gguf --outtype f16"
        );
        assert_eq!(cmd.produces(), Path::new("./my-model-f16.gguf"));
    }

    #[test]
    fn test_quantize_command_layout() {
        let tools = ToolPaths::default();
        let runner = SystemRunner::new();
        let llama = LlamaCpp::new(&tools, &runner, Path::new("."));

        let f16 = llama.intermediate_path(&run_config());
        let cmd = llama.quantize_command(&f16, &run_config(), "Q4_K_M");
        assert_eq!(
            cmd.to_string(),
            "./llama/bin/llama-quantize ./my-model-f16.gguf ./my-model-Q4_K_M.gguf Q4_K_M"
        );
    }

    #[test]
    fn test_tools_missing() {
        let tools = ToolPaths::under(Path::new("/nonexistent/llama"));
        let runner = SystemRunner::new();
        let llama = LlamaCpp::new(&tools, &runner, Path::new("."));
        assert!(!llama.has_converter());
        assert!(!llama.has_quantizer());
    }

    #[tokio::test]
    async fn test_missing_converter_has_no_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let tools = ToolPaths::under(&dir.path().join("llama"));
        let runner = SystemRunner::new();
        let llama = LlamaCpp::new(&tools, &runner, dir.path());
        let mut console = crate::console::ScriptedConsole::default();

        let err = llama
            .convert_to_f16(&run_config(), &mut console)
            .await
            .unwrap_err();
        assert!(matches!(err, ForgeError::ToolNotFound { .. }));
        assert!(console.printed("Conversion script not found"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
