//! Relocating produced artifacts into the `<name>-GGUF/` folder.
//!
//! Nothing in here ends the run. Filesystem failures are reported on the
//! console with their cause and the files stay wherever they are.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::types::{ProducedArtifact, QuantizeReport, RunConfig};
use crate::config::OutputConfig;
use crate::console::Console;
use crate::{ForgeError, Result};

/// What the organizer did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeReport {
    pub output_dir: PathBuf,
    /// File names moved into `output_dir`, in move order
    pub moved: Vec<String>,
    /// Set when the batch move stopped early
    pub move_error: Option<String>,
    /// `.gguf` files found in `output_dir` afterwards, sorted by name
    pub contents: Vec<ProducedArtifact>,
    pub removed_intermediate: bool,
}

/// Moves artifacts from the working directory into the output folder.
pub struct ResultOrganizer<'a> {
    work_dir: &'a Path,
}

impl<'a> ResultOrganizer<'a> {
    pub fn new(work_dir: &'a Path) -> Self {
        Self { work_dir }
    }

    pub fn output_dir(&self, config: &RunConfig) -> PathBuf {
        self.work_dir.join(config.output_dir_name())
    }

    /// Create the output folder, move the intermediate and every succeeded
    /// quantization into it, list the result, then offer to delete the
    /// intermediate if at least one quantization succeeded.
    pub fn organize(
        &self,
        config: &RunConfig,
        report: &QuantizeReport,
        console: &mut dyn Console,
    ) -> Result<OrganizeReport> {
        let output_dir = self.output_dir(config);
        let dir_label = config.output_dir_name();
        let mut result = OrganizeReport {
            output_dir: output_dir.clone(),
            ..Default::default()
        };

        console.say("\nMoving GGUF files to separate folder...");

        let mut files = vec![config.intermediate_file_name()];
        files.extend(report.succeeded.iter().map(|p| config.quantized_file_name(p)));

        match self.move_batch(&output_dir, &files, &mut result.moved, console) {
            Ok(()) => {
                console.say(&format!(
                    "\nSuccessfully moved {} GGUF files to {dir_label}/",
                    result.moved.len()
                ));
                console.say(&format!("\nFinal contents of {dir_label}/:"));
                result.contents = show_contents(&output_dir, console);
            }
            Err(e) => {
                warn!("Organizing outputs stopped: {}", e);
                console.say(&format!("Failed to create/move files to {dir_label}/: {e}"));
                console.say("Files remain in current directory");
                result.move_error = Some(e.to_string());
            }
        }

        let f16_in_folder = output_dir.join(config.intermediate_file_name());
        if report.any_succeeded() && f16_in_folder.exists() {
            result.removed_intermediate =
                self.offer_cleanup(&f16_in_folder, config, console)?;
        }

        Ok(result)
    }

    /// Stops at the first failure; everything moved before it stays moved.
    fn move_batch(
        &self,
        output_dir: &Path,
        files: &[String],
        moved: &mut Vec<String>,
        console: &mut dyn Console,
    ) -> Result<()> {
        std::fs::create_dir_all(output_dir)
            .map_err(|e| ForgeError::io("creating output folder", output_dir, e))?;
        console.say(&format!(
            "Created folder: {}/",
            output_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        ));

        for name in files {
            let src = self.work_dir.join(name);
            if !src.exists() {
                debug!("Nothing to move at {}", src.display());
                continue;
            }
            let dest = output_dir.join(name);
            std::fs::rename(&src, &dest).map_err(|e| ForgeError::io("moving artifact", &src, e))?;
            console.say(&format!("Moved {name}"));
            moved.push(name.clone());
        }
        Ok(())
    }

    fn offer_cleanup(
        &self,
        f16_in_folder: &Path,
        config: &RunConfig,
        console: &mut dyn Console,
    ) -> Result<bool> {
        let f16_name = config.intermediate_file_name();
        let dir_label = config.output_dir_name();
        let answer = console.ask(&format!(
            "\nRemove the f16 base file ({f16_name}) from {dir_label}/? (y/n): "
        ))?;
        if !answer.eq_ignore_ascii_case("y") {
            return Ok(false);
        }

        match std::fs::remove_file(f16_in_folder) {
            Ok(()) => {
                console.say(&format!("Removed {f16_name} from {dir_label}/"));
                Ok(true)
            }
            Err(e) => {
                warn!("Failed to remove {}: {}", f16_in_folder.display(), e);
                console.say(&format!("Failed to remove {f16_name}: {e}"));
                Ok(false)
            }
        }
    }
}

/// Print the listing of `output_dir`. A listing failure is only reported.
fn show_contents(output_dir: &Path, console: &mut dyn Console) -> Vec<ProducedArtifact> {
    match list_artifacts(output_dir) {
        Ok(contents) => {
            for artifact in &contents {
                console.say(&format!(
                    "   {} ({:.1} MB)",
                    artifact.file_name(),
                    artifact.size_mb()
                ));
            }
            contents
        }
        Err(e) => {
            warn!("Listing {} failed: {}", output_dir.display(), e);
            console.say(&format!("   Could not list folder contents: {e}"));
            Vec::new()
        }
    }
}

/// `.gguf` files directly inside `dir`, sorted by file name.
pub fn list_artifacts(dir: &Path) -> Result<Vec<ProducedArtifact>> {
    let mut artifacts = std::fs::read_dir(dir)
        .map_err(|e| ForgeError::io("reading output folder", dir, e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension().and_then(|ext| ext.to_str()) == Some(OutputConfig::ARTIFACT_EXTENSION)
        })
        .map(|p| ProducedArtifact::from_path(&p))
        .collect::<Result<Vec<_>>>()?;

    artifacts.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(artifacts)
}
