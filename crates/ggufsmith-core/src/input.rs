//! Interactive collection of the run configuration.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::OutputConfig;
use crate::console::Console;
use crate::conversion::{ProfileCatalog, RunConfig};
use crate::{ForgeError, Result};

/// How the user chose the profiles to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    All,
    Custom,
}

impl SelectionMode {
    /// Empty input picks the default.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "" | "1" => Some(SelectionMode::All),
            "2" => Some(SelectionMode::Custom),
            _ => None,
        }
    }
}

/// Default output prefix: the last segment of the model path.
///
/// `my-model/` and `models/my-model` both give `my-model`.
pub fn default_output_name(model_path: &str) -> String {
    let trimmed = model_path.trim_end_matches('/');
    if trimmed.is_empty() {
        return model_path.to_string();
    }
    Path::new(trimmed)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Prompts for the model directory, output name and profiles.
pub struct InputCollector<'a> {
    catalog: &'a ProfileCatalog,
}

impl<'a> InputCollector<'a> {
    pub fn new(catalog: &'a ProfileCatalog) -> Self {
        Self { catalog }
    }

    /// Run every prompt in order and return the resulting configuration.
    ///
    /// Only fails when the console stops answering.
    pub fn collect(&self, console: &mut dyn Console) -> Result<RunConfig> {
        console.say("Llama.cpp Model Converter and Quantizer");
        console.say(&"=".repeat(OutputConfig::RULE_WIDTH));

        let model_path = self.ask_model_path(console)?;
        let output_name = self.ask_output_name(console, &model_path)?;
        let profiles = self.ask_profiles(console)?;

        debug!(
            "Run configured: model={} output={} profiles={}",
            model_path,
            output_name,
            profiles.len()
        );

        Ok(RunConfig {
            model_path: PathBuf::from(model_path),
            output_name,
            profiles,
        })
    }

    fn ask_model_path(&self, console: &mut dyn Console) -> Result<String> {
        loop {
            let model_path =
                console.ask("\nEnter the model directory path (e.g., 'my-model'): ")?;
            if model_path.is_empty() {
                console.say("Model path cannot be empty");
                continue;
            }

            if !Path::new(&model_path).exists() {
                console.say(&format!("Warning: Directory '{model_path}' does not exist"));
                let confirm = console.ask("Continue anyway? (y/n): ")?;
                if !confirm.eq_ignore_ascii_case("y") {
                    continue;
                }
            }

            return Ok(model_path);
        }
    }

    fn ask_output_name(&self, console: &mut dyn Console, model_path: &str) -> Result<String> {
        let default = default_output_name(model_path);
        let answer =
            console.ask(&format!("\nEnter output filename prefix (default: '{default}'): "))?;
        Ok(if answer.is_empty() { default } else { answer })
    }

    fn ask_profiles(&self, console: &mut dyn Console) -> Result<Vec<String>> {
        let names = self.catalog.names();

        console.say("\nQuantization options:");
        console.say(&format!("Available types: {}", names.join(", ")));
        console.say("\nOptions:");
        console.say("1. Convert to ALL quantization types (default)");
        console.say("2. Select specific quantization types");

        loop {
            let choice = console.ask("\nSelect option (1-2, or press Enter for default): ")?;

            match SelectionMode::parse(&choice) {
                Some(SelectionMode::All) => {
                    console.say(&format!(
                        "✅ Selected: ALL quantization types ({} types)",
                        names.len()
                    ));
                    return Ok(names);
                }
                Some(SelectionMode::Custom) => {
                    if let Some(selected) = self.ask_custom_profiles(console)? {
                        return Ok(selected);
                    }
                }
                None => console.say("❌ Please enter 1 or 2 (or press Enter for default)"),
            }
        }
    }

    /// One round of custom selection. `None` means the list was rejected.
    fn ask_custom_profiles(&self, console: &mut dyn Console) -> Result<Option<Vec<String>>> {
        console.say("\nAvailable quantization types:");
        for (i, option) in self.catalog.options().iter().enumerate() {
            console.say(&format!("{:2}. {}", i + 1, option.name));
        }
        console.say("\nEnter quantization types (comma-separated, e.g., 'Q4_K_M,Q5_K_M'):");

        let input = console.ask("Types: ")?;

        match self.catalog.parse_selection(&input) {
            Ok(selected) if selected.is_empty() => {
                console.say("❌ No types selected, using all types");
                Ok(Some(self.catalog.names()))
            }
            Ok(selected) => {
                console.say(&format!("✅ Selected: {}", selected.join(", ")));
                Ok(Some(selected))
            }
            Err(ForgeError::InvalidProfiles { invalid, valid }) => {
                console.say(&format!(
                    "❌ Invalid quantization types: {}",
                    invalid.join(", ")
                ));
                console.say(&format!("Valid types: {}", valid.join(", ")));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
