//! Types for model conversion and quantization runs.

use std::path::{Path, PathBuf};

use crate::config::OutputConfig;
use crate::{ForgeError, Result};

/// A quantization type understood by `llama-quantize`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantOption {
    /// Quantization type name (e.g. "Q4_K_M", "Q8_0")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Approximate bits per weight
    pub bits_per_weight: f32,
    /// Whether this is a recommended default option
    pub recommended: bool,
}

impl QuantOption {
    fn new(name: &str, description: &str, bits_per_weight: f32) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            bits_per_weight,
            recommended: false,
        }
    }

    fn recommended(mut self) -> Self {
        self.recommended = true;
        self
    }
}

/// The ordered set of quantization profiles a run may select from.
///
/// Order matters: selecting "all" quantizes in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileCatalog {
    options: Vec<QuantOption>,
}

impl ProfileCatalog {
    pub fn new(options: Vec<QuantOption>) -> Self {
        Self { options }
    }

    /// The twelve llama.cpp quantization types offered by default.
    pub fn llama_cpp() -> Self {
        Self::new(vec![
            QuantOption::new("Q2_K", "2-bit K-quant (smallest, lowest quality)", 3.35),
            QuantOption::new("Q3_K_S", "3-bit K-quant small", 3.50),
            QuantOption::new("Q3_K_M", "3-bit K-quant medium", 3.91),
            QuantOption::new("Q3_K_L", "3-bit K-quant large", 4.27),
            QuantOption::new("Q4_K_S", "4-bit K-quant small", 4.58),
            QuantOption::new("Q4_0", "4-bit legacy quant", 4.55),
            QuantOption::new("Q4_1", "4-bit legacy quant with offsets", 5.00),
            QuantOption::new("Q4_K_M", "4-bit K-quant medium, best balance of size and quality", 4.85)
                .recommended(),
            QuantOption::new("Q5_K_S", "5-bit K-quant small", 5.54),
            QuantOption::new("Q5_K_M", "5-bit K-quant medium", 5.69),
            QuantOption::new("Q6_K", "6-bit K-quant (high quality, larger)", 6.56),
            QuantOption::new("Q8_0", "8-bit (near-lossless)", 8.50),
        ])
    }

    pub fn options(&self) -> &[QuantOption] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Profile names in catalog order.
    pub fn names(&self) -> Vec<String> {
        self.options.iter().map(|o| o.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.iter().any(|o| o.name == name)
    }

    /// Parse a comma-separated list of profile names.
    ///
    /// Names are trimmed and upper-cased and repeats keep their first
    /// position. A single unknown name rejects the whole list, and a blank
    /// item between commas counts as unknown. Returns an empty vec only when
    /// the input itself is blank.
    pub fn parse_selection(&self, input: &str) -> Result<Vec<String>> {
        if input.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut selected: Vec<String> = Vec::new();
        for name in input.split(',').map(|item| item.trim().to_uppercase()) {
            if !selected.contains(&name) {
                selected.push(name);
            }
        }

        let invalid: Vec<String> = selected
            .iter()
            .filter(|name| !self.contains(name))
            .cloned()
            .collect();

        if !invalid.is_empty() {
            return Err(ForgeError::InvalidProfiles {
                invalid,
                valid: self.names(),
            });
        }
        Ok(selected)
    }
}

/// Everything collected from the user before the pipeline starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Model directory handed to the converter
    pub model_path: PathBuf,
    /// Prefix of every produced file name
    pub output_name: String,
    /// Selected profiles, unique and in the order they will run
    pub profiles: Vec<String>,
}

impl RunConfig {
    pub fn intermediate_file_name(&self) -> String {
        OutputConfig::intermediate_file_name(&self.output_name)
    }

    pub fn quantized_file_name(&self, profile: &str) -> String {
        OutputConfig::quantized_file_name(&self.output_name, profile)
    }

    pub fn output_dir_name(&self) -> String {
        OutputConfig::output_dir_name(&self.output_name)
    }
}

/// A file written by one of the external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducedArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl ProducedArtifact {
    /// Stat `path` and record its current size.
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)
            .map_err(|e| ForgeError::io("reading artifact size", path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: meta.len(),
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.size_bytes)
    }
}

/// Per-profile outcome of the quantization step.
///
/// A profile lands in exactly one of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuantizeReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl QuantizeReport {
    /// Whether `profile` already has an outcome.
    pub fn contains(&self, profile: &str) -> bool {
        self.succeeded.iter().chain(&self.failed).any(|p| p == profile)
    }

    /// Record the first outcome for `profile`; later ones are ignored.
    pub fn record(&mut self, profile: &str, ok: bool) {
        if self.contains(profile) {
            return;
        }
        if ok {
            self.succeeded.push(profile.to_string());
        } else {
            self.failed.push(profile.to_string());
        }
    }

    pub fn any_succeeded(&self) -> bool {
        !self.succeeded.is_empty()
    }
}

/// Size in MiB, as shown next to file names.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
