//! Centralized configuration for ggufsmith.
//!
//! Fixed tool locations, artifact naming, and console layout constants.

use std::path::{Path, PathBuf};

/// Locations of the llama.cpp tooling, relative to the llama.cpp directory.
pub struct ToolsConfig;

impl ToolsConfig {
    pub const DEFAULT_LLAMA_DIR: &'static str = "./llama";
    pub const CONVERT_SCRIPT: &'static str = "convert_hf_to_gguf.py";
    pub const QUANTIZE_BINARY_DIR: &'static str = "bin";
    pub const QUANTIZE_BINARY: &'static str = "llama-quantize";
    pub const PYTHON: &'static str = "python3";
    /// Output type requested from the converter.
    pub const CONVERT_OUTTYPE: &'static str = "f16";
}

/// Naming of produced artifacts and the output folder.
pub struct OutputConfig;

impl OutputConfig {
    pub const ARTIFACT_EXTENSION: &'static str = "gguf";
    pub const INTERMEDIATE_SUFFIX: &'static str = "-f16.gguf";
    pub const OUTPUT_DIR_SUFFIX: &'static str = "-GGUF";
    pub const RULE_WIDTH: usize = 50;
}

impl OutputConfig {
    /// `<name>-f16.gguf`
    pub fn intermediate_file_name(output_name: &str) -> String {
        format!("{output_name}{}", Self::INTERMEDIATE_SUFFIX)
    }

    /// `<name>-<PROFILE>.gguf`
    pub fn quantized_file_name(output_name: &str, profile: &str) -> String {
        format!("{output_name}-{profile}.{}", Self::ARTIFACT_EXTENSION)
    }

    /// `<name>-GGUF`
    pub fn output_dir_name(output_name: &str) -> String {
        format!("{output_name}{}", Self::OUTPUT_DIR_SUFFIX)
    }
}

/// Resolved paths of the external tools the pipeline invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub convert_script: PathBuf,
    pub quantizer: PathBuf,
    pub python: PathBuf,
}

impl ToolPaths {
    /// Tool layout of a llama.cpp release unpacked at `llama_dir`.
    pub fn under(llama_dir: &Path) -> Self {
        Self {
            convert_script: llama_dir.join(ToolsConfig::CONVERT_SCRIPT),
            quantizer: llama_dir
                .join(ToolsConfig::QUANTIZE_BINARY_DIR)
                .join(ToolsConfig::QUANTIZE_BINARY),
            python: PathBuf::from(ToolsConfig::PYTHON),
        }
    }

    pub fn with_python(mut self, python: impl Into<PathBuf>) -> Self {
        self.python = python.into();
        self
    }
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self::under(Path::new(ToolsConfig::DEFAULT_LLAMA_DIR))
    }
}
