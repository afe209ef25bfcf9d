//! # ggufsmith-core
//!
//! Turns a Hugging Face model directory into a set of GGUF files by driving
//! the llama.cpp tools: one conversion to F16, one quantization per selected
//! profile, then relocation of everything produced into `<name>-GGUF/`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ggufsmith_core::{Pipeline, ProfileCatalog, StdConsole, SystemRunner, ToolPaths};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> ggufsmith_core::Result<()> {
//!     let catalog = ProfileCatalog::llama_cpp();
//!     let runner = SystemRunner::new();
//!     let pipeline = Pipeline::new(ToolPaths::default(), &catalog, &runner, ".");
//!
//!     let outcome = pipeline.run(&mut StdConsole::new()).await?;
//!     std::process::exit(outcome.exit_code() as i32);
//! }
//! ```

pub mod config;
pub mod console;
pub mod conversion;
pub mod error;
pub mod input;

pub use config::{OutputConfig, ToolPaths, ToolsConfig};
pub use console::{Console, ScriptedConsole, StdConsole};
pub use conversion::{
    CommandRunner, LlamaCpp, OrganizeReport, Pipeline, ProducedArtifact, ProfileCatalog,
    QuantOption, QuantizeReport, ResultOrganizer, RunConfig, RunOutcome, RunSummary,
    SystemRunner, ToolCommand,
};
pub use error::{ForgeError, Result};
pub use input::{default_output_name, InputCollector, SelectionMode};
