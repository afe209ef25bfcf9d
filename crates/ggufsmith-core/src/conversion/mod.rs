//! Model conversion and quantization with llama.cpp.
//!
//! The `Pipeline` runs `convert_hf_to_gguf.py` once to produce an F16 GGUF,
//! then `llama-quantize` once per selected profile, and finally moves the
//! outputs into a `<name>-GGUF/` folder. External tools are invoked through
//! the `CommandRunner` trait so the steps can be driven without real binaries.

mod command;
pub mod llama_cpp;
pub mod organize;
mod pipeline;
mod types;

pub use command::{CommandRunner, SystemRunner, ToolCommand};
pub use llama_cpp::LlamaCpp;
pub use organize::{list_artifacts, OrganizeReport, ResultOrganizer};
pub use pipeline::{Pipeline, RunOutcome, RunSummary};
pub use types::{
    bytes_to_mb, ProducedArtifact, ProfileCatalog, QuantOption, QuantizeReport, RunConfig,
};
