//! End-to-end tests for the conversion pipeline.
//!
//! The llama.cpp tools are replaced by a fake `CommandRunner` that writes (or
//! withholds) the artifact each command is expected to produce, so every
//! branch of the run can be exercised inside a temp directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ggufsmith_core::{
    CommandRunner, ForgeError, Pipeline, ProfileCatalog, RunConfig, RunOutcome, ScriptedConsole,
    ToolCommand, ToolPaths,
};
use tempfile::TempDir;

/// What the fake tool does for one output file.
#[derive(Debug, Clone, Copy)]
enum Behavior {
    /// Exit 0 and write the file.
    Produce,
    /// Exit 0 without writing anything.
    Silent,
    /// Exit non-zero.
    Fail,
}

#[derive(Default)]
struct FakeRunner {
    behaviors: HashMap<String, Behavior>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    fn with(mut self, output: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(output.to_string(), behavior);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &ToolCommand, _description: &str) -> bool {
        let name = command
            .produces()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        self.calls.lock().unwrap().push(name.clone());

        match self.behaviors.get(&name).copied().unwrap_or(Behavior::Produce) {
            Behavior::Produce => {
                std::fs::write(command.produces(), vec![7u8; 2048]).unwrap();
                true
            }
            Behavior::Silent => true,
            Behavior::Fail => false,
        }
    }
}

/// Temp workspace with a fake llama.cpp install and a model directory.
struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("llama/bin")).unwrap();
        std::fs::write(dir.path().join("llama/convert_hf_to_gguf.py"), "").unwrap();
        std::fs::write(dir.path().join("llama/bin/llama-quantize"), "").unwrap();
        std::fs::create_dir_all(dir.path().join("my-model")).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn tools(&self) -> ToolPaths {
        ToolPaths::under(&self.root().join("llama"))
    }

    fn config(&self, profiles: &[&str]) -> RunConfig {
        RunConfig {
            model_path: self.root().join("my-model"),
            output_name: "my-model".into(),
            profiles: profiles.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn output_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.root().join("my-model-GGUF"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

fn completed(outcome: RunOutcome) -> ggufsmith_core::RunSummary {
    match outcome {
        RunOutcome::Completed(summary) => summary,
        RunOutcome::Aborted { reason } => panic!("run aborted: {reason}"),
    }
}

#[tokio::test]
async fn test_one_failed_profile_does_not_stop_the_run() {
    let env = TestEnv::new();
    let catalog = ProfileCatalog::llama_cpp();
    let runner = FakeRunner::default().with("my-model-Q4_K_M.gguf", Behavior::Fail);
    let pipeline = Pipeline::new(env.tools(), &catalog, &runner, env.root());
    let mut console = ScriptedConsole::new(["n"]);

    let outcome = pipeline
        .execute(&env.config(&["Q2_K", "Q4_K_M", "Q8_0"]), &mut console)
        .await
        .unwrap();
    assert_eq!(outcome.exit_code(), 0);

    let summary = completed(outcome);
    assert_eq!(summary.quantize.succeeded, vec!["Q2_K", "Q8_0"]);
    assert_eq!(summary.quantize.failed, vec!["Q4_K_M"]);
    assert_eq!(
        runner.calls(),
        vec![
            "my-model-f16.gguf",
            "my-model-Q2_K.gguf",
            "my-model-Q4_K_M.gguf",
            "my-model-Q8_0.gguf"
        ]
    );

    assert_eq!(
        env.output_files(),
        vec!["my-model-Q2_K.gguf", "my-model-Q8_0.gguf", "my-model-f16.gguf"]
    );
    assert!(console.printed("✅ Successfully created 2 quantized models:"));
    assert!(console.printed("❌ Failed to create 1 quantized models:"));
    assert!(console.printed("   - my-model-Q4_K_M.gguf"));
    assert!(console.printed("Successfully moved 3 GGUF files to my-model-GGUF/"));
}

#[tokio::test]
async fn test_conversion_without_output_aborts() {
    let env = TestEnv::new();
    let catalog = ProfileCatalog::llama_cpp();
    let runner = FakeRunner::default().with("my-model-f16.gguf", Behavior::Silent);
    let pipeline = Pipeline::new(env.tools(), &catalog, &runner, env.root());
    let mut console = ScriptedConsole::default();

    let outcome = pipeline
        .execute(&env.config(&["Q4_K_M"]), &mut console)
        .await
        .unwrap();

    assert_eq!(outcome.exit_code(), 1);
    assert!(matches!(
        outcome,
        RunOutcome::Aborted {
            reason: ForgeError::ConversionFailed { .. }
        }
    ));
    assert_eq!(runner.calls(), vec!["my-model-f16.gguf"]);
    assert!(console.printed("❌ Failed to create my-model-f16.gguf"));
    assert!(console.printed("❌ Conversion failed. Exiting."));
    assert!(!env.root().join("my-model-GGUF").exists());
}

#[tokio::test]
async fn test_conversion_exit_failure_aborts() {
    let env = TestEnv::new();
    let catalog = ProfileCatalog::llama_cpp();
    let runner = FakeRunner::default().with("my-model-f16.gguf", Behavior::Fail);
    let pipeline = Pipeline::new(env.tools(), &catalog, &runner, env.root());
    let mut console = ScriptedConsole::default();

    let outcome = pipeline
        .execute(&env.config(&["Q4_K_M", "Q8_0"]), &mut console)
        .await
        .unwrap();
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(runner.calls().len(), 1);
}

#[tokio::test]
async fn test_missing_converter_aborts_without_running_anything() {
    let env = TestEnv::new();
    std::fs::remove_file(env.root().join("llama/convert_hf_to_gguf.py")).unwrap();
    let catalog = ProfileCatalog::llama_cpp();
    let runner = FakeRunner::default();
    let pipeline = Pipeline::new(env.tools(), &catalog, &runner, env.root());
    let mut console = ScriptedConsole::default();

    let outcome = pipeline
        .execute(&env.config(&["Q8_0"]), &mut console)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        RunOutcome::Aborted {
            reason: ForgeError::ToolNotFound { .. }
        }
    ));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_missing_quantizer_still_organizes_intermediate() {
    let env = TestEnv::new();
    std::fs::remove_file(env.root().join("llama/bin/llama-quantize")).unwrap();
    let catalog = ProfileCatalog::llama_cpp();
    let runner = FakeRunner::default();
    let pipeline = Pipeline::new(env.tools(), &catalog, &runner, env.root());
    let mut console = ScriptedConsole::default();

    let outcome = pipeline
        .execute(&env.config(&["Q4_K_M", "Q8_0"]), &mut console)
        .await
        .unwrap();
    assert_eq!(outcome.exit_code(), 0);

    let summary = completed(outcome);
    assert!(summary.quantize.succeeded.is_empty());
    assert!(summary.quantize.failed.is_empty());
    assert!(console.printed("❌ Quantizer not found"));
    // No quantization succeeded, so there is nothing to offer cleanup for.
    assert!(console.prompts().is_empty());
    assert_eq!(env.output_files(), vec!["my-model-f16.gguf"]);
}

#[tokio::test]
async fn test_quantizer_exit_zero_without_output_counts_as_failure() {
    let env = TestEnv::new();
    let catalog = ProfileCatalog::llama_cpp();
    let runner = FakeRunner::default().with("my-model-Q6_K.gguf", Behavior::Silent);
    let pipeline = Pipeline::new(env.tools(), &catalog, &runner, env.root());
    let mut console = ScriptedConsole::new(["n"]);

    let summary = completed(
        pipeline
            .execute(&env.config(&["Q6_K", "Q5_K_M"]), &mut console)
            .await
            .unwrap(),
    );
    assert_eq!(summary.quantize.succeeded, vec!["Q5_K_M"]);
    assert_eq!(summary.quantize.failed, vec!["Q6_K"]);
}

#[tokio::test]
async fn test_blocked_output_folder_keeps_files_and_skips_completion_banner() {
    let env = TestEnv::new();
    std::fs::write(env.root().join("my-model-GGUF"), "not a folder").unwrap();
    let catalog = ProfileCatalog::llama_cpp();
    let runner = FakeRunner::default();
    let pipeline = Pipeline::new(env.tools(), &catalog, &runner, env.root());
    let mut console = ScriptedConsole::default();

    let outcome = pipeline
        .execute(&env.config(&["Q8_0"]), &mut console)
        .await
        .unwrap();
    assert_eq!(outcome.exit_code(), 0);

    let summary = completed(outcome);
    assert!(summary.organize.move_error.is_some());
    assert!(summary.organize.moved.is_empty());
    assert!(env.root().join("my-model-f16.gguf").exists());
    assert!(env.root().join("my-model-Q8_0.gguf").exists());
    assert!(console.printed("Failed to create/move files to my-model-GGUF/"));
    assert!(console.printed("Files remain in current directory"));
    assert!(!console.printed("Processing completed successfully!"));
    assert!(!console.printed("All GGUF files have been moved to"));
    assert!(console.prompts().is_empty());
}

#[tokio::test]
async fn test_repeated_profile_is_quantized_once() {
    let env = TestEnv::new();
    let catalog = ProfileCatalog::llama_cpp();
    let runner = FakeRunner::default();
    let pipeline = Pipeline::new(env.tools(), &catalog, &runner, env.root());
    let mut console = ScriptedConsole::new(["n"]);

    let summary = completed(
        pipeline
            .execute(&env.config(&["Q8_0", "Q2_K", "Q8_0"]), &mut console)
            .await
            .unwrap(),
    );
    assert_eq!(summary.quantize.succeeded, vec!["Q8_0", "Q2_K"]);
    assert!(summary.quantize.failed.is_empty());
    assert_eq!(
        runner.calls(),
        vec!["my-model-f16.gguf", "my-model-Q8_0.gguf", "my-model-Q2_K.gguf"]
    );
}

#[tokio::test]
async fn test_interactive_run_with_cleanup() {
    let env = TestEnv::new();
    let model_arg = format!("{}/", env.root().join("my-model").display());
    let catalog = ProfileCatalog::llama_cpp();
    let runner = FakeRunner::default();
    let pipeline = Pipeline::new(env.tools(), &catalog, &runner, env.root());
    let mut console = ScriptedConsole::new([model_arg.as_str(), "", "2", "q4_k_m,Q8_0", "y"]);

    let summary = completed(pipeline.run(&mut console).await.unwrap());

    assert_eq!(summary.config.output_name, "my-model");
    assert_eq!(summary.config.model_path, PathBuf::from(&model_arg));
    assert!(summary.organize.removed_intermediate);
    assert_eq!(
        env.output_files(),
        vec!["my-model-Q4_K_M.gguf", "my-model-Q8_0.gguf"]
    );
    assert!(console.printed("📁 Processing completed successfully!"));
    assert!(console.printed("All GGUF files have been moved to: my-model-GGUF/"));
    assert_eq!(console.remaining(), 0);
}

#[tokio::test]
async fn test_default_selection_runs_every_profile_in_catalog_order() {
    let env = TestEnv::new();
    let model_arg = env.root().join("my-model").display().to_string();
    let catalog = ProfileCatalog::llama_cpp();
    let runner = FakeRunner::default();
    let pipeline = Pipeline::new(env.tools(), &catalog, &runner, env.root());
    let mut console = ScriptedConsole::new([model_arg.as_str(), "", "", "n"]);

    let summary = completed(pipeline.run(&mut console).await.unwrap());
    assert_eq!(summary.quantize.succeeded, catalog.names());

    let expected: Vec<String> = std::iter::once("my-model-f16.gguf".to_string())
        .chain(catalog.names().iter().map(|p| format!("my-model-{p}.gguf")))
        .collect();
    assert_eq!(runner.calls(), expected);
    assert_eq!(env.output_files().len(), 13);
}
