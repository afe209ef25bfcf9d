//! Interactive console used by the pipeline.
//!
//! Prompts and user-facing status lines go through the [`Console`] trait so
//! the input validation loops can be driven by a script instead of a terminal.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::{ForgeError, Result};

/// Line-oriented prompt/answer channel.
pub trait Console {
    /// Show `prompt` and return the answer with surrounding whitespace removed.
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Write one line of output.
    fn say(&mut self, line: &str);
}

/// Console backed by the process's stdin and stdout.
#[derive(Debug, Default)]
pub struct StdConsole;

impl StdConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Console for StdConsole {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;
        drop(stdout);

        let mut line = String::new();
        let read = std::io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(ForgeError::InputClosed);
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, line: &str) {
        println!("{line}");
    }
}

/// Console that answers prompts from a fixed script and records all output.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    prompts: Vec<String>,
    output: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
            output: Vec::new(),
        }
    }

    /// Prompts shown so far, in order.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Lines written so far, in order.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Whether any output line contains `needle`.
    pub fn printed(&self, needle: &str) -> bool {
        self.output.iter().any(|line| line.contains(needle))
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Console for ScriptedConsole {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.prompts.push(prompt.to_string());
        self.answers
            .pop_front()
            .map(|answer| answer.trim().to_string())
            .ok_or(ForgeError::InputClosed)
    }

    fn say(&mut self, line: &str) {
        self.output.push(line.to_string());
    }
}
