//! Pipeline command line handling.
//!
//! The pipeline is configured as one string. It is split with a deliberately
//! small tokenizer: whitespace separates arguments and double quotes group a
//! substring into one argument. There is no escaping, no nesting and no shell
//! metacharacter handling; this is not a shell grammar.

use crate::error::{MediaError, MediaResult};

/// Launcher used when none is configured.
pub const DEFAULT_LAUNCHER: &str = "gst-launch-1.0";

/// Argument placed before the pipeline so the launcher forwards end-of-stream
/// on interrupt.
pub const DEFAULT_LAUNCHER_ARG: &str = "-e";

/// Split `input` on whitespace, treating `"..."` as part of a single argument.
///
/// Quote characters are dropped. An unterminated quote runs to the end of the
/// input. Empty arguments (`""`) are skipped.
pub fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }

    args
}

/// A resolved launcher invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCommand {
    program: String,
    args: Vec<String>,
}

impl PipelineCommand {
    /// Create a command from an explicit program and argument vector.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build `launcher <launcher_args...> <tokenized pipeline...>`.
    ///
    /// Fails when the pipeline has no tokens.
    pub fn from_pipeline<I, S>(launcher: &str, launcher_args: I, pipeline: &str) -> MediaResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = split_args(pipeline);
        if tokens.is_empty() || launcher.trim().is_empty() {
            return Err(MediaError::EmptyCommand);
        }

        let mut args: Vec<String> = launcher_args.into_iter().map(Into::into).collect();
        args.extend(tokens);
        Ok(Self::new(launcher, args))
    }

    /// Tokenize with the default launcher and leading argument.
    pub fn gst_launch(pipeline: &str) -> MediaResult<Self> {
        Self::from_pipeline(DEFAULT_LAUNCHER, [DEFAULT_LAUNCHER_ARG], pipeline)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl std::fmt::Display for PipelineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
