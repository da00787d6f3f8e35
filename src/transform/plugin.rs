//! Transform plugin contract and adapters for each calling convention
//!
//! A plugin answers through exactly one of:
//!
//! | Convention | Plugin returns | Result arrives via |
//! |------------|----------------|--------------------|
//! | direct | `PluginReturn::Value` | the return value |
//! | deferred | `PluginReturn::Deferred` | the future |
//! | callback | `PluginReturn::Pending` | [`Completion`] |
//!
//! A plugin may also signal the [`Completion`] and return a value; the first
//! signal wins.

use super::completion::Completion;
use super::output::RawOutput;
use crate::store::FileData;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Error type plugins fail with
pub type PluginError = Box<dyn std::error::Error + Send + Sync>;

/// What a plugin is handed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// The source text, read by the store first
    #[default]
    Content,
    /// The file path; the plugin reads the file itself
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformInput {
    Source(String),
    File(PathBuf),
}

impl TransformInput {
    pub fn into_source(self) -> Result<String, PluginError> {
        match self {
            Self::Source(source) => Ok(source),
            Self::File(path) => Err(format!("expected source text, got path {}", path.display()).into()),
        }
    }
}

/// Per-invocation context
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// File being transformed
    pub path: PathBuf,
    /// `options` of the matching transform spec
    pub options: Option<Value>,
    /// Raw content of the store, when the spec asks for it
    pub cached: Option<Arc<HashMap<PathBuf, FileData>>>,
}

/// How a plugin answered
pub enum PluginReturn {
    Value(RawOutput),
    Deferred(BoxFuture<'static, Result<RawOutput, PluginError>>),
    Pending,
}

/// A transform plugin
pub trait Transform: Send + Sync {
    fn input_mode(&self) -> InputMode {
        InputMode::Content
    }

    /// Start the transform; an `Err` is treated like a thrown exception
    fn transform(
        &self,
        input: TransformInput,
        ctx: &TransformContext,
        done: Completion,
    ) -> Result<PluginReturn, PluginError>;
}

struct FnTransform<F>(F);

impl<F> Transform for FnTransform<F>
where
    F: Fn(&str, &TransformContext) -> Result<RawOutput, PluginError> + Send + Sync,
{
    fn transform(
        &self,
        input: TransformInput,
        ctx: &TransformContext,
        _done: Completion,
    ) -> Result<PluginReturn, PluginError> {
        let source = input.into_source()?;
        (self.0)(&source, ctx).map(PluginReturn::Value)
    }
}

/// Plugin that returns its result directly
pub fn from_fn<F>(f: F) -> Arc<dyn Transform>
where
    F: Fn(&str, &TransformContext) -> Result<RawOutput, PluginError> + Send + Sync + 'static,
{
    Arc::new(FnTransform(f))
}

struct AsyncTransform<F>(F);

impl<F, Fut> Transform for AsyncTransform<F>
where
    F: Fn(String, TransformContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RawOutput, PluginError>> + Send + 'static,
{
    fn transform(
        &self,
        input: TransformInput,
        ctx: &TransformContext,
        _done: Completion,
    ) -> Result<PluginReturn, PluginError> {
        let source = input.into_source()?;
        Ok(PluginReturn::Deferred(Box::pin((self.0)(source, ctx.clone()))))
    }
}

/// Plugin that returns a future
pub fn from_async<F, Fut>(f: F) -> Arc<dyn Transform>
where
    F: Fn(String, TransformContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<RawOutput, PluginError>> + Send + 'static,
{
    Arc::new(AsyncTransform(f))
}

struct CallbackTransform<F>(F);

impl<F> Transform for CallbackTransform<F>
where
    F: Fn(String, &TransformContext, Completion) + Send + Sync,
{
    fn transform(
        &self,
        input: TransformInput,
        ctx: &TransformContext,
        done: Completion,
    ) -> Result<PluginReturn, PluginError> {
        let source = input.into_source()?;
        (self.0)(source, ctx, done);
        Ok(PluginReturn::Pending)
    }
}

/// Plugin that signals a [`Completion`]
pub fn from_callback<F>(f: F) -> Arc<dyn Transform>
where
    F: Fn(String, &TransformContext, Completion) + Send + Sync + 'static,
{
    Arc::new(CallbackTransform(f))
}

struct FileFnTransform<F>(F);

impl<F> Transform for FileFnTransform<F>
where
    F: Fn(&Path, &TransformContext) -> Result<RawOutput, PluginError> + Send + Sync,
{
    fn input_mode(&self) -> InputMode {
        InputMode::File
    }

    fn transform(
        &self,
        input: TransformInput,
        ctx: &TransformContext,
        _done: Completion,
    ) -> Result<PluginReturn, PluginError> {
        let path = match input {
            TransformInput::File(path) => path,
            TransformInput::Source(_) => ctx.path.clone(),
        };
        (self.0)(&path, ctx).map(PluginReturn::Value)
    }
}

/// Whole-file plugin: given the path instead of the source
pub fn from_file_fn<F>(f: F) -> Arc<dyn Transform>
where
    F: Fn(&Path, &TransformContext) -> Result<RawOutput, PluginError> + Send + Sync + 'static,
{
    Arc::new(FileFnTransform(f))
}

/// Runs an external command with the source on stdin and uses its stdout
///
/// The command sees `WATCHSTORE_PATH` and, when the spec has options,
/// `WATCHSTORE_OPTIONS` as JSON.
#[derive(Debug, Clone)]
pub struct CommandTransform {
    program: String,
    args: Vec<String>,
}

impl CommandTransform {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from `[program, args...]`
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl Transform for CommandTransform {
    fn transform(
        &self,
        input: TransformInput,
        ctx: &TransformContext,
        _done: Completion,
    ) -> Result<PluginReturn, PluginError> {
        let source = input.into_source()?;

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env("WATCHSTORE_PATH", &ctx.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(options) = &ctx.options {
            cmd.env("WATCHSTORE_OPTIONS", options.to_string());
        }

        let program = self.program.clone();
        debug!("Running {} for {}", program, ctx.path.display());

        Ok(PluginReturn::Deferred(Box::pin(run_command(cmd, program, source))))
    }
}

async fn run_command(
    mut cmd: Command,
    program: String,
    source: String,
) -> Result<RawOutput, PluginError> {
    let mut child = cmd
        .spawn()
        .map_err(|e| format!("failed to run {}: {}", program, e))?;

    // stdin is written while stdout is drained
    if let Some(mut stdin) = child.stdin.take() {
        tokio::spawn(async move {
            let _ = stdin.write_all(source.as_bytes()).await;
        });
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| format!("failed to wait for {}: {}", program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("{} exited with {}: {}", program, output.status, stderr.trim()).into());
    }

    Ok(RawOutput::Text(
        String::from_utf8_lossy(&output.stdout).into_owned(),
    ))
}
