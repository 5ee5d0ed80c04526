// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The workflow step driver.
//!
//! Interprets one template to completion: per iteration it enforces the
//! runaway guards, honors pause/stop flags, reports progress, then
//! dispatches on the step type. All output goes through the I/O channel
//! and is flushed at step boundaries, so the daemon observes step N's
//! output strictly before step N+1's.

use crate::progress::ProgressReporter;
use crate::signals::SignalFlags;
use argo_adapters::channel::DEFAULT_MAX_LINE;
use argo_adapters::{ChannelError, CiClient, IoChannel, ProviderError};
use argo_core::limits::{exit_code, MAX_EXECUTOR_LOG_BYTES, MAX_STEP_EXECUTIONS};
use argo_storage::WorkflowCheckpoint;
use argo_template::{
    evaluate_condition, substitute, ConditionError, Step, StepKind, TemplateError,
    WorkflowContext, WorkflowTemplate,
};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Driver errors
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("step {step}: {source}")]
    Condition {
        step: String,
        #[source]
        source: ConditionError,
    },

    #[error("step budget exhausted ({0} executions)")]
    StepLimit(u32),

    #[error("log file exceeds {0} bytes")]
    ResourceLimit(u64),

    #[error("stopped by signal")]
    Stopped,

    #[error("timed out waiting for input")]
    InputTimeout,
}

impl DriverError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::Stopped => exit_code::SIGNALLED,
            DriverError::InputTimeout => exit_code::TIMEOUT,
            _ => exit_code::FAILURE,
        }
    }
}

/// Seam for CI queries so driver tests run without a daemon.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn query(
        &self,
        prompt: &str,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<String, ProviderError>;
}

#[async_trait]
impl QueryBackend for CiClient {
    async fn query(
        &self,
        prompt: &str,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<String, ProviderError> {
        CiClient::query(self, prompt, provider, model).await
    }
}

/// Driver configuration (assembled from the environment in `main`).
pub struct DriverConfig {
    pub workflow_id: String,
    pub template_path: PathBuf,
    pub branch: String,
    pub environment: String,
    pub args: Vec<String>,
    pub log_path: Option<PathBuf>,
    pub checkpoint_dir: Option<PathBuf>,
    pub input_poll_interval: Duration,
    /// Poll budget for input waits; `None` means bounded only by the
    /// workflow-level timeout (interactive chats may idle for minutes).
    pub input_deadline: Option<Duration>,
    pub pause_poll_interval: Duration,
    pub daemon_url: String,
}

/// The step driver.
pub struct StepDriver<C: IoChannel, Q: QueryBackend> {
    config: DriverConfig,
    channel: C,
    backend: Q,
    reporter: ProgressReporter,
    flags: SignalFlags,
    ctx: WorkflowContext,
    step_count: u32,
    current_step_id: String,
}

impl<C: IoChannel, Q: QueryBackend> StepDriver<C, Q> {
    pub fn new(
        config: DriverConfig,
        channel: C,
        backend: Q,
        reporter: ProgressReporter,
        flags: SignalFlags,
    ) -> Self {
        let ctx = WorkflowContext::seeded(
            &config.workflow_id,
            &config.branch,
            &config.environment,
        );
        Self {
            config,
            channel,
            backend,
            reporter,
            flags,
            ctx,
            step_count: 0,
            current_step_id: String::new(),
        }
    }

    /// Interpret the template to completion.
    pub async fn run(&mut self) -> Result<(), DriverError> {
        let template = WorkflowTemplate::load(&self.config.template_path)?;
        for (i, arg) in self.config.args.iter().enumerate() {
            self.ctx.set(format!("arg{}", i + 1), arg.clone());
        }

        let result = self.run_steps(&template).await;

        // Close flushes remaining output; a transport failure at the very
        // end must not mask the workflow outcome.
        if let Err(e) = self.channel.close().await {
            warn!(error = %e, "channel close failed");
        }

        match &result {
            Ok(()) => self.remove_checkpoint(),
            Err(DriverError::Stopped) => self.save_checkpoint(&template, false),
            Err(_) => {}
        }
        result
    }

    async fn run_steps(&mut self, template: &WorkflowTemplate) -> Result<(), DriverError> {
        let total_steps = template.steps.len() as u32;
        self.current_step_id = template
            .steps
            .first()
            .map(|s| s.id.clone())
            .unwrap_or_default();

        loop {
            if self.flags.stopped() {
                return Err(DriverError::Stopped);
            }

            self.step_count += 1;
            if self.step_count > MAX_STEP_EXECUTIONS {
                return Err(DriverError::StepLimit(MAX_STEP_EXECUTIONS));
            }
            self.check_log_guard()?;
            self.wait_while_paused(template).await?;

            let step = match template.step(&self.current_step_id) {
                Some(step) => step.clone(),
                // Validation guarantees targets exist; a missing first
                // step means an empty template, which load() rejects.
                None => return Ok(()),
            };

            self.reporter
                .report(self.step_count, total_steps, &step.id)
                .await;
            debug!(step = %step.id, execution = self.step_count, "running step");

            let next = self.dispatch(template, &step).await?;
            self.channel.flush().await.or_else(flush_is_besteffort)?;

            match next {
                Some(next_id) => self.current_step_id = next_id,
                None => {
                    info!(steps = self.step_count, "workflow template complete");
                    return Ok(());
                }
            }
        }
    }

    /// Run one step; returns the next step id, or `None` to finish.
    async fn dispatch(
        &mut self,
        template: &WorkflowTemplate,
        step: &Step,
    ) -> Result<Option<String>, DriverError> {
        match &step.kind {
            StepKind::Prompt {
                prompt,
                save_to,
                persona,
                provider,
                model,
            } => {
                let rendered = substitute(prompt, &self.ctx);
                let query = match persona {
                    Some(persona) => format!("[{persona}] {rendered}"),
                    None => rendered,
                };
                let response = self
                    .backend
                    .query(&query, provider.as_deref(), model.as_deref())
                    .await?;
                self.ctx.set(save_to.clone(), response.clone());
                self.channel.write_str(&response).await?;
                self.channel.write_str("\n").await?;
                Ok(self.linear_next(template, step))
            }

            StepKind::CiChat {
                greeting,
                prompt,
                save_to,
                provider,
                model,
            } => {
                self.run_chat(
                    greeting,
                    prompt,
                    save_to,
                    provider.as_deref(),
                    model.as_deref(),
                )
                .await?;
                Ok(self.linear_next(template, step))
            }

            StepKind::Branch {
                condition,
                if_true,
                if_false,
            } => {
                let taken = evaluate_condition(condition, &self.ctx).map_err(|source| {
                    DriverError::Condition {
                        step: step.id.clone(),
                        source,
                    }
                })?;
                debug!(step = %step.id, condition, taken, "branch evaluated");
                Ok(Some(if taken {
                    if_true.clone()
                } else {
                    if_false.clone()
                }))
            }

            StepKind::Set { name, value } => {
                let rendered = substitute(value, &self.ctx);
                self.ctx.set(name.clone(), rendered);
                Ok(self.linear_next(template, step))
            }

            StepKind::Exit => Ok(None),
        }
    }

    /// Interactive chat: greet, then pair each user message with exactly
    /// one provider reply until the user leaves (empty line, `exit`, or
    /// `quit`) or the peer disappears.
    async fn run_chat(
        &mut self,
        greeting: &str,
        prompt: &str,
        save_to: &str,
        provider: Option<&str>,
        model: Option<&str>,
    ) -> Result<(), DriverError> {
        if !greeting.is_empty() {
            let rendered = substitute(greeting, &self.ctx);
            self.channel.write_str(&rendered).await?;
            self.channel.write_str("\n").await?;
        }
        let system_prompt = substitute(prompt, &self.ctx);
        self.channel.flush().await.or_else(flush_is_besteffort)?;

        loop {
            let line = match self.poll_input().await? {
                Some(line) => line,
                None => break,
            };
            let line = line.trim().to_string();
            if line.is_empty() || line == "exit" || line == "quit" {
                break;
            }

            let history = self.ctx.get(save_to).unwrap_or_default().to_string();
            let query = format!("{system_prompt}\n{history}User: {line}");
            let reply = self.backend.query(&query, provider, model).await?;

            self.ctx
                .append(save_to, &format!("User: {line}\nAI: {reply}\n"));
            self.channel.write_str(&format!("AI: {reply}\n")).await?;
            self.channel.flush().await.or_else(flush_is_besteffort)?;
        }
        Ok(())
    }

    /// Poll the channel for one line, honoring stop/pause flags, the
    /// poll interval, and the configured deadline. `None` means EOF.
    async fn poll_input(&mut self) -> Result<Option<String>, DriverError> {
        let started = Instant::now();
        loop {
            if self.flags.stopped() {
                return Err(DriverError::Stopped);
            }
            while self.flags.paused() && !self.flags.stopped() {
                tokio::time::sleep(self.config.pause_poll_interval).await;
            }

            match self.channel.read_line(DEFAULT_MAX_LINE).await {
                Ok(line) => return Ok(Some(line)),
                Err(ChannelError::WouldBlock) => {
                    if let Some(deadline) = self.config.input_deadline {
                        if started.elapsed() > deadline {
                            return Err(DriverError::InputTimeout);
                        }
                    }
                    tokio::time::sleep(self.config.input_poll_interval).await;
                }
                Err(ChannelError::Eof) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Hold between steps while paused, checkpointing once on entry.
    async fn wait_while_paused(
        &mut self,
        template: &WorkflowTemplate,
    ) -> Result<(), DriverError> {
        if !self.flags.paused() {
            return Ok(());
        }
        info!(step = %self.current_step_id, "paused");
        self.save_checkpoint(template, true);
        while self.flags.paused() {
            if self.flags.stopped() {
                return Err(DriverError::Stopped);
            }
            tokio::time::sleep(self.config.pause_poll_interval).await;
        }
        info!(step = %self.current_step_id, "resumed");
        Ok(())
    }

    fn check_log_guard(&self) -> Result<(), DriverError> {
        let Some(log_path) = &self.config.log_path else {
            return Ok(());
        };
        let size = std::fs::metadata(log_path).map(|m| m.len()).unwrap_or(0);
        if size > MAX_EXECUTOR_LOG_BYTES {
            return Err(DriverError::ResourceLimit(MAX_EXECUTOR_LOG_BYTES));
        }
        Ok(())
    }

    /// Explicit successor, or list-order fallthrough to the step after
    /// this one. `None` ends the workflow.
    fn linear_next(&self, template: &WorkflowTemplate, step: &Step) -> Option<String> {
        step.next_step
            .clone()
            .or_else(|| template.step_after(&step.id).map(|s| s.id.clone()))
    }

    fn save_checkpoint(&self, template: &WorkflowTemplate, is_paused: bool) {
        let Some(dir) = &self.config.checkpoint_dir else {
            return;
        };
        let checkpoint = WorkflowCheckpoint {
            workflow_id: self.config.workflow_id.clone(),
            template_path: self.config.template_path.clone(),
            branch: self.config.branch.clone(),
            current_step: self.step_count,
            total_steps: template.steps.len() as u32,
            is_paused,
        };
        if let Err(e) = checkpoint.save(dir) {
            warn!(error = %e, "checkpoint save failed");
        }
    }

    fn remove_checkpoint(&self) {
        if let Some(dir) = &self.config.checkpoint_dir {
            if let Err(e) = WorkflowCheckpoint::remove(dir, &self.config.workflow_id) {
                warn!(error = %e, "checkpoint cleanup failed");
            }
        }
    }

    /// The context after a run (used by tests and for diagnostics).
    pub fn context(&self) -> &WorkflowContext {
        &self.ctx
    }
}

/// Output delivery is at-least-once: a failed flush keeps the buffer for
/// the next boundary instead of failing the step.
fn flush_is_besteffort(e: ChannelError) -> Result<(), DriverError> {
    match e {
        ChannelError::Network(message) => {
            warn!(%message, "output flush failed, will retry");
            Ok(())
        }
        other => Err(other.into()),
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
