// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow subcommands: each maps to one daemon HTTP call (attach polls).

use crate::client::DaemonClient;
use anyhow::{bail, Context, Result};
use argo_daemon::protocol::StartBody;
use clap::{Args, Subcommand};
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::sync::mpsc;
use std::time::Duration;

#[derive(Args)]
pub struct WorkflowArgs {
    #[command(subcommand)]
    action: WorkflowAction,
}

#[derive(Subcommand)]
enum WorkflowAction {
    /// Start a workflow from a template
    Start {
        /// Absolute path to the workflow template JSON
        script: String,
        /// Positional arguments forwarded to the executor
        args: Vec<String>,
        /// Name this instance (id becomes <template>_<instance>)
        #[arg(long)]
        instance: Option<String>,
        /// Branch seeded into the workflow context
        #[arg(long)]
        branch: Option<String>,
        /// Environment name recorded on the workflow
        #[arg(long)]
        environment: Option<String>,
        /// Environment overrides (KEY=VALUE, repeatable)
        #[arg(long = "env", value_name = "KEY=VALUE")]
        env: Vec<String>,
        /// Per-run timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Retry budget for failing executors
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// List known workflows
    List,
    /// Show one workflow's status
    Status { id: String },
    /// Pause a running workflow (SIGUSR1)
    Pause { id: String },
    /// Resume a paused workflow (SIGUSR2)
    Resume { id: String },
    /// Abandon a workflow (SIGTERM, finalized as abandoned)
    Abandon { id: String },
    /// Stream output and forward stdin lines as input
    Attach { id: String },
}

pub fn run_workflow(args: WorkflowArgs) -> Result<()> {
    let client = DaemonClient::from_env()?;
    match args.action {
        WorkflowAction::Start {
            script,
            args,
            instance,
            branch,
            environment,
            env,
            timeout,
            max_retries,
        } => {
            let response = client.start(&StartBody {
                script,
                args,
                env: parse_env_pairs(&env)?,
                instance,
                branch,
                environment,
                timeout_seconds: timeout,
                max_retries,
            })?;
            println!("{}", response.workflow_id);
            Ok(())
        }

        WorkflowAction::List => {
            let response = client.list()?;
            if response.workflows.is_empty() {
                println!("no workflows");
                return Ok(());
            }
            println!("{:<28} {:<10} {:>7}  SCRIPT", "WORKFLOW", "STATE", "PID");
            for wf in response.workflows {
                println!(
                    "{:<28} {:<10} {:>7}  {}",
                    wf.workflow_id, wf.state, wf.pid, wf.script
                );
            }
            Ok(())
        }

        WorkflowAction::Status { id } => {
            let s = client.status(&id)?;
            println!("workflow:  {}", s.workflow_id);
            println!("script:    {}", s.script);
            println!("state:     {}", s.state);
            println!("pid:       {}", s.pid);
            println!("started:   {}", s.start_time);
            if s.end_time > 0 {
                println!("ended:     {}", s.end_time);
                println!("exit code: {}", s.exit_code);
            }
            if s.total_steps > 0 {
                println!("progress:  {}/{} ({})", s.current_step, s.total_steps, s.step_name);
            }
            Ok(())
        }

        WorkflowAction::Pause { id } => {
            client.pause(&id)?;
            println!("{id} paused");
            Ok(())
        }

        WorkflowAction::Resume { id } => {
            client.resume(&id)?;
            println!("{id} resumed");
            Ok(())
        }

        WorkflowAction::Abandon { id } => {
            client.abandon(&id)?;
            println!("{id} abandoned");
            Ok(())
        }

        WorkflowAction::Attach { id } => attach(&client, &id),
    }
}

/// Parse repeatable `KEY=VALUE` flags.
fn parse_env_pairs(pairs: &[String]) -> Result<HashMap<String, String>> {
    let mut env = HashMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid --env value (expected KEY=VALUE): {pair}");
        };
        if key.is_empty() {
            bail!("invalid --env value (empty key): {pair}");
        }
        env.insert(key.to_string(), value.to_string());
    }
    Ok(env)
}

/// Poll output and forward stdin until the workflow goes terminal.
fn attach(client: &DaemonClient, id: &str) -> Result<()> {
    // stdin is read on a helper thread so the poll loop never blocks on
    // a quiet terminal.
    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    println!("attached to {id} (Ctrl-D to detach)");
    loop {
        let output = client.drain_output(id)?.output;
        if !output.is_empty() {
            print!("{output}");
            std::io::stdout().flush().ok();
        }

        while let Ok(line) = rx.try_recv() {
            client
                .send_input(id, &line)
                .with_context(|| format!("sending input to {id}"))?;
        }

        let status = client.status(id)?;
        if matches!(status.state.as_str(), "completed" | "failed" | "abandoned") {
            let trailing = client.drain_output(id)?.output;
            if !trailing.is_empty() {
                print!("{trailing}");
            }
            println!("workflow {id} {} (exit code {})", status.state, status.exit_code);
            return Ok(());
        }

        std::thread::sleep(Duration::from_millis(500));
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
