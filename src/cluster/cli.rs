//! [`ClusterController`] backed by the controller command-line client.
//!
//! Every call spawns one CLI process with an upper time bound; output is
//! requested as YAML and parsed here. Transport to the units is entirely the
//! CLI's business.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_yaml::Value;
use tokio::process::Command;
use tracing::debug;
use tracing::instrument;
use tracing::warn;

use super::ActionHandle;
use super::ActionParams;
use super::ActionResult;
use super::ClusterController;
use super::CommandOutput;
use crate::ControllerConfig;
use crate::ControllerError;
use crate::Result;
use crate::StatusMessage;
use crate::UnitName;

pub struct CliController {
    config: ControllerConfig,
}

impl CliController {
    pub fn new(config: ControllerConfig) -> Self {
        Self { config }
    }

    /// Arguments for one CLI call, with the model selector appended when set.
    pub(crate) fn args(
        &self,
        subcommand: &str,
        rest: &[String],
    ) -> Vec<String> {
        let mut args = vec![subcommand.to_string()];
        if let Some(model) = &self.config.model {
            args.push("-m".to_string());
            args.push(model.clone());
        }
        args.extend(rest.iter().cloned());
        args
    }

    async fn run_cli(
        &self,
        args: Vec<String>,
        budget: Duration,
    ) -> Result<String> {
        let rendered = format!("{} {}", self.config.binary, args.join(" "));
        debug!(command = %rendered, "invoking controller CLI");

        let child = Command::new(&self.config.binary)
            .args(&args)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(budget, child).await {
            Err(_) => {
                return Err(ControllerError::Timeout {
                    command: rendered,
                    timeout: budget,
                }
                .into())
            }
            Ok(Err(source)) => {
                return Err(ControllerError::Spawn {
                    command: rendered,
                    source,
                }
                .into())
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let exit_code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(command = %rendered, exit_code, "controller CLI failed");
            return Err(ControllerError::NonZeroExit {
                command: rendered,
                exit_code,
                stderr,
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl ClusterController for CliController {
    #[instrument(skip(self))]
    async fn exec(
        &self,
        unit: &str,
        command: &str,
    ) -> Result<CommandOutput> {
        let args = self.args(
            "run",
            &[
                "--format=yaml".to_string(),
                "--unit".to_string(),
                unit.to_string(),
                "--".to_string(),
                command.to_string(),
            ],
        );
        let raw = self.run_cli(args, self.config.command_timeout()).await?;
        parse_run_output(&raw)
    }

    #[instrument(skip(self))]
    async fn invoke_action(
        &self,
        unit: &str,
        name: &str,
        params: &ActionParams,
    ) -> Result<ActionHandle> {
        let mut rest = vec![unit.to_string(), name.to_string()];
        rest.extend(params.iter().map(|(k, v)| format!("{k}={v}")));
        let raw = self
            .run_cli(self.args("run-action", &rest), self.config.command_timeout())
            .await?;
        Ok(ActionHandle {
            id: parse_action_id(&raw)?,
            unit: unit.to_string(),
            name: name.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn fetch_result(
        &self,
        handle: &ActionHandle,
        timeout: Duration,
    ) -> Result<ActionResult> {
        let args = self.args(
            "show-action-output",
            &[
                "--format=yaml".to_string(),
                format!("--wait={}s", timeout.as_secs().max(1)),
                handle.id.clone(),
            ],
        );
        // the CLI itself waits up to `timeout`
        let raw = self
            .run_cli(args, timeout + self.config.command_timeout())
            .await?;
        parse_action_output(&raw)
    }

    #[instrument(skip(self))]
    async fn current_status(
        &self,
        role: &str,
    ) -> Result<BTreeMap<UnitName, StatusMessage>> {
        let args = self.args("status", &["--format=yaml".to_string(), role.to_string()]);
        let raw = self.run_cli(args, self.config.command_timeout()).await?;
        parse_status(&raw, role)
    }

    #[instrument(skip(self))]
    async fn configure(
        &self,
        role: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let args = self.args("config", &[role.to_string(), format!("{key}={value}")]);
        self.run_cli(args, self.config.command_timeout()).await?;
        Ok(())
    }
}

fn parse_yaml(raw: &str) -> Result<Value> {
    serde_yaml::from_str(raw).map_err(|e| ControllerError::Parse(e.to_string()).into())
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Unit messages for `role` out of `status --format=yaml`. Subordinate units
/// are listed under their principal and are collected from there.
pub(crate) fn parse_status(
    raw: &str,
    role: &str,
) -> Result<BTreeMap<UnitName, StatusMessage>> {
    let doc = parse_yaml(raw)?;
    let applications = doc
        .get("applications")
        .and_then(Value::as_mapping)
        .ok_or_else(|| ControllerError::Parse("status output has no applications".into()))?;

    let prefix = format!("{role}/");
    let mut messages = BTreeMap::new();
    let mut collect = |units: &Value| {
        if let Some(units) = units.as_mapping() {
            for (name, unit) in units {
                let Some(name) = name.as_str() else { continue };
                if !name.starts_with(&prefix) {
                    continue;
                }
                let message = unit
                    .get("workload-status")
                    .and_then(|w| w.get("message"))
                    .and_then(scalar)
                    .unwrap_or_default();
                messages.insert(name.to_string(), message);
            }
        }
    };

    for (_, application) in applications {
        if let Some(units) = application.get("units") {
            collect(units);
            if let Some(principals) = units.as_mapping() {
                for (_, principal) in principals {
                    if let Some(subordinates) = principal.get("subordinates") {
                        collect(subordinates);
                    }
                }
            }
        }
    }
    Ok(messages)
}

/// Exit code and combined output out of `run --format=yaml`.
pub(crate) fn parse_run_output(raw: &str) -> Result<CommandOutput> {
    let doc = parse_yaml(raw)?;
    let entry = match &doc {
        Value::Sequence(entries) => entries.first().cloned(),
        Value::Mapping(_) => Some(doc.clone()),
        _ => None,
    }
    .ok_or_else(|| ControllerError::Parse("run output has no result entry".into()))?;

    let exit_code = ["Code", "ReturnCode"]
        .iter()
        .find_map(|key| entry.get(*key).and_then(scalar))
        .map(|code| {
            code.trim()
                .parse::<i32>()
                .map_err(|_| ControllerError::Parse(format!("exit code {code:?}")))
        })
        .transpose()?
        .unwrap_or(0);

    let mut output = String::new();
    for key in ["Stdout", "Stderr"] {
        if let Some(text) = entry.get(key).and_then(scalar) {
            output.push_str(&text);
        }
    }
    Ok(CommandOutput::new(output.trim_end(), exit_code))
}

/// Action id out of `run-action` ("Action queued with id: <id>").
pub(crate) fn parse_action_id(raw: &str) -> Result<String> {
    raw.lines()
        .find(|line| line.contains("id:"))
        .and_then(|line| line.rsplit(':').next())
        .map(|id| id.trim().trim_matches('"').to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ControllerError::Parse(format!("no action id in {raw:?}")).into())
}

/// Terminal state and result fields out of `show-action-output --format=yaml`.
/// Nested result maps are flattened to dotted keys.
pub(crate) fn parse_action_output(raw: &str) -> Result<ActionResult> {
    let doc = parse_yaml(raw)?;
    let status = doc.get("status").and_then(scalar).unwrap_or_default();

    let mut fields = BTreeMap::new();
    if let Some(results) = doc.get("results") {
        flatten("", results, &mut fields);
    }

    let failure = (status == "failed").then(|| {
        doc.get("message")
            .and_then(scalar)
            .unwrap_or_else(|| "action failed".to_string())
    });

    Ok(ActionResult {
        completed: matches!(status.as_str(), "completed" | "failed"),
        failure,
        fields,
    })
}

fn flatten(
    prefix: &str,
    value: &Value,
    out: &mut BTreeMap<String, String>,
) {
    match value {
        Value::Mapping(map) => {
            for (key, nested) in map {
                let Some(key) = scalar(key) else { continue };
                let path = if prefix.is_empty() { key } else { format!("{prefix}.{key}") };
                flatten(&path, nested, out);
            }
        }
        other => {
            if let Some(text) = scalar(other) {
                out.insert(prefix.to_string(), text);
            }
        }
    }
}
