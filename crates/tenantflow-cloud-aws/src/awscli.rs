//! aws CLI wrapper
//!
//! Every call goes through `aws <service> <operation> --cli-input-json file://<doc>`
//! so request payloads reach the service exactly as written.

use crate::error::{AwsError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::Write;
use std::process::Stdio;
use tempfile::NamedTempFile;
use tokio::process::Command;

const SERVICE_ERROR_MARKER: &str = "An error occurred (";

/// aws CLI wrapper
#[derive(Debug, Clone)]
pub struct AwsCli {
    program: String,
    launcher_args: Vec<String>,
    region: Option<String>,
    profile: Option<String>,
}

impl AwsCli {
    pub fn new(region: Option<String>) -> Self {
        Self {
            program: "aws".to_string(),
            launcher_args: Vec::new(),
            region,
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Run the CLI through another program, e.g. `aws-vault exec prod -- aws`
    pub fn with_launcher(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.program = program.into();
        self.launcher_args = args;
        self
    }

    /// Check that the CLI is installed and has working credentials
    pub async fn check_auth(&self) -> Result<CallerIdentity> {
        let output = self
            .run_command(&["sts", "get-caller-identity", "--output", "json"])
            .await
            .map_err(|e| match e {
                AwsError::Service { message, .. } => AwsError::AuthenticationFailed(message),
                other => other,
            })?;

        let identity: CallerIdentity = serde_json::from_str(&output)?;
        Ok(identity)
    }

    /// Invoke one operation with a JSON input document
    ///
    /// The document is written to a temporary file and passed as
    /// `file://<path>`. A single argument is capped at 128 KiB on Linux.
    pub async fn call(&self, service: &str, operation: &str, input: &Value) -> Result<Value> {
        let mut input_file = NamedTempFile::new()?;
        serde_json::to_writer(&mut input_file, input)?;
        input_file.flush()?;

        let input_arg = format!("file://{}", input_file.path().display());
        let output = self
            .run_command(&[
                service,
                operation,
                "--cli-input-json",
                input_arg.as_str(),
                "--output",
                "json",
            ])
            .await?;
        drop(input_file);

        // Operations such as put-role-policy print nothing on success
        if output.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        Ok(serde_json::from_str(&output)?)
    }

    /// Run an aws command and return stdout
    async fn run_command(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.launcher_args);
        cmd.args(args);
        if let Some(region) = &self.region {
            cmd.arg("--region").arg(region);
        }
        if let Some(profile) = &self.profile {
            cmd.arg("--profile").arg(profile);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!(
            "Running: aws {}",
            args.iter().take(2).copied().collect::<Vec<_>>().join(" ")
        );

        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AwsError::AwsNotFound
            } else {
                AwsError::IoError(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(parse_service_error(&stderr)
                .unwrap_or_else(|| AwsError::CommandFailed(stderr.trim().to_string())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Parse `An error occurred (Code) when calling the Op operation: message`
pub(crate) fn parse_service_error(stderr: &str) -> Option<AwsError> {
    let start = stderr.find(SERVICE_ERROR_MARKER)? + SERVICE_ERROR_MARKER.len();
    let rest = &stderr[start..];
    let (code, after) = rest.split_once(')')?;

    let operation = after
        .trim_start()
        .strip_prefix("when calling the ")
        .and_then(|s| s.split_whitespace().next())
        .unwrap_or("unknown")
        .to_string();

    // Retried calls add "(reached max retries: N)" before the message
    let tail = after
        .split_once(" operation")
        .map(|(_, t)| t)
        .unwrap_or(after)
        .trim_start();
    let tail = match tail.strip_prefix('(') {
        Some(t) => t.split_once(')').map(|(_, t)| t).unwrap_or(t),
        None => tail,
    };
    let message = tail.trim_start().trim_start_matches(':').trim().to_string();

    Some(AwsError::Service {
        operation,
        code: code.to_string(),
        message,
    })
}

/// Result of `aws sts get-caller-identity`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallerIdentity {
    pub user_id: String,
    pub account: String,
    pub arn: String,
}
