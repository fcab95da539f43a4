//! Terminal/shell command execution tool.

use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;

use anyhow::anyhow;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;

use super::{resolve_path, ParamKind, ParamSpec, Tool};

const EXECUTE_COMMAND_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("command", ParamKind::String, "The shell command to execute"),
    ParamSpec::optional(
        "workingDirectory",
        ParamKind::String,
        "Directory to run the command in (recommended)",
    ),
];

/// Structural checks applied before a command is spawned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminalPolicy {
    /// Refuse commands that start with `cd` when `workingDirectory` is also
    /// given. Off by default: the rule is otherwise only stated in the
    /// system prompt.
    pub reject_cd_with_working_directory: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteCommandArgs {
    command: String,
    #[serde(default)]
    working_directory: Option<String>,
}

/// Run a shell command with the operator's terminal attached.
///
/// Output streams straight to the operator rather than back to the model;
/// only the exit status is reported.
pub struct ExecuteCommand {
    policy: TerminalPolicy,
}

impl ExecuteCommand {
    pub fn new(policy: TerminalPolicy) -> Self {
        Self { policy }
    }
}

fn starts_with_cd(command: &str) -> bool {
    static LEADING_CD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*cd(\s|$)").unwrap());
    LEADING_CD.is_match(command)
}

impl Default for ExecuteCommand {
    fn default() -> Self {
        Self::new(TerminalPolicy::default())
    }
}

#[async_trait]
impl Tool for ExecuteCommand {
    fn name(&self) -> &str {
        "execute_command"
    }

    fn description(&self) -> &str {
        "Execute a system command, optionally in a given working directory. \
         Output is shown to the user in real time."
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        EXECUTE_COMMAND_PARAMS
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let ExecuteCommandArgs {
            command,
            working_directory,
        } = serde_json::from_value(args)?;
        let working_directory = working_directory.filter(|dir| !dir.trim().is_empty());

        if self.policy.reject_cd_with_working_directory
            && working_directory.is_some()
            && starts_with_cd(&command)
        {
            return Err(anyhow!(
                "Command rejected: workingDirectory is already set, do not use cd in the command"
            ));
        }

        let cwd = match &working_directory {
            Some(dir) => resolve_path(workspace, dir),
            None => workspace.to_path_buf(),
        };

        tracing::info!(command = %command, cwd = %cwd.display(), "Executing command");

        // Determine shell based on OS
        let (shell, shell_arg) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let status = Command::new(shell)
            .arg(shell_arg)
            .arg(&command)
            .current_dir(&cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| anyhow!("Command failed to start: {}", e))?;

        match status.code() {
            Some(0) => {
                tracing::info!(command = %command, "Command succeeded");
                let mut result = format!("Command executed successfully: {}", command);
                if let Some(dir) = &working_directory {
                    result.push_str(&format!(
                        "\n\nNote: the command ran in directory \"{dir}\". \
                         To run more commands in this project directory, \
                         pass workingDirectory: \"{dir}\" again instead of using cd."
                    ));
                }
                Ok(result)
            }
            Some(code) => Err(anyhow!("Command failed with exit code: {}", code)),
            None => Err(anyhow!("Command terminated by signal")),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leading_cd_detection() {
        assert!(starts_with_cd("cd app && npm install"));
        assert!(starts_with_cd("  cd"));
        assert!(!starts_with_cd("cdk deploy"));
        assert!(!starts_with_cd("npm run build && cd dist"));
    }

    #[tokio::test]
    async fn exit_zero_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let result = ExecuteCommand::default()
            .execute(json!({"command": "exit 0"}), dir.path())
            .await
            .unwrap();
        assert_eq!(result, "Command executed successfully: exit 0");
    }

    #[tokio::test]
    async fn non_zero_exit_reports_code() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExecuteCommand::default()
            .execute(json!({"command": "exit 7"}), dir.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains('7'));
        assert_eq!(err.to_string(), "Command failed with exit code: 7");
    }

    #[tokio::test]
    async fn working_directory_is_used_and_reminded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("app")).unwrap();

        let result = ExecuteCommand::default()
            .execute(
                json!({"command": "touch marker", "workingDirectory": "app"}),
                dir.path(),
            )
            .await
            .unwrap();

        assert!(dir.path().join("app/marker").exists());
        assert!(result.starts_with("Command executed successfully: touch marker"));
        assert!(result.contains("workingDirectory: \"app\""));
    }

    #[tokio::test]
    async fn missing_working_directory_fails_to_start() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExecuteCommand::default()
            .execute(
                json!({"command": "true", "workingDirectory": "does-not-exist"}),
                dir.path(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Command failed to start: "));
    }

    #[tokio::test]
    async fn cd_is_advisory_by_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("app")).unwrap();
        let result = ExecuteCommand::default()
            .execute(
                json!({"command": "cd . && true", "workingDirectory": "app"}),
                dir.path(),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn guard_rejects_cd_with_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("app")).unwrap();
        let tool = ExecuteCommand::new(TerminalPolicy {
            reject_cd_with_working_directory: true,
        });

        let err = tool
            .execute(
                json!({"command": "cd app && touch marker", "workingDirectory": "app"}),
                dir.path(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Command rejected"));
        assert!(!dir.path().join("app/marker").exists());

        // Without a working directory the guard does not apply.
        let ok = tool
            .execute(json!({"command": "cd app && true"}), dir.path())
            .await;
        assert!(ok.is_ok());
    }
}
