//! Core agent loop implementation.

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::config::Config;
use crate::llm::{LlmClient, OpenAiClient, ToolCall};
use crate::tools::{DispatchError, StdinConfirmation, ToolRegistry, ToolResult};

use super::conversation::ConversationState;
use super::error::AgentError;
use super::prompt::build_system_prompt;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The model produced a final answer.
    Final,
    /// The iteration budget ran out first.
    IterationLimit,
}

/// Result of [`Agent::run_task`].
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    /// Final answer, or the content of the last assistant message when the
    /// budget ran out (possibly empty).
    pub response: String,
    pub termination: Termination,
    /// Number of model invocations made.
    pub iterations: usize,
    pub log: Vec<TaskLogEntry>,
}

/// A single entry in the task execution log.
#[derive(Debug, Clone, Serialize)]
pub struct TaskLogEntry {
    /// Timestamp (RFC 3339)
    pub timestamp: String,

    /// Entry type
    pub entry_type: LogEntryType,

    /// Content of the entry
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogEntryType {
    ToolCall,
    ToolResult,
    Response,
}

impl TaskLogEntry {
    fn new(entry_type: LogEntryType, content: String) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            entry_type,
            content,
        }
    }
}

/// The tool-using agent.
pub struct Agent {
    config: Config,
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
}

impl Agent {
    /// Create an agent from explicitly constructed collaborators.
    pub fn new(config: Config, llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> Self {
        Self { config, llm, tools }
    }

    /// Create an agent talking to the configured endpoint, with the default
    /// tools and confirmations read from stdin.
    pub fn from_config(config: Config) -> Result<Self, DispatchError> {
        let llm = Arc::new(
            OpenAiClient::new(config.api_key.clone(), config.base_url.clone())
                .with_temperature(config.temperature),
        );
        let tools = ToolRegistry::with_defaults(
            Arc::new(StdinConfirmation::new()),
            config.terminal,
        )?;

        Ok(Self::new(config, llm, Arc::new(tools)))
    }

    /// Run a task and return the final response and execution log.
    pub async fn run_task(&self, task: &str) -> Result<AgentOutcome, AgentError> {
        let mut log = Vec::new();
        let workspace_str = self.config.workspace_path.to_string_lossy().to_string();

        let system_prompt = build_system_prompt(&workspace_str, &self.tools);
        let mut conversation = ConversationState::new(system_prompt, task);

        // Get tool schemas for LLM
        let tool_schemas = self.tools.get_tool_schemas();

        for iteration in 0..self.config.max_iterations {
            tracing::debug!("Agent iteration {}", iteration + 1);

            let response = self
                .llm
                .chat_completion(
                    &self.config.default_model,
                    conversation.messages(),
                    Some(tool_schemas.as_slice()),
                )
                .await?;

            // No tool calls - this is the final response
            if response.calls().is_empty() {
                let content = response
                    .text()
                    .map(str::to_string)
                    .ok_or(AgentError::EmptyResponse)?;
                conversation.push_assistant(Some(content.clone()), None)?;

                tracing::info!(iterations = iteration + 1, "Agent produced final response");
                log.push(TaskLogEntry::new(
                    LogEntryType::Response,
                    truncate_for_log(&content, 2000),
                ));
                return Ok(AgentOutcome {
                    response: content,
                    termination: Termination::Final,
                    iterations: iteration + 1,
                    log,
                });
            }

            let calls: Vec<ToolCall> = response.calls().to_vec();
            conversation.push_assistant(response.content, response.tool_calls)?;

            let results = self.dispatch_batch(&calls, &mut log).await?;
            for result in results {
                conversation.push_tool_result(&result.tool_call_id, result.content)?;
            }
        }

        tracing::warn!(
            max_iterations = self.config.max_iterations,
            "Max iterations reached without a final response"
        );

        let response = conversation
            .last_assistant()
            .and_then(|m| m.content.clone())
            .unwrap_or_default();
        Ok(AgentOutcome {
            response,
            termination: Termination::IterationLimit,
            iterations: self.config.max_iterations,
            log,
        })
    }

    /// Execute every call of one assistant turn.
    ///
    /// The whole batch is resolved and validated before any handler runs.
    /// Results come back in issue order, even when run concurrently.
    async fn dispatch_batch(
        &self,
        calls: &[ToolCall],
        log: &mut Vec<TaskLogEntry>,
    ) -> Result<Vec<ToolResult>, AgentError> {
        let prepared = calls
            .iter()
            .map(|call| self.tools.prepare(call))
            .collect::<Result<Vec<_>, _>>()?;

        for call in calls {
            tracing::info!(
                tool = %call.function.name,
                args = %call.function.arguments,
                "Calling tool"
            );
            log.push(TaskLogEntry::new(
                LogEntryType::ToolCall,
                format!(
                    "Calling tool: {} with args: {}",
                    call.function.name, call.function.arguments
                ),
            ));
        }

        let workspace: &Path = &self.config.workspace_path;
        let results = if self.config.parallel_tool_calls {
            join_all(prepared.into_iter().map(|p| p.run(workspace))).await
        } else {
            let mut results = Vec::with_capacity(prepared.len());
            for p in prepared {
                results.push(p.run(workspace).await);
            }
            results
        };

        for result in &results {
            log.push(TaskLogEntry::new(
                LogEntryType::ToolResult,
                truncate_for_log(&result.content, 1000),
            ));
        }

        Ok(results)
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated]", &s[..end])
    }
}
