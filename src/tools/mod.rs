//! Tool system: registry, argument validation and dispatch.
//!
//! Every tool advertises its parameters as static data ([`ParamSpec`]); the
//! registry renders those into JSON Schema for the model and validates the
//! model's arguments against them before a handler ever runs.
//!
//! Two failure tiers meet here. Protocol problems (unknown tool, malformed or
//! schema-violating arguments) surface as [`DispatchError`]. A handler's own
//! runtime failure is folded into the text of a normal [`ToolResult`] so the
//! model always gets a turn to react to it.

mod confirm;
mod file_ops;
mod terminal;

pub use confirm::{
    ConfirmAction, ConfirmationSource, LineConfirmation, ScriptedConfirmation, StdinConfirmation,
    CONFIRMED, DECLINED,
};
pub use file_ops::{ListDirectory, ReadFile, WriteFile};
pub use terminal::{ExecuteCommand, TerminalPolicy};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::llm::{FunctionSchema, ToolCall, ToolSchema};

/// Expected JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// One parameter of a tool, as advertised to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: true,
            description,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            required: false,
            description,
        }
    }
}

/// Immutable description of a registered tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolDefinition {
    /// JSON Schema object describing the parameters.
    pub fn parameters_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| {
                (
                    p.name.to_string(),
                    json!({ "type": p.kind.json_type(), "description": p.description }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn to_schema(&self) -> ToolSchema {
        ToolSchema {
            tool_type: "function".to_string(),
            function: FunctionSchema {
                name: self.name.clone(),
                description: self.description.clone(),
                parameters: self.parameters_schema(),
            },
        }
    }

    /// Check an argument object against the parameter list.
    ///
    /// Unknown extra keys are ignored; a `null` optional counts as absent.
    pub fn validate(&self, args: &Value) -> Result<(), DispatchError> {
        let object = args.as_object().ok_or_else(|| DispatchError::InvalidArguments {
            tool: self.name.clone(),
            field: "arguments".to_string(),
            reason: "must be a JSON object".to_string(),
        })?;

        for param in &self.params {
            match object.get(param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(DispatchError::InvalidArguments {
                        tool: self.name.clone(),
                        field: param.name.to_string(),
                        reason: "is required".to_string(),
                    });
                }
                None | Some(Value::Null) => {}
                Some(value) if !param.kind.matches(value) => {
                    return Err(DispatchError::InvalidArguments {
                        tool: self.name.clone(),
                        field: param.name.to_string(),
                        reason: format!("expected {}", param.kind.json_type()),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Protocol-level dispatch failures. These end the agent loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("tool '{0}' is already registered")]
    DuplicateToolName(String),

    #[error("unknown tool requested: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for tool '{tool}': field '{field}' {reason}")]
    InvalidArguments {
        tool: String,
        field: String,
        reason: String,
    },
}

/// Outcome of one dispatched call, as fed back to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    pub tool_call_id: String,
    /// Plain-text payload; failures are described here too.
    pub content: String,
    /// Set when the handler failed. Only used for operator logging.
    pub is_error: bool,
}

/// A capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters(&self) -> &'static [ParamSpec];

    /// Run the tool. `args` has already been validated against
    /// [`Tool::parameters`]; relative paths resolve against `workspace`.
    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            params: self.parameters().to_vec(),
        }
    }
}

/// A resolved and validated call, ready to run.
pub struct PreparedCall<'a> {
    tool: &'a dyn Tool,
    call_id: &'a str,
    args: Value,
}

impl PreparedCall<'_> {
    pub fn tool_name(&self) -> &str {
        self.tool.name()
    }

    /// Run the handler, folding its failure into the payload.
    pub async fn run(self, workspace: &Path) -> ToolResult {
        let name = self.tool.name();
        match self.tool.execute(self.args, workspace).await {
            Ok(content) => ToolResult {
                tool_call_id: self.call_id.to_string(),
                content,
                is_error: false,
            },
            Err(e) => {
                let content = format!("{:#}", e);
                tracing::warn!(tool = %name, error = %content, "tool call failed");
                ToolResult {
                    tool_call_id: self.call_id.to_string(),
                    content,
                    is_error: true,
                }
            }
        }
    }
}

/// Registry of available tools, keyed by unique name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry with the five standard tools.
    pub fn with_defaults(
        confirmation: Arc<dyn ConfirmationSource>,
        policy: TerminalPolicy,
    ) -> Result<Self, DispatchError> {
        let mut registry = Self::new();
        registry.register(ReadFile)?;
        registry.register(WriteFile)?;
        registry.register(ExecuteCommand::new(policy))?;
        registry.register(ListDirectory)?;
        registry.register(ConfirmAction::new(confirmation))?;
        Ok(registry)
    }

    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), DispatchError> {
        if self.tools.iter().any(|t| t.name() == tool.name()) {
            return Err(DispatchError::DuplicateToolName(tool.name().to_string()));
        }
        self.tools.push(Box::new(tool));
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&dyn Tool, DispatchError> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| &**t)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// `(name, description)` pairs in registration order, for the system prompt.
    pub fn list_tools(&self) -> Vec<(&str, &str)> {
        self.tools
            .iter()
            .map(|t| (t.name(), t.description()))
            .collect()
    }

    /// Wire schemas for the model request.
    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.definition().to_schema()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Resolve the tool and validate the arguments without running anything.
    pub fn prepare<'a>(&'a self, call: &'a ToolCall) -> Result<PreparedCall<'a>, DispatchError> {
        let tool = self.resolve(&call.function.name)?;
        let args = parse_arguments(&call.function.name, &call.function.arguments)?;
        tool.definition().validate(&args)?;

        Ok(PreparedCall {
            tool,
            call_id: &call.id,
            args,
        })
    }

    /// Resolve, validate and run one call.
    pub async fn dispatch(
        &self,
        call: &ToolCall,
        workspace: &Path,
    ) -> Result<ToolResult, DispatchError> {
        Ok(self.prepare(call)?.run(workspace).await)
    }
}

fn parse_arguments(tool: &str, raw: &str) -> Result<Value, DispatchError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(raw).map_err(|e| DispatchError::InvalidArguments {
        tool: tool.to_string(),
        field: "arguments".to_string(),
        reason: format!("is not valid JSON: {}", e),
    })
}

/// Resolve a model-supplied path against the workspace.
pub(crate) fn resolve_path(workspace: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}
