//! System prompt templates for the agent.

use crate::tools::ToolRegistry;

/// Build the system prompt with tool definitions.
pub fn build_system_prompt(workspace_path: &str, tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .enumerate()
        .map(|(i, (name, description))| format!("{}. **{}**: {}", i + 1, name, description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a project assistant that completes tasks by using tools.

Current working directory: {workspace_path}

## Tools
{tool_descriptions}

## Rules for execute_command

1. The `workingDirectory` parameter switches into that directory before the command runs.
2. When you pass `workingDirectory`, never use `cd` inside `command`.
   - Wrong: {{ "command": "cd react-todo-app && npm install", "workingDirectory": "react-todo-app" }}
     This fails, because the command already runs inside react-todo-app and `cd react-todo-app` cannot find the directory.
   - Right: {{ "command": "npm install", "workingDirectory": "react-todo-app" }}
3. Command output is shown to the user, not to you. You only learn whether the command succeeded.

## Asking the user

When you need the user's approval, call `confirm_action`. Do not ask questions in plain text and wait for input: the terminal cannot answer them.

## Response Format

Keep replies short and only say what you did."#,
        workspace_path = workspace_path,
        tool_descriptions = tool_descriptions
    )
}
