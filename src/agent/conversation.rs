//! Append-only conversation log.

use std::collections::HashSet;

use crate::llm::{ChatMessage, ToolCall};

use super::error::AgentError;

/// The ordered message log sent to the model on every invocation.
///
/// Tracks which tool calls of the latest assistant turn are still
/// unanswered, and refuses appends that would break call/result pairing.
#[derive(Debug, Clone)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
    pending: HashSet<String>,
}

impl ConversationState {
    /// Start a conversation with one system and one user message.
    pub fn new(system_prompt: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(task)],
            pending: HashSet::new(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether every call of the latest assistant turn has been answered.
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    /// Append an assistant turn; its tool calls become pending.
    pub fn push_assistant(
        &mut self,
        content: Option<String>,
        tool_calls: Option<Vec<ToolCall>>,
    ) -> Result<&ChatMessage, AgentError> {
        if !self.is_settled() {
            return Err(AgentError::ProtocolViolation(format!(
                "{} tool call(s) still unanswered",
                self.pending.len()
            )));
        }

        let message = ChatMessage::assistant(content, tool_calls);
        let mut ids = HashSet::new();
        for call in message.calls() {
            if !ids.insert(call.id.clone()) {
                return Err(AgentError::ProtocolViolation(format!(
                    "duplicate tool call id '{}' in one turn",
                    call.id
                )));
            }
        }

        self.pending = ids;
        self.messages.push(message);
        Ok(&self.messages[self.messages.len() - 1])
    }

    /// Append the result of a pending tool call.
    pub fn push_tool_result(
        &mut self,
        tool_call_id: &str,
        content: impl Into<String>,
    ) -> Result<(), AgentError> {
        if !self.pending.remove(tool_call_id) {
            return Err(AgentError::ProtocolViolation(format!(
                "tool result for unknown or already answered call '{}'",
                tool_call_id
            )));
        }
        self.messages.push(ChatMessage::tool_result(tool_call_id, content));
        Ok(())
    }

    /// The most recent assistant message, if any.
    pub fn last_assistant(&self) -> Option<&ChatMessage> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::llm::Role::Assistant)
    }
}
