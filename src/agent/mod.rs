//! Agent module - the core agent logic.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Build context with system prompt and user task
//! 2. Call LLM with available tools
//! 3. If LLM requests tool calls, execute them and feed every result back
//! 4. Repeat until LLM produces final response or max iterations reached

mod agent_loop;
mod conversation;
mod error;
mod prompt;

pub use agent_loop::{Agent, AgentOutcome, LogEntryType, TaskLogEntry, Termination};
pub use conversation::ConversationState;
pub use error::AgentError;
pub use prompt::build_system_prompt;
