//! Agent loop errors.
//!
//! Only protocol-level failures live here. A tool that fails at runtime
//! does not produce an `AgentError`; its failure text goes back to the model.

use thiserror::Error;

use crate::llm::LlmError;
use crate::tools::DispatchError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model invocation failed: {0}")]
    ModelInvocationFailed(#[from] LlmError),

    #[error("model returned an empty response (no content and no tool calls)")]
    EmptyResponse,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("conversation protocol violation: {0}")]
    ProtocolViolation(String),
}
