//! # mini-cursor
//!
//! A bounded, tool-augmented agent loop.
//!
//! This library provides:
//! - A tool-based agent loop driven by an OpenAI-compatible chat model
//! - File, shell and operator-confirmation tools the model can call
//! - Environment-driven configuration
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Seed the conversation with a system prompt and the user's task
//! 2. Call the model with the full log and every tool definition
//! 3. Dispatch any requested tool calls and append one result per call
//! 4. Repeat until the model answers without tool calls or the iteration
//!    budget runs out
//!
//! ## Example
//!
//! ```rust,ignore
//! use mini_cursor::{agent::Agent, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::from_config(config)?;
//! let outcome = agent.run_task("Create a hello world script").await?;
//! println!("{}", outcome.response);
//! ```

pub mod agent;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
