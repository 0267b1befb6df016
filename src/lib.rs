//! # react_agent
//!
//! A minimal ReAct agent: the model thinks, picks an action, a tool runs, the
//! observation is fed back, and the loop repeats until the model finishes or
//! the step budget runs out.
//!
//! ## Architecture
//!
//! ```text
//!        ┌──────────────────────────────────┐
//!        │           ReactAgent             │
//!        │  (prompt → think → parse → act)  │
//!        └───────┬──────────────────┬───────┘
//!                │                  │
//!                ▼                  ▼
//!       ┌─────────────────┐  ┌─────────────────┐
//!       │   LlmClient     │  │  ToolRegistry   │
//!       │ (model gateway) │  │ (named tools)   │
//!       └─────────────────┘  └─────────────────┘
//! ```
//!
//! ## Step Flow
//! 1. Render the prompt from tool descriptions, question and history
//! 2. Call the model; parse `Thought:` and `Action:` from its text
//! 3. `Finish[answer]` ends the run; `Tool[input]` is dispatched
//! 4. Append `Action:` and `Observation:` lines to the history
//!
//! ## Modules
//! - `agents`: the loop, output parser and prompt template
//! - `llm`: model gateway trait and the OpenAI-compatible streaming client
//! - `tools`: tool trait, registry and web search
//! - `config`: explicit-or-environment configuration

pub mod agents;
pub mod config;
pub mod llm;
pub mod tools;
pub mod util;

pub use agents::{AbortReason, ReactAgent, RunOutcome};
pub use config::{AgentConfig, ConfigError, LlmConfig};
pub use llm::{LlmClient, OpenAiCompatClient};
pub use tools::{Tool, ToolRegistry};
