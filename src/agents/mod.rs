//! Agents module - the ReAct loop.
//!
//! # Components
//! - **parser**: turns raw model text into a thought and an action
//! - **prompt**: the few-shot template the parser's grammar comes from
//! - **ReactAgent**: drives think → parse → act → observe until `Finish`
//!
//! # Design Principles
//! - Single-branch, sequential reasoning; one tool call per step
//! - Context lives in the rendered history string, not in chat turns
//! - Malformed output stops the run with a reason instead of an error

pub mod parser;
pub mod prompt;
mod react;
mod types;

pub use parser::{
    classify_action, extract_final_answer, is_finish, parse_action, parse_output, Action,
    ParsedOutput,
};
pub use prompt::{render_prompt, REACT_PROMPT_TEMPLATE};
pub use react::ReactAgent;
pub use types::{AbortReason, RunOutcome};
