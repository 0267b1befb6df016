//! Output parsing for the ReAct text protocol.
//!
//! The model is prompted with a few-shot `Thought: / Action:` format and no
//! stricter grammar, so every function here degrades gracefully: a missing
//! marker yields `None`, never an error. Markers are case-sensitive.

use std::sync::OnceLock;

use regex::Regex;

const THOUGHT_MARKER: &str = "Thought:";
const ACTION_MARKER: &str = "Action:";
const FINISH_TOKEN: &str = "Finish";

/// Thought and action extracted from one raw model response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    pub thought: Option<String>,
    pub action: Option<String>,
}

/// What the loop should do with an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Terminal action carrying the final answer.
    Finish(String),
    /// Tool invocation.
    Tool { name: String, argument: String },
}

fn tool_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^(\w+)\[(.*)\]").expect("tool call pattern is valid"))
}

fn bracketed_finish_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^Finish\s*\[(.*)\]").expect("finish pattern is valid")
    })
}

fn finish_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^Finish\s*[\[:：\s]+").expect("finish prefix pattern is valid"))
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split a raw response into its thought and action.
///
/// The thought runs from the first `Thought:` to the next `Action:` (or the
/// end of the text). The action is everything after the last `Action:`.
pub fn parse_output(raw: &str) -> ParsedOutput {
    let thought = raw.find(THOUGHT_MARKER).and_then(|start| {
        let rest = &raw[start + THOUGHT_MARKER.len()..];
        let end = rest.find(ACTION_MARKER).unwrap_or(rest.len());
        non_empty(&rest[..end])
    });

    let action = raw
        .rfind(ACTION_MARKER)
        .and_then(|start| non_empty(&raw[start + ACTION_MARKER.len()..]));

    ParsedOutput { thought, action }
}

/// Decompose `Name[argument]` into its parts.
///
/// The name is made of word characters; the argument runs to the last `]`
/// and may span lines. It is returned as written, untrimmed.
pub fn parse_action(action: &str) -> Option<(String, String)> {
    tool_call_re()
        .captures(action.trim())
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

/// Whether the action is the terminal `Finish` action.
pub fn is_finish(action: &str) -> bool {
    action.trim().starts_with(FINISH_TOKEN)
}

/// Pull the final answer out of a `Finish` action.
///
/// `Finish[answer]` yields the bracket content. Otherwise a leading `Finish`
/// followed by `[`, `:`, `：` or whitespace is stripped. If nothing is left the
/// whole action text is the answer.
pub fn extract_final_answer(action: &str) -> String {
    let action = action.trim();

    if let Some(caps) = bracketed_finish_re().captures(action) {
        return caps[1].trim().to_string();
    }

    let stripped = finish_prefix_re().replace(action, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        action.to_string()
    } else {
        stripped.to_string()
    }
}

/// Classify an action, or `None` when it is neither `Finish` nor a
/// well-formed tool call with a non-empty argument.
pub fn classify_action(action: &str) -> Option<Action> {
    if is_finish(action) {
        return Some(Action::Finish(extract_final_answer(action)));
    }

    match parse_action(action) {
        Some((name, argument)) if !argument.is_empty() => Some(Action::Tool { name, argument }),
        _ => None,
    }
}
