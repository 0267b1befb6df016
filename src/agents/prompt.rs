//! Prompt template for the ReAct loop.
//!
//! The labels and the `Finish[...]` form below are the grammar that
//! [`super::parser`] understands. Change them together.

/// Few-shot ReAct prompt with `{tools}`, `{question}` and `{history}` slots.
pub const REACT_PROMPT_TEMPLATE: &str = r#"You are an assistant that answers questions by reasoning step by step and calling tools when you need outside information.

## Available tools
{tools}

## Output format
Every reply must contain exactly one Thought and one Action, in this form:

Thought: your reasoning about what to do next.
Action: one of
- ToolName[input] to call one of the tools above, for example Search[latest Rust release].
- Finish[final answer] once you are confident you know the answer.

After a tool call the system appends an Observation line with the tool's result. Never write the Observation yourself.

## Question
{question}

## History
{history}

Continue with your next Thought and Action."#;

/// Fill the template slots in a single pass.
///
/// Substituted text is inserted verbatim, so a question that itself contains
/// `{history}` is not expanded a second time. Unknown `{...}` sequences are
/// left alone.
pub fn render_prompt(template: &str, tools: &str, question: &str, history: &str) -> String {
    let slots = [
        ("{tools}", tools),
        ("{question}", question),
        ("{history}", history),
    ];

    let mut out = String::with_capacity(template.len() + tools.len() + question.len() + history.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match slots.iter().find(|(slot, _)| tail.starts_with(*slot)) {
            Some((slot, value)) => {
                out.push_str(value);
                rest = &tail[slot.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
