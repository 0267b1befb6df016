//! The ReAct agent loop.

use std::sync::Arc;

use crate::config::AgentConfig;
use crate::llm::{ChatMessage, ChatOptions, LlmClient};
use crate::tools::ToolRegistry;
use crate::util::truncate_for_log;

use super::parser::{classify_action, parse_output, Action};
use super::prompt::{render_prompt, REACT_PROMPT_TEMPLATE};
use super::types::{AbortReason, RunOutcome};

/// Agent that answers a question by alternating model calls and tool calls.
///
/// # Algorithm
/// 1. Render the prompt from tool descriptions, question and history
/// 2. Ask the model for a `Thought:` and an `Action:`
/// 3. `Finish[...]` ends the run with an answer
/// 4. `Tool[input]` runs the tool; the action and its observation join the history
/// 5. Repeat until finished, a step fails to parse, or `max_steps` is spent
///
/// # Invariants
/// - At most `max_steps` model calls per run
/// - History grows by exactly two lines per dispatched tool call and is
///   cleared when a run starts
/// - `run` never fails: every error path ends in [`RunOutcome::Aborted`]
pub struct ReactAgent {
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    config: AgentConfig,
    history: Vec<String>,
}

impl ReactAgent {
    pub fn new(llm: Arc<dyn LlmClient>, tools: ToolRegistry, config: AgentConfig) -> Self {
        Self {
            llm,
            tools,
            config,
            history: Vec::new(),
        }
    }

    /// Action/observation transcript of the most recent run.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Run the loop and return the final answer, or `None` if the run aborted.
    pub async fn run(&mut self, question: &str) -> Option<String> {
        self.run_detailed(question).await.into_answer()
    }

    /// Run the loop and report how it ended.
    pub async fn run_detailed(&mut self, question: &str) -> RunOutcome {
        self.history.clear();

        let run_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        let max_steps = self.config.max_steps;
        let tools_desc = self.tools.describe_all();
        let options = ChatOptions {
            temperature: Some(self.config.temperature),
        };

        tracing::info!(run_id = %run_id, max_steps, tools = self.tools.len(), "Starting ReAct run");

        let mut step = 0;
        loop {
            step += 1;
            if step > max_steps {
                tracing::warn!(run_id = %run_id, "Reached {} steps without a final answer", max_steps);
                return RunOutcome::aborted(AbortReason::StepBudgetExhausted, max_steps);
            }
            tracing::info!(run_id = %run_id, "--- Step {} ---", step);

            let prompt = render_prompt(
                REACT_PROMPT_TEMPLATE,
                &tools_desc,
                question,
                &self.history.join("\n"),
            );
            let messages = [ChatMessage::user(prompt)];

            let response = match self.llm.think(&messages, &options).await {
                Some(text) if !text.trim().is_empty() => text,
                _ => {
                    tracing::warn!(run_id = %run_id, step, "Model returned no usable response, stopping");
                    return RunOutcome::aborted(AbortReason::GenerationFailed, step);
                }
            };

            let parsed = parse_output(&response);
            if let Some(thought) = &parsed.thought {
                tracing::info!(run_id = %run_id, step, "Thought: {}", thought);
            }

            let action = match parsed.action {
                Some(action) => action,
                None => {
                    tracing::warn!(
                        run_id = %run_id,
                        step,
                        "No Action found in model output, stopping: {}",
                        truncate_for_log(&response, 300)
                    );
                    return RunOutcome::aborted(AbortReason::NoActionParsed, step);
                }
            };

            let observation = match classify_action(&action) {
                Some(Action::Finish(answer)) => {
                    tracing::info!(run_id = %run_id, step, "Final answer: {}", answer);
                    return RunOutcome::finished(answer, step);
                }
                Some(Action::Tool { name, argument }) => self.dispatch(&name, &argument).await,
                None => {
                    tracing::warn!(run_id = %run_id, step, "Could not parse a tool call from action, stopping: {}", action);
                    return RunOutcome::aborted(AbortReason::NoToolParsed, step);
                }
            };

            tracing::info!(
                run_id = %run_id,
                step,
                "Observation: {}",
                truncate_for_log(&observation, 1000)
            );

            self.history.push(format!("Action: {}", action));
            self.history.push(format!("Observation: {}", observation));
        }
    }

    /// Run one tool call. Unknown tools and tool errors become observations
    /// so the model can correct itself on the next step.
    async fn dispatch(&self, name: &str, argument: &str) -> String {
        let tool = match self.tools.lookup(name) {
            Some(tool) => tool,
            None => {
                tracing::warn!("Model requested unknown tool '{}'", name);
                return format!("Error: no tool named '{}' was found.", name);
            }
        };

        tracing::debug!("Calling tool {} with input: {}", name, truncate_for_log(argument, 200));
        match tool.call(argument).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("Tool '{}' failed: {}", name, e);
                format!("Error: tool '{}' failed: {}", name, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    /// Replays canned responses and records every prompt it was sent.
    struct ScriptedLlm {
        responses: Mutex<VecDeque<Option<String>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<Option<&str>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(str::to_string))
                        .collect(),
                ),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn prompt(&self, idx: usize) -> String {
            self.prompts.lock().unwrap()[idx].clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn think(&self, messages: &[ChatMessage], _options: &ChatOptions) -> Option<String> {
            assert_eq!(messages.len(), 1);
            self.prompts.lock().unwrap().push(messages[0].content.clone());
            self.responses.lock().unwrap().pop_front().flatten()
        }
    }

    fn registry() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools.register_fn("Search", "Web search.", |q| Ok(format!("found: {}", q)));
        tools.register_fn("Broken", "Always fails.", |_| Err(anyhow::anyhow!("boom")));
        tools
    }

    fn agent(llm: Arc<ScriptedLlm>, max_steps: usize) -> ReactAgent {
        ReactAgent::new(llm, registry(), AgentConfig::default().with_max_steps(max_steps))
    }

    #[tokio::test]
    async fn zero_steps_makes_no_calls() {
        let llm = ScriptedLlm::new(vec![Some("Action: Finish[x]")]);
        let mut agent = agent(llm.clone(), 0);

        let outcome = agent.run_detailed("q").await;

        assert_eq!(outcome, RunOutcome::aborted(AbortReason::StepBudgetExhausted, 0));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn finishes_on_first_step() {
        let llm = ScriptedLlm::new(vec![Some("Thought: T\nAction: Finish[A]")]);
        let mut agent = agent(llm.clone(), 5);

        assert_eq!(agent.run("q").await.as_deref(), Some("A"));
        assert_eq!(llm.calls(), 1);
        assert!(agent.history().is_empty());
    }

    #[tokio::test]
    async fn tool_step_feeds_history_into_next_prompt() {
        let llm = ScriptedLlm::new(vec![
            Some("Thought: need data\nAction: Search[2025124期 双色球]"),
            Some("Thought: got it\nAction: Finish[03 08 15]"),
        ]);
        let mut agent = agent(llm.clone(), 5);

        let outcome = agent.run_detailed("Which numbers were drawn?").await;

        assert_eq!(outcome, RunOutcome::finished("03 08 15", 2));
        assert_eq!(
            agent.history(),
            &[
                "Action: Search[2025124期 双色球]".to_string(),
                "Observation: found: 2025124期 双色球".to_string(),
            ]
        );

        let first = llm.prompt(0);
        assert!(first.contains("- Search: Web search.\n- Broken: Always fails."));
        assert!(first.contains("Which numbers were drawn?"));
        assert!(!first.contains("Observation: found"));

        let second = llm.prompt(1);
        assert!(second.contains(
            "Action: Search[2025124期 双色球]\nObservation: found: 2025124期 双色球"
        ));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_observation() {
        let llm = ScriptedLlm::new(vec![
            Some("Action: Wikipedia[rust]"),
            Some("Action: Finish[gave up on wiki]"),
        ]);
        let mut agent = agent(llm.clone(), 5);

        assert_eq!(agent.run("q").await.as_deref(), Some("gave up on wiki"));
        assert_eq!(agent.history().len(), 2);
        assert!(agent.history()[1].contains("'Wikipedia'"));
        assert!(llm.prompt(1).contains("no tool named 'Wikipedia'"));
    }

    #[tokio::test]
    async fn unknown_tool_on_last_step_exhausts_budget() {
        let llm = ScriptedLlm::new(vec![Some("Action: Wikipedia[rust]")]);
        let mut agent = agent(llm.clone(), 1);

        let outcome = agent.run_detailed("q").await;

        assert_eq!(outcome, RunOutcome::aborted(AbortReason::StepBudgetExhausted, 1));
        assert_eq!(agent.history().len(), 2);
    }

    #[tokio::test]
    async fn tool_failure_becomes_observation() {
        let llm = ScriptedLlm::new(vec![
            Some("Action: Broken[anything]"),
            Some("Action: Finish[recovered]"),
        ]);
        let mut agent = agent(llm.clone(), 5);

        assert_eq!(agent.run("q").await.as_deref(), Some("recovered"));
        assert_eq!(agent.history()[1], "Observation: Error: tool 'Broken' failed: boom");
    }

    #[tokio::test]
    async fn generation_failure_aborts_with_empty_history() {
        let llm = ScriptedLlm::new(vec![None]);
        let mut agent = agent(llm.clone(), 5);

        let outcome = agent.run_detailed("q").await;

        assert_eq!(outcome, RunOutcome::aborted(AbortReason::GenerationFailed, 1));
        assert!(agent.history().is_empty());
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn blank_response_counts_as_generation_failure() {
        let llm = ScriptedLlm::new(vec![Some("  \n ")]);
        let mut agent = agent(llm, 5);

        assert_eq!(
            agent.run_detailed("q").await.abort_reason(),
            Some(AbortReason::GenerationFailed)
        );
    }

    #[tokio::test]
    async fn missing_action_aborts() {
        let llm = ScriptedLlm::new(vec![Some("Thought: I will just chat.")]);
        let mut agent = agent(llm, 5);

        assert_eq!(
            agent.run_detailed("q").await,
            RunOutcome::aborted(AbortReason::NoActionParsed, 1)
        );
        assert!(agent.history().is_empty());
    }

    #[tokio::test]
    async fn malformed_tool_call_aborts() {
        for bad in ["Action: Search for rust", "Action: Search[]"] {
            let llm = ScriptedLlm::new(vec![Some(bad)]);
            let mut agent = agent(llm, 5);

            assert_eq!(
                agent.run_detailed("q").await,
                RunOutcome::aborted(AbortReason::NoToolParsed, 1)
            );
            assert!(agent.history().is_empty());
        }
    }

    #[tokio::test]
    async fn budget_bounds_calls_and_history() {
        let steps = 3;
        let llm = ScriptedLlm::new(vec![Some("Action: Search[again]"); 10]);
        let mut agent = agent(llm.clone(), steps);

        let outcome = agent.run_detailed("q").await;

        assert_eq!(outcome, RunOutcome::aborted(AbortReason::StepBudgetExhausted, steps));
        assert_eq!(llm.calls(), steps);
        assert_eq!(agent.history().len(), 2 * steps);
    }

    #[tokio::test]
    async fn history_resets_between_runs() {
        let llm = ScriptedLlm::new(vec![
            Some("Action: Search[first]"),
            Some("Action: Finish[one]"),
            Some("Action: Finish[two]"),
        ]);
        let mut agent = agent(llm.clone(), 5);

        assert_eq!(agent.run("q1").await.as_deref(), Some("one"));
        assert_eq!(agent.history().len(), 2);

        assert_eq!(agent.run("q2").await.as_deref(), Some("two"));
        assert!(agent.history().is_empty());
        assert!(!llm.prompt(2).contains("Search[first]"));
    }

    #[tokio::test]
    async fn finish_without_brackets_still_answers() {
        let llm = ScriptedLlm::new(vec![Some("Thought: done\nAction: Finish: the answer is 42")]);
        let mut agent = agent(llm, 5);

        assert_eq!(agent.run("q").await.as_deref(), Some("the answer is 42"));
    }
}
