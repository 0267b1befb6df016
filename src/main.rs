//! react-agent - command line entry point
//!
//! Answers one question with the ReAct loop and prints the final answer.
//! Usage: `react-agent [question]`

use std::io::Write;
use std::sync::Arc;

use react_agent::llm::StreamObserver;
use react_agent::tools::WebSearch;
use react_agent::{AgentConfig, LlmConfig, OpenAiCompatClient, ReactAgent, ToolRegistry};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_QUESTION: &str = "帮我查询2025124期中国体育彩票双色球开奖号码";

/// Echo streamed model output to stdout as it arrives.
struct StdoutEcho;

impl StreamObserver for StdoutEcho {
    fn on_fragment(&self, fragment: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(fragment.as_bytes());
        let _ = stdout.flush();
    }

    fn on_complete(&self) {
        println!();
    }
}

fn main() -> anyhow::Result<()> {
    // The loop never runs two things at once, so one thread is enough.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "react_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration; missing credentials stop here, before any run
    let llm_config = LlmConfig::from_env()?;
    let agent_config = AgentConfig::from_env()?;
    info!(
        "Loaded configuration: model={}, base_url={}, max_steps={}",
        llm_config.model, llm_config.base_url, agent_config.max_steps
    );

    let llm = OpenAiCompatClient::new(llm_config)?.with_observer(Arc::new(StdoutEcho));

    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(WebSearch::from_env()?));

    println!("--- Available tools ---");
    println!("{}", tools.describe_all());

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_QUESTION.to_string());
    println!("--- Question ---");
    println!("{}", question);

    let mut agent = ReactAgent::new(Arc::new(llm), tools, agent_config);
    let outcome = agent.run_detailed(&question).await;

    match outcome.answer() {
        Some(answer) => {
            println!("\n--- Final answer ---");
            println!("{}", answer);
        }
        None => {
            let reason = outcome
                .abort_reason()
                .map(|r| r.to_string())
                .unwrap_or_default();
            println!("\n--- No answer ({}) ---", reason);
        }
    }

    Ok(())
}
