//! Tool system for the agent.
//!
//! A tool is a named text-in/text-out capability the model may ask for with
//! `Name[argument]`. The registry keeps tools in registration order so that
//! the description block rendered into the prompt is stable between runs.

mod web;

pub use web::WebSearch;

use std::sync::Arc;

use async_trait::async_trait;

/// Trait for implementing tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool, as the model must spell it.
    fn name(&self) -> &str;

    /// A description of what this tool does, shown to the model.
    fn description(&self) -> &str;

    /// Run the tool on the raw argument text from the action.
    async fn call(&self, input: &str) -> anyhow::Result<String>;
}

type ToolFn = dyn Fn(&str) -> anyhow::Result<String> + Send + Sync;

/// Adapts a plain synchronous function into a [`Tool`].
pub struct FnTool {
    name: String,
    description: String,
    func: Box<ToolFn>,
}

impl FnTool {
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn call(&self, input: &str) -> anyhow::Result<String> {
        (self.func)(input)
    }
}

/// Registry of available tools.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// A tool whose name is already taken replaces the old one in place, so
    /// the description order does not change.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(idx) => {
                tracing::warn!("Replacing already registered tool '{}'", tool.name());
                self.tools[idx] = tool;
            }
            None => {
                tracing::debug!("Registered tool '{}'", tool.name());
                self.tools.push(tool);
            }
        }
    }

    /// Register a synchronous function under `name`.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, description: impl Into<String>, func: F)
    where
        F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnTool::new(name, description, func)));
    }

    /// Look a tool up by exact, case-sensitive name.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Render every tool as `- name: description`, one per line, in
    /// registration order.
    pub fn describe_all(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
