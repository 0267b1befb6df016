//! Web search tool.
//!
//! Uses the Tavily API if `TAVILY_API_KEY` is set, otherwise falls back to
//! DuckDuckGo HTML.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Tool;

const TAVILY_URL: &str = "https://api.tavily.com/search";
const MAX_RESULTS: usize = 5;

/// Search the web using Tavily (preferred) or DuckDuckGo.
pub struct WebSearch {
    client: reqwest::Client,
    tavily_api_key: Option<String>,
}

/// Tavily API request body.
#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    include_answer: bool,
}

/// Tavily API response.
#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

/// A single result from Tavily.
#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    content: String,
}

impl WebSearch {
    pub fn new(tavily_api_key: Option<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; ReactAgent/0.1)")
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            tavily_api_key: tavily_api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// Read `TAVILY_API_KEY` once, at construction.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(std::env::var("TAVILY_API_KEY").ok())
    }

    async fn search_tavily(&self, api_key: &str, query: &str) -> anyhow::Result<String> {
        let request = TavilySearchRequest {
            api_key,
            query,
            max_results: MAX_RESULTS,
            include_answer: true,
        };

        let response = self.client.post(TAVILY_URL).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Tavily API error ({}): {}", status, error_text);
        }

        let tavily_response: TavilySearchResponse = response.json().await?;
        Ok(format_tavily(query, tavily_response))
    }

    async fn search_duckduckgo(&self, query: &str) -> anyhow::Result<String> {
        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );

        let html = self.client.get(&url).send().await?.text().await?;

        if html.contains("anomaly-modal") || html.contains("Unfortunately, bots") {
            anyhow::bail!(
                "DuckDuckGo blocked the request with CAPTCHA. Configure TAVILY_API_KEY for reliable web search."
            );
        }

        let results = extract_ddg_results(&html);
        if results.is_empty() {
            Ok(format!("No results found for: {}", query))
        } else {
            Ok(results.join("\n\n"))
        }
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        "Search"
    }

    fn description(&self) -> &str {
        "A web search engine. Use it when you need current events, facts, or anything you cannot answer from your own knowledge. The argument is the search query."
    }

    async fn call(&self, input: &str) -> anyhow::Result<String> {
        let query = input.trim();
        if query.is_empty() {
            anyhow::bail!("Empty search query");
        }

        tracing::debug!(query, "Running web search");
        match &self.tavily_api_key {
            Some(api_key) => self.search_tavily(api_key, query).await,
            None => self.search_duckduckgo(query).await,
        }
    }
}

fn format_tavily(query: &str, response: TavilySearchResponse) -> String {
    if response.results.is_empty() {
        return format!("No results found for: {}", query);
    }

    let mut output = String::new();

    if let Some(answer) = response.answer.filter(|a| !a.is_empty()) {
        output.push_str("Quick answer: ");
        output.push_str(&answer);
        output.push_str("\n\n");
    }

    for (i, result) in response.results.iter().enumerate() {
        output.push_str(&format!(
            "{}. {}\nURL: {}\n{}\n\n",
            i + 1,
            result.title,
            result.url,
            result.content
        ));
    }

    output.trim_end().to_string()
}

/// Extract search results from DuckDuckGo HTML.
fn extract_ddg_results(html: &str) -> Vec<String> {
    let mut results = Vec::new();

    for chunk in html
        .split("class=\"result__body\"")
        .skip(1)
        .take(MAX_RESULTS)
    {
        let title = field_text(chunk, "class=\"result__a\"").unwrap_or("");
        let snippet = field_text(chunk, "class=\"result__snippet\"").unwrap_or("No snippet");
        let url = field_text(chunk, "class=\"result__url\"")
            .map(|s| s.trim())
            .unwrap_or("");

        if !title.is_empty() {
            results.push(format!(
                "{}\n{}\nURL: {}",
                html_decode(title),
                html_decode(snippet),
                url
            ));
        }
    }

    results
}

/// Text between the `>` following `marker` and the next `<`.
fn field_text<'a>(chunk: &'a str, marker: &str) -> Option<&'a str> {
    chunk
        .split(marker)
        .nth(1)
        .and_then(|s| s.split('>').nth(1))
        .and_then(|s| s.split('<').next())
}

/// Basic HTML entity decoding.
fn html_decode(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
}
