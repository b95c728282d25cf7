//! Article body generation.
//!
//! [`ContentGenerator`] is the seam the orchestrator calls; the production
//! implementation talks to any OpenAI-compatible `/chat/completions` API.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use curator_shared::{AppConfig, CuratorError, GenerationSection, Result, api_key};

use crate::selector::Candidate;

/// Raw generator output, before sanitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedArticle {
    /// Title suggested by the model, if it returned one.
    pub title: Option<String>,
    pub body_html: String,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, candidate: &Candidate) -> Result<GeneratedArticle>;
}

// ---------------------------------------------------------------------------
// Chat completions wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// Structured answer some models return instead of bare HTML.
#[derive(Deserialize)]
struct StructuredAnswer {
    #[serde(default)]
    title: Option<String>,
    body_html: String,
}

// ---------------------------------------------------------------------------
// ChatCompletionsGenerator
// ---------------------------------------------------------------------------

pub struct ChatCompletionsGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    target_words: u32,
}

impl fmt::Debug for ChatCompletionsGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionsGenerator")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl ChatCompletionsGenerator {
    pub fn new(section: &GenerationSection, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(section.timeout_secs))
            .build()
            .map_err(|e| CuratorError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            base_url: section.api_base_url.trim_end_matches('/').to_string(),
            model: section.model.clone(),
            temperature: section.temperature,
            max_tokens: section.max_tokens,
            target_words: section.target_words,
        })
    }

    /// Build from config, reading the API key from the configured env var.
    pub fn from_app(config: &AppConfig) -> Result<Self> {
        let key = api_key(config)?;
        Self::new(&config.generation, key)
    }
}

#[async_trait]
impl ContentGenerator for ChatCompletionsGenerator {
    #[instrument(skip_all, fields(model = %self.model, title = %candidate.entry.title))]
    async fn generate(&self, candidate: &Candidate) -> Result<GeneratedArticle> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt().to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(candidate, self.target_words),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CuratorError::Generation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(300).collect();
            return Err(CuratorError::Generation(format!(
                "HTTP {}: {snippet}",
                status.as_u16()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CuratorError::Generation(format!("invalid completion response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CuratorError::Generation("completion has no content".into()))?;

        debug!(chars = content.len(), "completion received");
        let article = parse_completion(&content);
        info!(chars = article.body_html.len(), "article generated");
        Ok(article)
    }
}

/// Interpret a completion as either `{title, body_html}` JSON or raw HTML.
pub fn parse_completion(content: &str) -> GeneratedArticle {
    let trimmed = content.trim();
    let json_candidate = trimmed
        .strip_prefix("```json")
        .map(|rest| rest.trim_end().trim_end_matches("```").trim())
        .unwrap_or(trimmed);

    if json_candidate.starts_with('{') {
        if let Ok(answer) = serde_json::from_str::<StructuredAnswer>(json_candidate) {
            return GeneratedArticle {
                title: answer.title.filter(|t| !t.trim().is_empty()),
                body_html: answer.body_html,
            };
        }
    }

    GeneratedArticle {
        title: None,
        body_html: content.to_string(),
    }
}

pub fn system_prompt() -> &'static str {
    "You are an editorial writer for a tech and news digest site. \
     Write in English only. Do not fabricate facts. If uncertain, label it clearly as speculation. \
     Be energetic and slightly hyped, but keep it accurate and non-defamatory. \
     Avoid copying; paraphrase and add original commentary and takeaways. \
     No adult content, hate, or self-harm content."
}

pub fn user_prompt(candidate: &Candidate, target_words: u32) -> String {
    let entry = &candidate.entry;
    let mut signals = Vec::new();
    if let Some(sub) = &entry.subreddit {
        signals.push(format!("Community: r/{sub}"));
    }
    if let Some(score) = entry.score {
        signals.push(format!("Score: {score}"));
    }
    if let Some(comments) = entry.comment_count {
        signals.push(format!("Comments: {comments}"));
    }
    let signals = if signals.is_empty() {
        "none".to_string()
    } else {
        signals.join(", ")
    };

    format!(
        "Write an original article (HTML body only; use <p>, <h2>, <ul><li>) based on this community post.

Post title: {title}
Permalink: {link}
Feed summary snippet (may be partial): {summary}
Engagement signals: {signals}

Requirements:
- Target length: ~{target_words} words (roughly).
- Structure:
  1) Hook (1 short paragraph)
  2) What happened (2-3 paragraphs)
  3) Why people care (2-3 paragraphs)
  4) Practical takeaways (bullet list)
  5) \"Source\" line linking to the permalink
- Style: slightly exaggerated, future-facing tone, but NEVER invent numbers, quotes, or events.
- If the topic implies missing details, explicitly say what's unknown and what would confirm it.
- Keep it safe for general audiences.",
        title = entry.title,
        link = entry.link,
        summary = curator_sanitize::plain_text(&entry.summary),
    )
}
