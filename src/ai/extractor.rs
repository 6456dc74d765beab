use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::GroqConfig;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

lazy_static! {
    static ref PUNCT_RE: Regex = Regex::new(r"[^\w\s]").unwrap();
    static ref STOPWORDS: HashSet<&'static str> = [
        "the", "a", "an", "in", "on", "at", "to", "for", "of", "my",
        "is", "are", "was", "were", "what", "where", "how", "did", "do",
        "i", "you", "me", "it", "this", "that", "there", "here",
        "put", "find", "show", "looking", "need", "get", "give",
    ]
    .into_iter()
    .collect();
}

/// Deterministic, network-free extraction: lowercase, punctuation to
/// whitespace, drop stopwords, rejoin. Never returns an empty string;
/// an all-stopword query falls back to the trimmed input.
pub fn local_keywords(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned = PUNCT_RE.replace_all(&lowered, " ");
    let tokens: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|t| !STOPWORDS.contains(t))
        .collect();
    if tokens.is_empty() {
        text.trim().to_string()
    } else {
        tokens.join(" ")
    }
}

/// Crude language gate: anything outside ASCII counts as non-English
/// and is routed to the translation prompt.
fn is_non_english(query: &str) -> bool {
    query.chars().any(|c| c as u32 > 127)
}

fn translation_prompt(query: &str) -> String {
    format!(
        r#"You must translate this Amharic query to English. Return ONLY the English word.

Examples:
"ቁልፍ የት ነው" -> key
"የእኔ ቁልፍ የት ነው?" -> key
"ኪስ የት አስቀመጥኩት?" -> wallet
"በኩሽና ውስጥ" -> kitchen
"ስልኬን ፈልግ" -> phone

Amharic query: {query}
English translation (one word only):"#
    )
}

fn extraction_prompt(query: &str) -> String {
    format!(
        r#"Extract only the OBJECT/ITEM. Remove action words.

Examples:
"where did i put wallet" → wallet
"find my car keys" → car keys
"what's in the kitchen" → kitchen

Query: {query}
Extracted:"#
    )
}

/// Single-shot chat-completion backend. One implementation talks to
/// Groq; tests substitute fakes.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GroqClient {
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, system: &str, prompt: &str) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            // Deterministic, short transform: a temperature-0 single
            // shot capped at 20 output tokens.
            temperature: 0.0,
            max_tokens: 20,
        };

        let response = self
            .http
            .post(GROQ_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("groq api error {}: {}", status, text);
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("groq response had no choices"))?;
        Ok(content)
    }
}

/// Turns a natural-language query into search terms. The remote path is
/// best-effort; any failure degrades to [`local_keywords`], so callers
/// always get a usable term string.
pub struct KeywordExtractor {
    backend: Option<Arc<dyn CompletionClient>>,
}

impl KeywordExtractor {
    pub fn from_config(cfg: &GroqConfig) -> Self {
        let backend = match &cfg.api_key {
            Some(key) => match GroqClient::new(key.clone(), cfg.model.clone(), cfg.timeout_secs) {
                Ok(client) => Some(Arc::new(client) as Arc<dyn CompletionClient>),
                Err(e) => {
                    warn!(error = %e, "failed to build groq client, using local fallback only");
                    None
                }
            },
            None => {
                debug!("no groq api key configured, using local fallback only");
                None
            }
        };
        Self { backend }
    }

    pub fn with_backend(backend: Arc<dyn CompletionClient>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub async fn extract(&self, query: &str) -> String {
        let Some(backend) = &self.backend else {
            return local_keywords(query);
        };

        let prompt = if is_non_english(query) {
            translation_prompt(query)
        } else {
            extraction_prompt(query)
        };
        let system =
            "You are a translator. Always respond with ONLY the English translation, nothing else.";

        match backend.complete(system, &prompt).await {
            Ok(raw) => {
                let extracted = raw.trim().to_string();
                // An empty reply or a verbatim echo of the input counts
                // as a failed extraction.
                if extracted.is_empty() || extracted == query {
                    warn!("remote extractor returned empty or unchanged query, using fallback");
                    local_keywords(query)
                } else {
                    debug!(extracted = %extracted, "remote extraction succeeded");
                    extracted
                }
            }
            Err(e) => {
                warn!(error = %e, "remote extraction failed, using fallback");
                local_keywords(query)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl CompletionClient for Fixed {
        async fn complete(&self, _system: &str, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl CompletionClient for Failing {
        async fn complete(&self, _system: &str, _prompt: &str) -> anyhow::Result<String> {
            anyhow::bail!("connection timed out")
        }
    }

    /// Echoes the user prompt's final query line back, simulating a
    /// model that declined to shorten anything.
    struct Echo(&'static str);

    #[async_trait]
    impl CompletionClient for Echo {
        async fn complete(&self, _system: &str, _prompt: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn fallback_strips_stopwords_and_punctuation() {
        assert_eq!(local_keywords("Where did I put my wallet?"), "wallet");
        assert_eq!(local_keywords("find my car keys"), "car keys");
        assert_eq!(local_keywords("Find my wallet in the bedroom"), "wallet bedroom");
    }

    #[test]
    fn fallback_never_returns_empty() {
        assert_eq!(local_keywords("where is it"), "where is it");
        assert_eq!(local_keywords("  where is it  "), "where is it");
    }

    #[test]
    fn non_english_detection() {
        assert!(!is_non_english("find my keys"));
        assert!(is_non_english("ቁልፍ የት ነው"));
        assert!(is_non_english("où sont mes clés"));
    }

    #[tokio::test]
    async fn disabled_extractor_uses_fallback() {
        let extractor = KeywordExtractor::disabled();
        assert_eq!(extractor.extract("Where did I put my wallet?").await, "wallet");
    }

    #[tokio::test]
    async fn remote_result_is_used_when_valid() {
        let extractor = KeywordExtractor::with_backend(Arc::new(Fixed("car keys")));
        assert_eq!(extractor.extract("find my car keys please").await, "car keys");
    }

    #[tokio::test]
    async fn remote_result_is_trimmed() {
        let extractor = KeywordExtractor::with_backend(Arc::new(Fixed("  wallet \n")));
        assert_eq!(extractor.extract("where is my wallet").await, "wallet");
    }

    #[tokio::test]
    async fn remote_failure_falls_back() {
        let extractor = KeywordExtractor::with_backend(Arc::new(Failing));
        assert_eq!(extractor.extract("Where did I put my wallet?").await, "wallet");
    }

    #[tokio::test]
    async fn empty_remote_reply_falls_back() {
        let extractor = KeywordExtractor::with_backend(Arc::new(Fixed("   ")));
        assert_eq!(extractor.extract("Where did I put my wallet?").await, "wallet");
    }

    #[tokio::test]
    async fn unchanged_remote_reply_falls_back() {
        let extractor = KeywordExtractor::with_backend(Arc::new(Echo("find my car keys")));
        assert_eq!(extractor.extract("find my car keys").await, "car keys");
    }
}
