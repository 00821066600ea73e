//! Gemini-backed commander
//!
//! Talks to the `generateContent` REST endpoint with the persona as the system
//! instruction. Conversation history lives with the advisor.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AdvisoryError, AdvisoryProvider};

const ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MODEL: &str = "gemini-2.5-flash";
const TEMPERATURE: f32 = 0.7;

const SYSTEM_INSTRUCTION: &str = "You are \"Commander Nova\", a tactical AI battle coordinator for the \"Neon Siege\" tank division.
Style: Military, concise, urgent, slightly robotic but encouraging.
Context: The user is piloting a hover-tank in a hostile cyberpunk city.
Role: Provide brief tactical advice, comment on battle status, or analyze threats.
Keep responses under 30 words.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Part {
    text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content,
    contents: &'a [Content],
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if it has any
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        if text.trim().is_empty() { None } else { Some(text) }
    }
}

/// Commander persona backed by the Gemini `generateContent` REST endpoint.
/// Keeps the running conversation so follow-up questions have context.
pub struct GeminiAdvisor {
    http: reqwest::Client,
    api_key: String,
    history: Mutex<Vec<Content>>,
}

impl GeminiAdvisor {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, AdvisoryError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AdvisoryError::Unconfigured);
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdvisoryError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            api_key,
            history: Mutex::new(Vec::new()),
        })
    }

    /// Read the key from `GEMINI_API_KEY`, falling back to `API_KEY`
    pub fn from_env(timeout: Duration) -> Result<Self, AdvisoryError> {
        let key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .map_err(|_| AdvisoryError::Unconfigured)?;
        Self::new(key, timeout)
    }

    /// Turns exchanged so far (user + model)
    pub fn history_len(&self) -> usize {
        self.history.lock().map(|h| h.len()).unwrap_or(0)
    }

    fn framed(message: &str, status: &str) -> String {
        format!("[SITREP: {status}] {message}")
    }

    fn snapshot(&self) -> Result<Vec<Content>, AdvisoryError> {
        self.history
            .lock()
            .map(|h| h.clone())
            .map_err(|_| AdvisoryError::Unavailable("conversation state poisoned".into()))
    }
}

#[async_trait]
impl AdvisoryProvider for GeminiAdvisor {
    async fn advise(&self, message: &str, status: &str) -> Result<String, AdvisoryError> {
        let question = Content::text("user", Self::framed(message, status));
        let mut contents = self.snapshot()?;
        contents.push(question.clone());

        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            contents: &contents,
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let url = format!("{ENDPOINT}/{MODEL}:generateContent");
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdvisoryError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AdvisoryError::Unavailable(format!("HTTP {}", response.status())));
        }

        let reply = response
            .json::<GenerateResponse>()
            .await
            .map_err(|_| AdvisoryError::Garbled)?
            .text()
            .ok_or(AdvisoryError::Garbled)?;

        // Only completed exchanges join the conversation
        if let Ok(mut history) = self.history.lock() {
            history.push(question);
            history.push(Content::text("model", reply.clone()));
        }
        Ok(reply)
    }
}
