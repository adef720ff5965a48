// app/src/services/chatbot.rs

//! Client for the Gemini `generateContent` endpoint.
//!
//! Every public operation degrades to a canned reply instead of failing: the
//! chat widget should always get a sentence back. Failures are logged with
//! their cause. The API key travels in the `x-goog-api-key` header and is
//! never logged.

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::config::ChatbotConfig;
use crate::errors::AppError;
use crate::services::retry::{send_with_retry, RetryPolicy};

const SYSTEM_PROMPT: &str = "You are an AI assistant for an inventory management system. You help users with:\n\
- Product information and queries\n\
- Inventory levels and stock management\n\
- General system assistance\n\
- Data interpretation and insights\n\n\
Be helpful, professional, and concise. If you don't have specific data about their inventory, \
provide general guidance or suggest where the user might find the information in their system.";

pub const EMPTY_MESSAGE_REPLY: &str = "Please provide a message for me to respond to.";

pub const FALLBACK_REPLIES: [&str; 3] = [
  "I'm currently experiencing technical difficulties connecting to the AI service. Please try again in a few moments.",
  "Sorry, I'm temporarily unavailable. You can try refreshing the page or contacting support if the issue persists.",
  "I'm having trouble processing your request right now. Please try again later or check your internet connection.",
];

const CONNECTION_TEST_PROMPT: &str = "Hello, can you hear me?";
const SIMPLE_TEST_PROMPT: &str = "Say hello";

#[derive(Debug, Error)]
pub enum ChatbotError {
  #[error("Gemini API key is not configured")]
  MissingApiKey,

  #[error("Request to chat provider failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("Chat provider answered with status {status}")]
  UpstreamStatus { status: u16 },

  #[error("Chat provider response carried no text")]
  EmptyResponse,
}

// --- Wire format ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
  contents: [Content<'a>; 1],
  generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
  parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
  text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  temperature: f32,
  top_k: u32,
  top_p: f32,
  max_output_tokens: u32,
}

impl Default for GenerationConfig {
  fn default() -> Self {
    Self {
      temperature: 0.7,
      top_k: 40,
      top_p: 0.95,
      max_output_tokens: 1024,
    }
  }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
  text: Option<String>,
}

impl GenerateContentResponse {
  /// Trimmed text of the first part of the first candidate, if any.
  fn first_text(self) -> Option<String> {
    self
      .candidates
      .into_iter()
      .next()?
      .content?
      .parts
      .into_iter()
      .next()?
      .text
      .map(|t| t.trim().to_string())
      .filter(|t| !t.is_empty())
  }
}

/// Full prompt sent upstream for a user message.
pub fn build_prompt(message: &str) -> String {
  format!("{}\n\nUser: {}\n\nAssistant:", SYSTEM_PROMPT, message.trim())
}

// --- Service ---

/// A reply and whether it came from the model rather than the fallback list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
  pub text: String,
  pub from_model: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TlsSettings {
  pub verify_peer: bool,
  pub verify_host: bool,
  pub extra_root_certificate: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
  pub success: bool,
  pub response: String,
  pub timestamp: DateTime<Utc>,
  pub api_key_configured: bool,
  pub tls: TlsSettings,
}

pub struct ChatbotService {
  client: reqwest::Client,
  config: ChatbotConfig,
  retry: RetryPolicy,
}

impl ChatbotService {
  /// Builds the HTTP client. Certificate verification stays on; an extra
  /// root from `ca_cert_path` is trusted by this client only.
  pub fn new(config: ChatbotConfig) -> Result<Self, AppError> {
    let mut builder = reqwest::Client::builder()
      .use_rustls_tls()
      .timeout(config.timeout)
      .connect_timeout(config.connect_timeout);

    if let Some(path) = &config.ca_cert_path {
      let pem = std::fs::read(path)
        .map_err(|e| AppError::Config(format!("Cannot read GEMINI_CA_CERT_PATH {}: {}", path.display(), e)))?;
      let cert = reqwest::Certificate::from_pem(&pem)
        .map_err(|e| AppError::Config(format!("Invalid certificate in {}: {}", path.display(), e)))?;
      builder = builder.add_root_certificate(cert);
      info!(path = %path.display(), "Trusting extra root certificate for chat provider.");
    }

    let client = builder
      .build()
      .map_err(|e| AppError::Config(format!("Cannot build chat HTTP client: {}", e)))?;

    if config.api_key.is_none() {
      warn!("GEMINI_API_KEY is not set; chat replies will use fallback messages.");
    }

    Ok(Self {
      retry: RetryPolicy::new(config.max_retries, config.retry_delay),
      client,
      config,
    })
  }

  pub fn api_key_configured(&self) -> bool {
    self.config.api_key.is_some()
  }

  fn endpoint(&self) -> String {
    format!(
      "{}/v1beta/models/{}:generateContent",
      self.config.base_url, self.config.model
    )
  }

  /// One `generateContent` round trip (with retries) for `prompt`.
  #[instrument(name = "chatbot::generate", skip(self, prompt), fields(prompt_len = prompt.len()), err(Display))]
  async fn generate(&self, prompt: &str) -> Result<String, ChatbotError> {
    let api_key = self.config.api_key.as_deref().ok_or(ChatbotError::MissingApiKey)?;
    let mut key_header = HeaderValue::from_str(api_key).map_err(|_| ChatbotError::MissingApiKey)?;
    key_header.set_sensitive(true);

    let body = GenerateContentRequest {
      contents: [Content {
        parts: [Part { text: prompt }],
      }],
      generation_config: GenerationConfig::default(),
    };
    let url = self.endpoint();

    let response = send_with_retry(&self.retry, || {
      self
        .client
        .post(&url)
        .header("x-goog-api-key", key_header.clone())
        .json(&body)
        .send()
    })
    .await?;

    let status = response.status();
    if !status.is_success() {
      let detail = response.text().await.unwrap_or_default();
      error!(status = status.as_u16(), body = %truncate(&detail, 500), "Chat provider request failed.");
      return Err(ChatbotError::UpstreamStatus { status: status.as_u16() });
    }

    let parsed: GenerateContentResponse = response.json().await?;
    info!(has_candidates = !parsed.candidates.is_empty(), "Chat provider response received.");
    parsed.first_text().ok_or(ChatbotError::EmptyResponse)
  }

  /// Replies to `message`, falling back to a canned reply on any failure.
  #[instrument(name = "chatbot::send_message", skip(self, message), fields(message_len = message.len()))]
  pub async fn send_message(&self, message: &str) -> ChatReply {
    if message.trim().is_empty() {
      return ChatReply {
        text: EMPTY_MESSAGE_REPLY.to_string(),
        from_model: false,
      };
    }

    match self.generate(&build_prompt(message)).await {
      Ok(text) => {
        info!("Chatbot response generated.");
        ChatReply { text, from_model: true }
      }
      Err(e) => {
        warn!(error = %e, "Chatbot falling back to canned reply.");
        ChatReply {
          text: fallback_reply().to_string(),
          from_model: false,
        }
      }
    }
  }

  #[instrument(name = "chatbot::test_connection", skip(self))]
  pub async fn test_connection(&self) -> ConnectionReport {
    let reply = self.send_message(CONNECTION_TEST_PROMPT).await;
    ConnectionReport {
      success: reply.from_model,
      response: reply.text,
      timestamp: Utc::now(),
      api_key_configured: self.api_key_configured(),
      tls: TlsSettings {
        verify_peer: true,
        verify_host: true,
        extra_root_certificate: self.config.ca_cert_path.clone(),
      },
    }
  }

  /// Sends a bare prompt with no system prompt; `None` on any failure.
  #[instrument(name = "chatbot::simple_test", skip(self))]
  pub async fn simple_test(&self) -> Option<String> {
    match self.generate(SIMPLE_TEST_PROMPT).await {
      Ok(text) => Some(text),
      Err(e) => {
        warn!(error = %e, "Simple chatbot test failed.");
        None
      }
    }
  }
}

pub fn fallback_reply() -> &'static str {
  FALLBACK_REPLIES[(OsRng.next_u32() as usize) % FALLBACK_REPLIES.len()]
}

fn truncate(text: &str, max_chars: usize) -> String {
  text.chars().take(max_chars).collect()
}
