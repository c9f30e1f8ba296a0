// libs/assistant-cell/src/services/azure.rs
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use regex::Regex;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::VecDeque;
use tracing::{debug, error, warn};

use appointment_cell::models::{Department, DEPARTMENTS};
use shared_config::AppConfig;
use shared_models::{AppError, ChatMessage, ChatRole};

use crate::models::{ChatStream, Severity, SymptomAnalysis};
use crate::services::collaborators::{ChatAssistant, SymptomAnalyzer};

pub const NOT_CONFIGURED_REPLY: &str =
    "⚠️ Azure OpenAI client is not properly configured. Please check your .env file.";

const CHAT_SYSTEM_PROMPT: &str = "Bạn là trợ lý ảo của phòng khám đa khoa. \
Nhiệm vụ của bạn là phân tích triệu chứng, tư vấn chuyên khoa phù hợp, \
và trả lời các câu hỏi liên quan đến quy trình khám bệnh. \
Giọng điệu thân thiện, chuyên nghiệp. \
Chỉ trả lời các câu hỏi liên quan đến y tế và dịch vụ phòng khám. \
Không trả lời các câu hỏi không liên quan.";

const ANALYSIS_SYSTEM_PROMPT: &str =
    "Bạn là trợ lý y tế, chuyên phân tích triệu chứng và đưa ra gợi ý chuyên môn.";

const CHAT_MAX_TOKENS: u32 = 500;
const CHAT_TEMPERATURE: f64 = 0.7;
const ANALYSIS_TEMPERATURE: f64 = 0.3;

/// Chat-completions client for an Azure OpenAI deployment.
pub struct AzureOpenAiClient {
    endpoint: String,
    api_key: String,
    deployment: String,
    api_version: String,
    http_client: Client,
    json_block: Regex,
}

#[derive(Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    departments: Vec<String>,
    #[serde(default)]
    possible_conditions: Vec<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    recommendation: String,
}

impl AzureOpenAiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            endpoint: config.azure_openai_endpoint.trim_end_matches('/').to_string(),
            api_key: config.azure_openai_api_key.clone(),
            deployment: config.azure_deployment_name.clone(),
            api_version: config.azure_openai_api_version.clone(),
            http_client: Client::new(),
            json_block: Regex::new(r"(\{[\s\S]*\})").expect("valid JSON block pattern"),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.endpoint.is_empty() && !self.api_key.is_empty() && !self.deployment.is_empty()
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }

    fn chat_messages(user_text: &str, history: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if history.first().map(|m| m.role) != Some(ChatRole::System) {
            messages.push(ChatMessage::system(CHAT_SYSTEM_PROMPT));
        }
        messages.extend_from_slice(history);
        messages.push(ChatMessage::user(user_text));
        messages
    }

    async fn post(&self, body: Value) -> Result<reqwest::Response, AppError> {
        let response = self
            .http_client
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Collaborator(format!("Azure OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Azure OpenAI returned {}: {}", status, error_text);
            return Err(AppError::Collaborator(format!(
                "Azure OpenAI error {}: {}",
                status, error_text
            )));
        }

        Ok(response)
    }

    /// Single non-streaming completion; returns the first choice's content.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
    ) -> Result<String, AppError> {
        if !self.is_configured() {
            return Err(AppError::Config("Azure OpenAI client is not properly configured".into()));
        }

        let response = self
            .post(json!({
                "messages": messages,
                "max_tokens": CHAT_MAX_TOKENS,
                "temperature": temperature,
            }))
            .await?;

        let ai_response: Value = response
            .json()
            .await
            .map_err(|e| AppError::Collaborator(format!("Invalid Azure OpenAI response: {}", e)))?;

        ai_response["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::Collaborator("Invalid Azure OpenAI response format".into()))
    }

    fn analysis_prompt(symptoms: &str) -> String {
        let names = DEPARTMENTS.iter().map(|d| d.name).collect::<Vec<_>>().join(", ");
        format!(
            "Phân tích các triệu chứng sau và cung cấp thông tin về:\n\
             1. Chuyên khoa phù hợp để thăm khám (từ danh sách: {names})\n\
             2. Các bệnh lý tiềm năng liên quan đến triệu chứng\n\
             3. Mức độ nghiêm trọng (Thấp/Trung bình/Cao)\n\n\
             Triệu chứng: {symptoms}\n\n\
             Trả về kết quả dưới dạng JSON với định dạng sau:\n\
             {{\n  \"departments\": [\"Tên khoa 1\", \"Tên khoa 2\"],\n  \
             \"possible_conditions\": [\"Bệnh 1\", \"Bệnh 2\"],\n  \
             \"severity\": \"Mức độ\",\n  \
             \"recommendation\": \"Lời khuyên ngắn gọn\"\n}}"
        )
    }

    /// Parse the model's reply, tolerating prose around the JSON object.
    pub fn parse_analysis(&self, response_text: &str) -> Result<SymptomAnalysis, AppError> {
        let json_text = self
            .json_block
            .captures(response_text)
            .and_then(|caps| caps.get(1))
            .map_or(response_text, |m| m.as_str());

        let raw: RawAnalysis = serde_json::from_str(json_text).map_err(|e| {
            warn!("Failed to parse symptom analysis: {}", e);
            AppError::Collaborator("Failed to parse response".into())
        })?;

        let matched: Vec<&'static Department> = raw
            .departments
            .iter()
            .filter_map(|name| {
                let found = match_department(name);
                if found.is_none() {
                    debug!("Suggested department '{}' is not in the catalog", name);
                }
                found
            })
            .collect();

        Ok(SymptomAnalysis {
            department_codes: matched.iter().map(|d| d.code.to_string()).collect(),
            departments: matched.iter().map(|d| d.name.to_string()).collect(),
            possible_conditions: raw.possible_conditions,
            severity: raw
                .severity
                .as_deref()
                .and_then(Severity::from_label)
                .unwrap_or(Severity::Medium),
            recommendation: raw.recommendation,
        })
    }
}

fn match_department(name: &str) -> Option<&'static Department> {
    let name = name.trim().to_lowercase();
    DEPARTMENTS
        .iter()
        .find(|d| d.name.to_lowercase() == name)
        .or_else(|| DEPARTMENTS.iter().find(|d| name.contains(&d.name.to_lowercase())))
}

#[async_trait]
impl ChatAssistant for AzureOpenAiClient {
    async fn respond(&self, user_text: &str, history: &[ChatMessage]) -> Result<String, AppError> {
        if !self.is_configured() {
            return Ok(NOT_CONFIGURED_REPLY.to_string());
        }

        let messages = Self::chat_messages(user_text, history);
        debug!("Sending chat completion with {} messages", messages.len());
        self.complete(&messages, CHAT_TEMPERATURE).await
    }

    async fn respond_streaming(
        &self,
        user_text: &str,
        history: &[ChatMessage],
    ) -> Result<ChatStream, AppError> {
        if !self.is_configured() {
            return Ok(stream::once(async { Ok(NOT_CONFIGURED_REPLY.to_string()) }).boxed());
        }

        let messages = Self::chat_messages(user_text, history);
        let response = self
            .post(json!({
                "messages": messages,
                "max_tokens": CHAT_MAX_TOKENS,
                "temperature": CHAT_TEMPERATURE,
                "stream": true,
            }))
            .await?;

        let body = response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec())).boxed();
        Ok(sse_text_stream(body))
    }
}

#[async_trait]
impl SymptomAnalyzer for AzureOpenAiClient {
    async fn analyze(&self, symptoms: &str) -> Result<SymptomAnalysis, AppError> {
        if !self.is_configured() {
            return Err(AppError::Collaborator(
                "Azure OpenAI client is not properly configured".into(),
            ));
        }

        let messages = [
            ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user(Self::analysis_prompt(symptoms)),
        ];
        let response_text = self.complete(&messages, ANALYSIS_TEMPERATURE).await?;
        self.parse_analysis(&response_text)
    }
}

// ==============================================================================
// SERVER-SENT EVENTS
// ==============================================================================

struct SseState {
    body: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>,
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    finished: bool,
}

impl SseState {
    // Consume every complete line in the buffer.
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let Some(data) = line.trim().strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data == "[DONE]" {
                self.finished = true;
                self.buffer.clear();
                return;
            }
            match serde_json::from_str::<Value>(data) {
                Ok(event) => {
                    if let Some(text) = event["choices"][0]["delta"]["content"].as_str() {
                        if !text.is_empty() {
                            self.pending.push_back(text.to_string());
                        }
                    }
                }
                Err(e) => warn!("Skipping malformed stream event: {}", e),
            }
        }
    }
}

fn sse_text_stream(body: BoxStream<'static, Result<Vec<u8>, reqwest::Error>>) -> ChatStream {
    let state = SseState {
        body,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.pending.pop_front() {
                return Some((Ok(chunk), state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    state.buffer.extend_from_slice(&bytes);
                    state.drain_lines();
                }
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((
                        Err(AppError::Collaborator(format!("Azure OpenAI stream failed: {}", e))),
                        state,
                    ));
                }
                None => {
                    state.buffer.push(b'\n');
                    state.drain_lines();
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
