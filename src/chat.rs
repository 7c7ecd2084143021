//! Chat-completion compatibility layer.
//!
//! Clients speaking the OpenAI chat-completion protocol can send code as the
//! last message and receive the analysis as the assistant reply. There is no
//! dialogue: earlier messages, `temperature` and `max_tokens` are accepted and
//! ignored.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::analyze::{Analyzer, Finding};
use crate::report;

/// Prefix of generated completion ids.
pub const COMPLETION_ID_PREFIX: &str = "pythoncodereview";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_temperature")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> Option<f64> {
    Some(1.0)
}

impl ChatCompletionRequest {
    /// The code to analyze: the content of the last message.
    pub fn code(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: String,
}

/// Character counts standing in for token counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
    pub owned_by: String,
    pub permission: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelList {
    pub data: Vec<ModelInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub model: String,
}

/// Plain analysis request (`{"code": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub code: String,
}

/// Plain analysis response (`{"suggestions": [...]}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub suggestions: Vec<Finding>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("request contains no messages")]
    NoMessages,
}

/// Analyze the last message of `request` and wrap the narrative as a
/// completion.
pub fn complete(
    request: &ChatCompletionRequest,
    analyzer: &Analyzer,
    model_id: &str,
) -> Result<ChatCompletionResponse, ChatError> {
    let code = request.code().ok_or(ChatError::NoMessages)?;
    let findings = analyzer.analyze(code);
    Ok(build_response(code, &findings, model_id, SystemTime::now()))
}

/// Assemble a completion from already computed findings.
pub fn build_response(
    code: &str,
    findings: &[Finding],
    model_id: &str,
    now: SystemTime,
) -> ChatCompletionResponse {
    let content = report::render_narrative(findings);
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();

    let prompt_tokens = code.chars().count();
    let completion_tokens = content.chars().count();

    ChatCompletionResponse {
        id: format!("{}-{}", COMPLETION_ID_PREFIX, since_epoch.as_secs_f64()),
        object: "chat.completion".to_string(),
        created: since_epoch.as_secs(),
        model: model_id.to_string(),
        choices: vec![ChatChoice {
            index: 0,
            message: ChatMessage {
                role: "assistant".to_string(),
                content,
            },
            finish_reason: "stop".to_string(),
        }],
        usage: Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        },
    }
}

pub fn model_list(model_id: &str) -> ModelList {
    ModelList {
        data: vec![ModelInfo {
            id: model_id.to_string(),
            object: "model".to_string(),
            owned_by: "organization-owner".to_string(),
            permission: Vec::new(),
        }],
    }
}

pub fn health(model_id: &str) -> Health {
    Health {
        status: "ok".to_string(),
        model: model_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(contents: &[&str]) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "anything".to_string(),
            messages: contents
                .iter()
                .map(|c| ChatMessage {
                    role: "user".to_string(),
                    content: c.to_string(),
                })
                .collect(),
            temperature: None,
            max_tokens: None,
        }
    }

    #[test]
    fn test_last_message_is_analyzed() {
        let req = request(&["ignored", "def f():\n    pass"]);
        let resp = complete(&req, &Analyzer::new(), "python-code-advisor-v1").unwrap();

        assert_eq!(resp.object, "chat.completion");
        assert_eq!(resp.model, "python-code-advisor-v1");
        assert_eq!(resp.choices.len(), 1);
        assert_eq!(resp.choices[0].message.role, "assistant");
        assert_eq!(resp.choices[0].finish_reason, "stop");
        assert!(resp.choices[0].message.content.contains("Function 'f' lacks a docstring"));
        assert!(resp.id.starts_with("pythoncodereview-"));
    }

    #[test]
    fn test_no_messages() {
        let req = request(&[]);
        assert_eq!(
            complete(&req, &Analyzer::new(), "m"),
            Err(ChatError::NoMessages)
        );
    }

    #[test]
    fn test_usage_counts_characters() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let resp = build_response("é = 1", &[], "m", now);
        let content = &resp.choices[0].message.content;

        assert_eq!(resp.created, 1_700_000_000);
        assert_eq!(resp.usage.prompt_tokens, 5);
        assert_eq!(resp.usage.completion_tokens, content.chars().count());
        assert_eq!(
            resp.usage.total_tokens,
            resp.usage.prompt_tokens + resp.usage.completion_tokens
        );
    }

    #[test]
    fn test_request_defaults() {
        let req: ChatCompletionRequest = serde_json::from_str(
            r#"{"model": "m", "messages": [{"role": "user", "content": "x = 1"}]}"#,
        )
        .unwrap();
        assert_eq!(req.temperature, Some(1.0));
        assert_eq!(req.max_tokens, None);
        assert_eq!(req.code(), Some("x = 1"));
    }

    #[test]
    fn test_model_list_and_health() {
        let json = serde_json::to_value(model_list("m")).unwrap();
        assert_eq!(json["data"][0]["id"], "m");
        assert_eq!(json["data"][0]["object"], "model");
        assert_eq!(json["data"][0]["permission"], serde_json::json!([]));

        let json = serde_json::to_value(health("m")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "ok", "model": "m"}));
    }
}
