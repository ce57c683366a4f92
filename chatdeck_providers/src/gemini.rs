use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use chatdeck_core::{DispatchError, DispatchRequest, Dispatcher, Role};

use crate::deadline::with_deadline;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Dispatcher backed by the Gemini `generateContent` endpoint.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Option<Duration>,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        info!("Creating GeminiProvider");
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Give up on a request after `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    /// Helper method to send a single request
    async fn try_send(&self, model: &str, body: &Value) -> Result<String, DispatchError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| DispatchError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DispatchError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| DispatchError::InvalidResponse(e.to_string()))?;
        parse_reply(&payload)
    }
}

/// Request body for `generateContent`.
fn build_body(request: &DispatchRequest) -> Value {
    let contents: Vec<Value> = request
        .messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            json!({ "role": role, "parts": [{ "text": m.content }] })
        })
        .collect();

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "temperature": request.temperature,
            "maxOutputTokens": request.max_output_tokens,
        },
    });

    if !request.system_instruction.trim().is_empty() {
        body["systemInstruction"] = json!({ "parts": [{ "text": request.system_instruction }] });
    }

    body
}

/// Concatenated text parts of the first candidate.
fn parse_reply(payload: &Value) -> Result<String, DispatchError> {
    let parts = payload["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| {
            let reason = payload["candidates"][0]["finishReason"]
                .as_str()
                .or_else(|| payload["promptFeedback"]["blockReason"].as_str())
                .unwrap_or("missing candidates");
            DispatchError::InvalidResponse(format!("no reply text ({reason})"))
        })?;

    Ok(parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<String>())
}

fn classify_status(status: StatusCode, body: &str) -> DispatchError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DispatchError::Auth(message),
        StatusCode::TOO_MANY_REQUESTS => DispatchError::Quota(message),
        _ => DispatchError::Network(format!("{status}: {message}")),
    }
}

#[async_trait]
impl Dispatcher for GeminiProvider {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<String, DispatchError> {
        let body = build_body(request);

        info!("Sending request to Gemini API: model={}", request.model);
        debug!("{} messages in request", request.messages.len());

        let reply = with_deadline(self.timeout, self.try_send(&request.model, &body)).await?;

        info!("Received response from Gemini API");
        Ok(reply)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatdeck_core::ChatMessage;

    fn request(system_instruction: &str) -> DispatchRequest {
        DispatchRequest {
            messages: vec![
                ChatMessage {
                    role: Role::User,
                    content: "hello".to_string(),
                },
                ChatMessage {
                    role: Role::Assistant,
                    content: "hi there".to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: "ดวง?".to_string(),
                },
            ],
            system_instruction: system_instruction.to_string(),
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.5,
            max_output_tokens: 1024,
        }
    }

    #[test]
    fn body_maps_roles_and_settings() {
        let body = build_body(&request("Be brief."));

        assert_eq!(body["contents"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "ดวง?");
        assert_eq!(body["generationConfig"]["temperature"], 0.5);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief.");
    }

    #[test]
    fn blank_system_instruction_is_omitted() {
        let body = build_body(&request("  "));
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn reply_joins_text_parts() {
        let payload = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Good " }, { "text": "luck!" }] },
                "finishReason": "STOP"
            }]
        });
        assert!(matches!(parse_reply(&payload), Ok(ref r) if r == "Good luck!"));
    }

    #[test]
    fn blocked_prompt_is_invalid_response() {
        let payload = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = parse_reply(&payload);
        assert!(matches!(err, Err(DispatchError::InvalidResponse(ref m)) if m.contains("SAFETY")));
    }

    #[test]
    fn status_codes_map_to_failure_kinds() {
        let body = r#"{"error": {"code": 403, "message": "API key not valid"}}"#;
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, body),
            DispatchError::Auth(ref m) if m == "API key not valid"
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            DispatchError::Quota(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
            DispatchError::Network(_)
        ));
    }

    #[test]
    fn endpoint_includes_model() {
        let provider = GeminiProvider::new("key".to_string())
            .with_base_url("http://localhost:8080/v1beta/".to_string());
        assert_eq!(
            provider.endpoint("gemini-1.5-pro"),
            "http://localhost:8080/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }
}
