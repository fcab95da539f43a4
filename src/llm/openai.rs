//! OpenAI-compatible chat-completions client.
//!
//! Works against any endpoint that speaks the `/chat/completions` protocol
//! (OpenAI, DashScope compatible mode, local gateways, ...).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatResponse, LlmClient, LlmError, ToolCall, ToolSchema};

/// Client for an OpenAI-compatible endpoint.
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            temperature: 0.0,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request<'a>(
        &self,
        model: &'a str,
        messages: &'a [ChatMessage],
        tools: Option<&'a [ToolSchema]>,
    ) -> CompletionRequest<'a> {
        CompletionRequest {
            model,
            messages,
            tools: tools.filter(|t| !t.is_empty()),
            temperature: self.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSchema]>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

/// Convert a decoded completion body into a [`ChatResponse`].
fn into_chat_response(body: CompletionResponse) -> Result<ChatResponse, LlmError> {
    let message = body
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;

    // Some gateways omit call ids; tool results must still reference something unique.
    let tool_calls = message.tool_calls.map(|calls| {
        calls
            .into_iter()
            .map(|mut call| {
                if call.id.is_empty() {
                    call.id = format!("call_{}", uuid::Uuid::new_v4().simple());
                }
                call
            })
            .collect::<Vec<_>>()
    });

    Ok(ChatResponse {
        content: message.content,
        tool_calls: tool_calls.filter(|calls| !calls.is_empty()),
    })
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResponse, LlmError> {
        let url = self.endpoint();
        let request = self.build_request(model, messages, tools);

        tracing::debug!(
            model = %model,
            url = %url,
            message_count = messages.len(),
            "calling chat completions"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        into_chat_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FunctionSchema;
    use serde_json::json;

    #[test]
    fn request_omits_empty_tool_list() {
        let client = OpenAiClient::new("key".to_string(), "https://example.test/v1/");
        let messages = vec![ChatMessage::user("hi")];
        let request = client.build_request("qwen-plus", &messages, Some(&[][..]));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["model"], "qwen-plus");
        assert!(value.get("tools").is_none());
        assert_eq!(client.endpoint(), "https://example.test/v1/chat/completions");
    }

    #[test]
    fn request_includes_tool_schemas() {
        let client =
            OpenAiClient::new("key".to_string(), "https://example.test/v1").with_temperature(0.5);
        let messages = vec![ChatMessage::user("hi")];
        let tools = vec![ToolSchema {
            tool_type: "function".to_string(),
            function: FunctionSchema {
                name: "read_file".to_string(),
                description: "Read a file".to_string(),
                parameters: json!({"type": "object"}),
            },
        }];
        let request = client.build_request("m", &messages, Some(tools.as_slice()));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(value["tools"][0]["function"]["name"], "read_file");
        assert_eq!(value["temperature"], 0.5);
    }

    #[test]
    fn parses_tool_call_response() {
        let body: CompletionResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "list_directory",
                            "arguments": "{\"directoryPath\":\".\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .unwrap();

        let response = into_chat_response(body).unwrap();
        assert_eq!(response.content, None);
        assert_eq!(response.calls().len(), 1);
        assert_eq!(response.calls()[0].id, "call_abc");
        assert_eq!(response.calls()[0].function.name, "list_directory");
    }

    #[test]
    fn assigns_id_when_gateway_omits_it() {
        let body: CompletionResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "tool_calls": [{"id": "", "function": {"name": "read_file", "arguments": "{}"}}]
                }
            }]
        }))
        .unwrap();

        let response = into_chat_response(body).unwrap();
        assert!(response.calls()[0].id.starts_with("call_"));
        assert_eq!(response.calls()[0].call_type, "function");
    }

    #[test]
    fn assigns_id_when_gateway_sends_null() {
        let body: CompletionResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": null,
                        "type": "function",
                        "function": {"name": "list_directory", "arguments": null}
                    }]
                }
            }]
        }))
        .unwrap();

        let response = into_chat_response(body).unwrap();
        assert!(response.calls()[0].id.starts_with("call_"));
        assert_eq!(response.calls()[0].function.arguments, "");
    }

    #[test]
    fn empty_choices_is_invalid() {
        let body: CompletionResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            into_chat_response(body),
            Err(LlmError::InvalidResponse(_))
        ));
    }
}
