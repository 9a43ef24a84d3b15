use anyhow::{Context as _, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::config::ModelSettings;
use crate::memory::MemoryEntry;
use crate::prompts::react::build_react_system_prompt;
use crate::tools::Outcome;

use super::{Context, Step, StepResult, Thinker, TokenUsage, ToolCall};

/// An LLM thinker backed by an Azure OpenAI chat-completions deployment.
pub struct AzureOpenAiThinker {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl AzureOpenAiThinker {
    /// Build the client once; it is reused for every request.
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            url: completions_url(&settings.endpoint, &settings.model, &settings.api_version),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_messages(context: &Context) -> Vec<Message> {
        let mut messages = vec![
            Message {
                role: "system".to_string(),
                content: build_react_system_prompt(&context.available_tools),
            },
            Message {
                role: "user".to_string(),
                content: context.task.clone(),
            },
        ];

        for entry in &context.history {
            match entry {
                MemoryEntry::Task { .. } | MemoryEntry::Answer { .. } => {}
                MemoryEntry::Iteration {
                    thought,
                    calls,
                    results,
                } => {
                    let assistant_msg = serde_json::json!({
                        "thought": thought,
                        "action": { "calls": calls }
                    });
                    messages.push(Message {
                        role: "assistant".to_string(),
                        content: assistant_msg.to_string(),
                    });

                    let mut observation = String::from("Tool results:\n");
                    for result in results {
                        match &result.outcome {
                            Outcome::Success(out) => {
                                observation.push_str(&format!("[{}] ✓ {}\n", result.tool, out));
                            }
                            Outcome::Error(err) => {
                                observation.push_str(&format!("[{}] ✗ {}\n", result.tool, err));
                            }
                        }
                    }
                    messages.push(Message {
                        role: "user".to_string(),
                        content: observation,
                    });
                }
                MemoryEntry::Correction { raw, reason } => {
                    messages.push(Message {
                        role: "assistant".to_string(),
                        content: raw.clone(),
                    });
                    messages.push(Message {
                        role: "user".to_string(),
                        content: format!(
                            "Invalid response: {}. Respond with ONLY valid JSON in one of the two formats.",
                            reason
                        ),
                    });
                }
            }
        }

        messages
    }

    fn parse_response(text: &str) -> Result<Step> {
        let json_str = extract_json(text);

        let response: serde_json::Value = serde_json::from_str(json_str)
            .map_err(|e| anyhow::anyhow!("response is not valid JSON ({})", e))?;

        let thought = response
            .get("thought")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        if let Some(answer) = response.get("answer") {
            let answer = match answer {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Ok(Step::Finish { thought, answer });
        }

        if let Some(action) = response.get("action")
            && let Some(calls) = action.get("calls").and_then(|c| c.as_array())
        {
            let tool_calls: Vec<ToolCall> = calls
                .iter()
                .filter_map(|call| {
                    let tool = call.get("tool")?.as_str()?.to_string();
                    let args: HashMap<String, String> = call
                        .get("args")
                        .and_then(|a| a.as_object())
                        .map(|obj| {
                            obj.iter()
                                .map(|(k, v)| {
                                    let val = match v {
                                        serde_json::Value::String(s) => s.clone(),
                                        other => other.to_string(),
                                    };
                                    (k.clone(), val)
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    Some(ToolCall { tool, args })
                })
                .collect();

            if tool_calls.is_empty() {
                bail!("action has no valid tool calls");
            }

            return Ok(Step::Act {
                thought,
                calls: tool_calls,
            });
        }

        bail!("response is neither an answer nor a tool call")
    }
}

#[async_trait]
impl Thinker for AzureOpenAiThinker {
    async fn next_step(&self, context: &Context) -> Result<StepResult> {
        let messages = Self::build_messages(context);
        let body = ChatRequest {
            messages: &messages,
            temperature: 0.0,
        };

        let resp = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Azure OpenAI API error ({}): {}", status, text);
        }

        let api_resp: ChatResponse = resp
            .json()
            .await
            .context("failed to decode chat completion")?;

        let text = api_resp
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            bail!("Azure OpenAI API returned an empty completion");
        }

        let usage = api_resp.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });
        if let Some(usage) = usage {
            debug!(
                input = usage.input_tokens,
                output = usage.output_tokens,
                "token usage"
            );
        }

        let step = match Self::parse_response(&text) {
            Ok(step) => step,
            Err(e) => Step::Malformed {
                raw: text,
                reason: e.to_string(),
            },
        };

        Ok(StepResult { step, usage })
    }
}

fn completions_url(endpoint: &str, model: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{}/chat/completions?api-version={}",
        endpoint.trim_end_matches('/'),
        model,
        api_version
    )
}

/// Extract JSON from text that may be wrapped in markdown code fences.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(after) = trimmed.strip_prefix("```json")
        && let Some(json) = after.strip_suffix("```")
    {
        return json.trim();
    }
    if let Some(after) = trimmed.strip_prefix("```")
        && let Some(json) = after.strip_suffix("```")
    {
        return json.trim();
    }

    trimmed
}

// --- API types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [Message],
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}
