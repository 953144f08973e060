use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::app::{Author, ChatTurn, SystemProfile};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Chat-completion boundary. One call per user utterance; the full prior
/// turn history travels with every request.
pub(crate) trait ChatProvider: Send {
    /// Returns `Ok(None)` when the provider answered successfully but with
    /// no usable text. Any transport/API failure is an `Err`.
    fn generate(&self, profile: &SystemProfile, turns: &[ChatTurn]) -> Result<Option<String>>;
}

pub(crate) struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// A missing API key is not a startup error: the provider then rejects
    /// every call and each submission degrades to an apology turn.
    pub(crate) fn from_env() -> Self {
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .unwrap_or_default();
        let model = std::env::var("HEALTHDOST_MODEL")
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self {
            http: reqwest::blocking::Client::new(),
            api_key,
            model,
        }
    }
}

impl ChatProvider for GeminiClient {
    fn generate(&self, profile: &SystemProfile, turns: &[ChatTurn]) -> Result<Option<String>> {
        let url = format!("{}/{}:generateContent", GEMINI_ENDPOINT, self.model);
        let request = GenerateRequest {
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: &profile.persona,
                }],
            },
            contents: turns
                .iter()
                .map(|turn| Content {
                    role: match turn.author {
                        Author::User => "user",
                        Author::Assistant => "model",
                    },
                    parts: vec![Part { text: &turn.text }],
                })
                .collect(),
            generation_config: GenerationConfig {
                temperature: profile.temperature,
            },
        };

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .context("gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(anyhow!("gemini returned {}: {}", status, error_detail(&body)));
        }

        let reply: GenerateResponse = response.json().context("gemini response decode failed")?;
        Ok(reply_text(reply))
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    system_instruction: SystemInstruction<'a>,
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ReplyContent>,
}

#[derive(Deserialize)]
struct ReplyContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: Option<String>,
}

fn reply_text(reply: GenerateResponse) -> Option<String> {
    let text = reply
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Pulls the human-readable message out of a Gemini error body; falls back
/// to the raw (truncated) body when it is not the usual JSON shape.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")?
                .get("message")?
                .as_str()
                .map(|msg| msg.to_string())
        })
        .unwrap_or_else(|| crate::truncate(body.trim(), 160))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_parts(parts: Vec<ReplyPart>) -> GenerateResponse {
        GenerateResponse {
            candidates: vec![Candidate {
                content: Some(ReplyContent { parts }),
            }],
        }
    }

    #[test]
    fn reply_text_joins_candidate_parts() {
        let reply = response_with_parts(vec![
            ReplyPart {
                text: Some("Take a deep ".to_string()),
            },
            ReplyPart {
                text: Some("breath.".to_string()),
            },
        ]);
        assert_eq!(reply_text(reply), Some("Take a deep breath.".to_string()));
    }

    #[test]
    fn blank_reply_is_treated_as_absent() {
        let reply = response_with_parts(vec![ReplyPart {
            text: Some("  \n".to_string()),
        }]);
        assert_eq!(reply_text(reply), None);

        let no_candidates = GenerateResponse { candidates: vec![] };
        assert_eq!(reply_text(no_candidates), None);
    }

    #[test]
    fn error_detail_prefers_api_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_detail(body), "API key not valid");
        assert_eq!(error_detail("upstream blew up"), "upstream blew up");
    }
}
