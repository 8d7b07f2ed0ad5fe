use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::VisionError;

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = "airmath-api/1.0";
const IMAGE_DATA_URL_PREFIX: &str = "data:image/png;base64,";
const MAX_TOKENS: u32 = 8;

pub const OCR_PROMPT: &str = "You are an OCR for a single hand-drawn math answer image.\n\
Return ONLY the final numeric answer (digits only). Examples: 5 or 12.\n\
No spaces. No words. No LaTeX. No symbols. If the image shows `=12`, return `12`.";

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────────────

/// Chat Completions client used for single-image OCR.
#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl VisionClient {
    pub fn new(config: &Config) -> Result<Self, VisionError> {
        let http = reqwest::ClientBuilder::new()
            .connect_timeout(std::time::Duration::from_secs(5))
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VisionError::Request(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for the answer shown in a base64 PNG payload.
    /// Returns the first choice's text, trimmed; a null content is empty text.
    pub async fn read_answer(&self, api_key: &str, image_b64: &str) -> Result<String, VisionError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![build_user_message(image_b64)],
            temperature: 0.0,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(VisionError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(VisionError::Status(status.as_u16()));
        }

        let completion: ChatCompletionResponse =
            response.json().await.map_err(VisionError::from_reqwest)?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| VisionError::InvalidResponse("no choices returned".to_string()))?;

        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}

fn build_user_message(image_b64: &str) -> Value {
    let data_url = format!("{}{}", IMAGE_DATA_URL_PREFIX, image_b64);
    json!({
        "role": "user",
        "content": [
            {"type": "text", "text": OCR_PROMPT},
            {"type": "image_url", "image_url": {"url": data_url}},
        ],
    })
}
