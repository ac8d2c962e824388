use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use image::{ImageError, ImageFormat};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::Duration;

use crate::models::aspect_ratio::AspectRatio;
use crate::models::job::{GeneratedFrame, GenerationConfig, SourceImage};

/// Fallback when the remote service fails without a usable message.
pub const GENERIC_FAILURE: &str = "Generation failed";

const END_FRAME_PROMPT: &str = "\
Task: generate the END FRAME of a short video clip. The attached image is its START FRAME.

Requirements:
1. Visual continuity: keep the same subjects, background, lighting, artistic style and camera \
angle as the start frame. It must read as the same shot.
2. Temporal progression: show the natural change a few seconds later.
   - People or characters: shift their expression slightly or move their limbs naturally.
   - Vehicles or objects: advance them along their likely path.
   - Landscapes: drift the clouds, water or light a little.
3. Text: any text in the frame must stay legible and grammatically correct. It may move, but \
must not turn into gibberish.
4. Aspect ratio: the output ratio has been set to match the input. Compose the frame to fill \
it exactly.

The start frame and this end frame will be interpolated into a smooth clip, so the change \
should imply motion.";

/// Something that can turn a start frame into an end frame.
#[async_trait]
pub trait FrameGenerator: Send + Sync {
    async fn generate(
        &self,
        source: &SourceImage,
        config: &GenerationConfig,
    ) -> Result<GeneratedFrame, GenerationError>;
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: Client,
    api_base: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationSettings,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 2],
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    image_config: ImageConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: AspectRatio,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

impl GeminiClient {
    pub fn new(
        api_base: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    fn send_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout.as_secs())
        } else {
            GenerationError::Remote(err.to_string())
        }
    }
}

#[async_trait]
impl FrameGenerator for GeminiClient {
    /// Generate the end frame for `source`.
    ///
    /// `_config.aspect_ratio` is not used: the target ratio is always
    /// detected from the source so the output framing matches the input.
    async fn generate(
        &self,
        source: &SourceImage,
        _config: &GenerationConfig,
    ) -> Result<GeneratedFrame, GenerationError> {
        let aspect_ratio = AspectRatio::detect(&source.bytes)?;

        let body = GenerateContentRequest {
            contents: [RequestContent {
                parts: [
                    RequestPart::Text {
                        text: END_FRAME_PROMPT,
                    },
                    RequestPart::Inline {
                        inline_data: InlineData {
                            mime_type: Some(source.mime_type.clone()),
                            data: base64::engine::general_purpose::STANDARD.encode(&source.bytes),
                        },
                    },
                ],
            }],
            generation_config: GenerationSettings {
                image_config: ImageConfig { aspect_ratio },
            },
        };

        tracing::debug!(
            model = %self.model,
            aspect_ratio = %aspect_ratio,
            source_bytes = source.bytes.len(),
            "Requesting end frame"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.send_error(e))?;

        if !status.is_success() {
            return Err(remote_error(status, &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)?;
        let payload = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.inline_data)
            .find(|d| !d.data.is_empty())
            .ok_or(GenerationError::NoImageReturned)?;

        let raw = base64::engine::general_purpose::STANDARD
            .decode(payload.data.as_bytes())
            .map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;

        Ok(GeneratedFrame {
            mime_type: "image/png".to_string(),
            bytes: to_png(raw)?,
            aspect_ratio,
        })
    }
}

/// Prefer the message from Google's error envelope, then the raw body.
fn remote_error(status: StatusCode, body: &str) -> GenerationError {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        if !envelope.error.message.is_empty() {
            return GenerationError::Remote(envelope.error.message);
        }
    }
    tracing::warn!(%status, body_len = body.len(), "Generation request failed without an error message");
    GenerationError::Remote(GENERIC_FAILURE.to_string())
}

/// Re-encode to PNG unless the payload already is one.
fn to_png(raw: Vec<u8>) -> Result<Bytes, GenerationError> {
    let format = image::guess_format(&raw)
        .map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;
    if format == ImageFormat::Png {
        return Ok(Bytes::from(raw));
    }

    let decoded = image::load_from_memory_with_format(&raw, format)
        .map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;
    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| GenerationError::InvalidPayload(e.to_string()))?;
    Ok(Bytes::from(png))
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Could not read source image: {0}")]
    Decode(#[from] ImageError),

    #[error("Generation timed out after {0}s")]
    Timeout(u64),

    #[error("{0}")]
    Remote(String),

    #[error("The API returned no image data")]
    NoImageReturned,

    #[error("Unexpected response from the API: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("Returned image could not be decoded: {0}")]
    InvalidPayload(String),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}
