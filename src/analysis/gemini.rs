//! Google Gemini vision backend.
//!
//! Posts the assessment prompt plus inline base64 images to the
//! `generateContent` endpoint. Image downloads that fail are skipped; the
//! call errors only when no image in the batch could be fetched.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::{parse_model_response, prompt, VisionAnalyzer};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::models::{AnalysisVerdict, PropertyFacts};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// User agent for image downloads; some photo CDNs refuse the default.
const IMAGE_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0 Safari/537.36";

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Gemini-backed [`VisionAnalyzer`].
pub struct GeminiAnalyzer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    config: AnalysisConfig,
}

impl GeminiAnalyzer {
    /// Build from config; fails when no API key is configured anywhere.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let api_key = config
            .resolve_api_key()
            .ok_or(AnalysisError::MissingApiKey)?;
        let client = reqwest::Client::builder()
            .user_agent(IMAGE_UA)
            .timeout(config.image_download_timeout())
            .build()
            .map_err(|e| AnalysisError::Http(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            config: config.clone(),
        })
    }

    /// Download one image and encode it for inline submission.
    async fn download_image(&self, url: &str) -> Option<InlineData> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "image download failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(url, status = %response.status(), "image download refused");
            return None;
        }
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|ct| ct.starts_with("image/"))
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!(url, error = %e, "image body read failed");
                return None;
            }
        };
        Some(InlineData {
            mime_type,
            data: BASE64.encode(&bytes),
        })
    }
}

#[async_trait]
impl VisionAnalyzer for GeminiAnalyzer {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn analyze_batch(
        &self,
        facts: &PropertyFacts,
        image_urls: &[String],
    ) -> Result<AnalysisVerdict, AnalysisError> {
        let mut parts = vec![GeminiPart::Text {
            text: prompt::property_prompt(facts),
        }];

        let mut downloaded = 0usize;
        for url in image_urls {
            if let Some(inline) = self.download_image(url).await {
                parts.push(GeminiPart::InlineData { inline_data: inline });
                downloaded += 1;
            }
        }
        if downloaded == 0 {
            return Err(AnalysisError::NoUsableImages);
        }
        if downloaded < image_urls.len() {
            warn!(
                downloaded,
                requested = image_urls.len(),
                "continuing with partial image batch"
            );
        }

        let request = GeminiRequest {
            contents: vec![GeminiContent { parts }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                top_p: 0.8,
                top_k: 40,
                max_output_tokens: 1000,
            },
        };

        let url = format!(
            "{GEMINI_ENDPOINT}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        info!(
            model = %self.model,
            images = downloaded,
            "submitting analysis batch"
        );

        let response = self
            .client
            .post(&url)
            .timeout(std::time::Duration::from_secs(
                self.config.image_download_timeout_secs.max(30) * 2,
            ))
            .json(&request)
            .send()
            .await
            .map_err(|e| AnalysisError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Api(format!("{status}: {body}")));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::Api(format!("unparseable response: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(AnalysisError::Api(error.message));
        }

        let text = parsed
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(AnalysisError::EmptyResponse)?;

        debug!(chars = text.len(), "model response received");
        Ok(parse_model_response(&text))
    }
}
