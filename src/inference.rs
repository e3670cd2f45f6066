//! The external inference capability.
//!
//! [`InferenceBackend`] is the seam to the multimodal service: it receives
//! the sampled frames, the instruction text, and the response schema, and
//! returns the service's raw text reply. [`analyze_frames`] builds the
//! request and validates the reply into a [`SizeEstimate`].
//! [`GeminiClient`] implements the backend over the hosted
//! `generateContent` HTTP API.
//!
//! All measurement is delegated: the card length and unit conversion live
//! only in [`SYSTEM_INSTRUCTION`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    configuration::ScannerConfig,
    error::FootScanError,
    estimate::{SizeEstimate, parse_estimate},
    frame::EncodedFrame,
};

/// System instruction sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert podiatrist and shoe fitting specialist. \
Your task is to analyze a series of images of a human foot, taken from slightly different angles, \
placed next to a standard credit card for scale. Your goal is to synthesize this information for a \
more accurate measurement.\n\
A standard credit card is 85.6mm long.\n\
Analyze the images to determine the most accurate foot length in millimeters by comparing it to the \
credit card across all provided frames.\n\
Then, convert the length to inches (1 inch = 25.4mm).\n\
Finally, using standard Brannock device conversions, calculate the US Men, US Women, EU, and UK shoe sizes.\n\
You MUST return the result ONLY as a valid JSON object. Do not include any other text, explanations, \
or markdown formatting.";

/// User prompt placed after the frames.
pub const ANALYSIS_PROMPT: &str = "Please analyze the provided series of images of a foot next to a \
credit card and return the single most accurate set of measurements and shoe sizes in the specified \
JSON format.";

/// The structured schema the reply must follow.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "length_mm": { "type": "NUMBER", "description": "Foot length in millimeters." },
            "length_in": { "type": "NUMBER", "description": "Foot length in inches." },
            "size_us_men": { "type": "STRING", "description": "US Men's shoe size." },
            "size_us_women": { "type": "STRING", "description": "US Women's shoe size." },
            "size_eu": { "type": "STRING", "description": "European shoe size." },
            "size_uk": { "type": "STRING", "description": "United Kingdom shoe size." }
        },
        "required": ["length_mm", "length_in", "size_us_men", "size_us_women", "size_eu", "size_uk"]
    })
}

/// One inference call.
#[derive(Debug, Clone, Copy)]
pub struct InferenceRequest<'a> {
    /// Sampled frames, in order.
    pub images: &'a [EncodedFrame],
    /// System-level instructions.
    pub instructions: &'a str,
    /// User prompt following the images.
    pub prompt: &'a str,
    /// Response schema.
    pub schema: &'a Value,
}

/// A multimodal inference service.
///
/// Implementations perform one call and return the reply text untouched;
/// validation happens in [`analyze_frames`]. No retries are expected.
pub trait InferenceBackend {
    /// Run one inference call.
    fn infer(&self, request: &InferenceRequest<'_>) -> Result<String, FootScanError>;
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for &B {
    fn infer(&self, request: &InferenceRequest<'_>) -> Result<String, FootScanError> {
        (**self).infer(request)
    }
}

/// Ask `backend` for a size estimate from `frames`.
///
/// # Errors
///
/// [`FootScanError::NoFramesExtracted`] for an empty frame list (the
/// backend is not called), any error from the backend, or the validation
/// errors of [`parse_estimate`].
pub fn analyze_frames<B: InferenceBackend + ?Sized>(
    backend: &B,
    frames: &[EncodedFrame],
) -> Result<SizeEstimate, FootScanError> {
    if frames.is_empty() {
        return Err(FootScanError::NoFramesExtracted);
    }

    let schema = response_schema();
    let request = InferenceRequest {
        images: frames,
        instructions: SYSTEM_INSTRUCTION,
        prompt: ANALYSIS_PROMPT,
        schema: &schema,
    };

    log::info!("Requesting size estimate from {} frame(s)", frames.len());
    let text = backend.infer(&request)?;
    let estimate = parse_estimate(&text).inspect_err(|error| {
        log::warn!("Rejected inference reply: {error}");
    })?;
    log::info!(
        "Estimated foot length {:.1} mm (US men {})",
        estimate.length_mm,
        estimate.size_us_men
    );
    Ok(estimate)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    InlineData(InlineData),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of all parts of the first candidate, concatenated.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

fn request_body<'a>(request: &InferenceRequest<'a>) -> GenerateContentRequest<'a> {
    let mut parts: Vec<Part<'a>> = request
        .images
        .iter()
        .map(|frame| {
            Part::InlineData(InlineData {
                mime_type: frame.mime_type(),
                data: frame.to_base64(),
            })
        })
        .collect();
    parts.push(Part::Text(request.prompt));

    GenerateContentRequest {
        system_instruction: Content {
            parts: vec![Part::Text(request.instructions)],
        },
        contents: vec![Content { parts }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: request.schema,
        },
    }
}

/// Blocking client for the hosted `generateContent` API.
///
/// Requests carry no timeout; the service decides how long a call takes.
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client for `model` with the given credential.
    ///
    /// # Errors
    ///
    /// [`FootScanError::MissingCredential`] if `api_key` is blank.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, FootScanError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(FootScanError::MissingCredential);
        }
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("footscan/", env!("CARGO_PKG_VERSION")))
            // The blocking client otherwise gives up after 30 seconds.
            .timeout(None::<Duration>)
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            endpoint: crate::configuration::DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Create a client from a scanner configuration.
    ///
    /// # Errors
    ///
    /// [`FootScanError::MissingCredential`] if the configuration has no
    /// credential.
    pub fn from_config(config: &ScannerConfig) -> Result<Self, FootScanError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(FootScanError::MissingCredential)?;
        Ok(Self::new(api_key, config.model.clone())?.with_endpoint(config.endpoint.clone()))
    }

    /// Override the service base URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

impl InferenceBackend for GeminiClient {
    fn infer(&self, request: &InferenceRequest<'_>) -> Result<String, FootScanError> {
        log::debug!(
            "POST {} ({} image part(s))",
            self.url(),
            request.images.len()
        );

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FootScanError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateContentResponse = response
            .json()
            .map_err(|error| FootScanError::RequestError(format!("unreadable reply: {error}")))?;
        Ok(reply.text().trim().to_string())
    }
}
