//! Concierge text answers from the Gemini `generateContent` API.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::{
    dto::advice::{AdviceRequest, AdviceResponse},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

const GENERATE_CONTENT_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const MAX_QUERY_CHARS: usize = 500;

pub const FALLBACK_ADVICE: &str = "I'm sorry, I'm unable to provide travel advice at the moment. \
Please contact our support team for assistance.";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

#[derive(Clone)]
pub struct AdviceService {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
}

impl AdviceService {
    pub fn new(api_key: Option<String>, model: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    /// Always answers; any upstream problem degrades to [`FALLBACK_ADVICE`].
    pub async fn advise(&self, query: &str) -> AdviceResponse {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("ADVICE_API_KEY is not set, answering with fallback advice");
            return AdviceResponse::fallback();
        };

        match self.generate(api_key, &concierge_prompt(query)).await {
            Ok(Some(answer)) => AdviceResponse {
                answer,
                fallback: false,
            },
            Ok(None) => {
                tracing::warn!(model = %self.model, "advice response carried no text");
                AdviceResponse::fallback()
            }
            Err(err) => {
                tracing::error!(error = %err, model = %self.model, "advice request failed");
                AdviceResponse::fallback()
            }
        }
    }

    async fn generate(&self, api_key: &str, prompt: &str) -> reqwest::Result<Option<String>> {
        let url = format!("{GENERATE_CONTENT_URL}/{}:generateContent", self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.7, "topP": 0.95 }
        });

        let response: GenerateContentResponse = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(answer_from_response(response))
    }
}

impl AdviceResponse {
    fn fallback() -> Self {
        AdviceResponse {
            answer: FALLBACK_ADVICE.to_string(),
            fallback: true,
        }
    }
}

pub async fn ask_concierge(
    state: &AppState,
    payload: AdviceRequest,
) -> AppResult<ApiResponse<AdviceResponse>> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err(AppError::validation("query must not be empty"));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(AppError::validation(format!(
            "query must be at most {MAX_QUERY_CHARS} characters"
        )));
    }

    let answer = state.advice.advise(query).await;
    Ok(ApiResponse::success("Advice", answer, Some(Meta::empty())))
}

fn concierge_prompt(query: &str) -> String {
    format!(
        "You are a luxury travel concierge for a premium chauffeur service.\n\
         Answer the following user query with professional, helpful, and high-end advice.\n\
         Keep it brief (under 100 words). Use markdown for styling if needed.\n\n\
         User Query: {query}"
    )
}

fn answer_from_response(response: GenerateContentResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
