//! OpenAI-backed reasoner.
//!
//! A reference implementation over the chat completions API with
//! JSON-schema structured outputs. Stage mechanics stay here, language
//! understanding stays in the model: the reachability probe is answered
//! mechanically from the tool session, page-reading stages fetch through
//! the session and hand the content to the model, and the screener is a
//! pure reasoning call.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ReasonerError, ToolError};
use crate::pipeline::stage::{branch, Stage, StageResult};
use crate::security::SecretString;
use crate::traits::reasoner::{Reasoner, StageRequest};
use crate::traits::tools::ToolSession;
use crate::types::payload::{
    ErrorMessage, FitScore, InspectionResult, JobDescription, StagePayload, UrlResult,
};

/// Cap on page content handed to the model.
const MAX_PAGE_CHARS: usize = 16_000;

/// OpenAI chat-completions reasoner.
pub struct OpenAiReasoner {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAiReasoner {
    /// Create a reasoner with the given API key.
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, ReasonerError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ReasonerError::Service("OPENAI_API_KEY not set".to_string().into())
        })?;
        Ok(Self::new(api_key))
    }

    /// Set the chat model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Chat completion with a JSON-schema response format, parsed into `T`.
    async fn structured<T>(&self, name: &str, prompt: &str) -> Result<T, ReasonerError>
    where
        T: DeserializeOwned + JsonSchema,
    {
        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
            temperature: f32,
            response_format: ResponseFormat,
        }

        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            format_type: &'static str,
            json_schema: JsonSchemaFormat,
        }

        #[derive(Serialize)]
        struct JsonSchemaFormat {
            name: String,
            schema: serde_json::Value,
            strict: bool,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMessage,
        }

        #[derive(Deserialize)]
        struct ChoiceMessage {
            content: String,
        }

        let schema = serde_json::to_value(schemars::schema_for!(T))
            .map_err(|e| ReasonerError::Service(Box::new(e)))?;

        let request = Request {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: name.to_string(),
                    schema,
                    strict: false,
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReasonerError::Timeout { seconds: 30 }
                } else {
                    ReasonerError::Service(Box::new(e))
                }
            })?;

        if !response.status().is_success() {
            return Err(ReasonerError::Service(
                format!("OpenAI API error: {}", response.status()).into(),
            ));
        }

        let parsed: Response = response
            .json()
            .await
            .map_err(|e| ReasonerError::Service(Box::new(e)))?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ReasonerError::MalformedOutput {
                reason: "empty choices".to_string(),
            })?;

        serde_json::from_str(content).map_err(|e| ReasonerError::MalformedOutput {
            reason: format!("structured output did not match schema: {e}"),
        })
    }

    fn session<'a>(
        &self,
        request: &StageRequest<'a>,
    ) -> Result<&'a dyn ToolSession, ReasonerError> {
        request.tools.ok_or(ReasonerError::Tool(ToolError::Unsupported {
            action: "tool session",
        }))
    }

    async fn read_page(
        &self,
        session: &dyn ToolSession,
        url: &str,
    ) -> Result<String, ReasonerError> {
        let page = session.navigate(url).await.map_err(ReasonerError::Tool)?;
        let mut body = page.body;
        if body.len() > MAX_PAGE_CHARS {
            let mut cut = MAX_PAGE_CHARS;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Ok(body)
    }

    async fn check_url(&self, request: &StageRequest<'_>) -> Result<StageResult, ReasonerError> {
        let session = self.session(request)?;
        let probe = session.probe(&request.context.url).await;

        if probe.reachable {
            Ok(StageResult::branch(
                branch::REACHABLE,
                StagePayload::Url(UrlResult {
                    url: probe.url,
                    status_code: probe.status_code,
                    reachable: true,
                }),
            ))
        } else {
            let detail = probe
                .error
                .unwrap_or_else(|| format!("HTTP {}", probe.status_code));
            Ok(StageResult::branch(
                branch::UNREACHABLE,
                StagePayload::Error(ErrorMessage::new(format!(
                    "URL not reachable: {detail}"
                ))),
            ))
        }
    }

    async fn inspect_page(
        &self,
        request: &StageRequest<'_>,
    ) -> Result<StageResult, ReasonerError> {
        #[derive(Deserialize, JsonSchema)]
        struct Verdict {
            is_job_posting: bool,
            reason: String,
        }

        let session = self.session(request)?;
        let content = self.read_page(session, &request.context.url).await?;
        let prompt = format!("{}\n\nPage content:\n{}", request.prompt, content);
        let verdict: Verdict = self.structured("inspection", &prompt).await?;

        if verdict.is_job_posting {
            Ok(StageResult::branch(
                branch::IS_JOB_POSTING,
                StagePayload::Inspection(InspectionResult {
                    is_job_posting: true,
                    notes: Some(verdict.reason),
                }),
            ))
        } else {
            Ok(StageResult::branch(
                branch::NOT_JOB_POSTING,
                StagePayload::Error(ErrorMessage::new(format!(
                    "Not a single job posting: {}",
                    verdict.reason
                ))),
            ))
        }
    }

    async fn extract_job(
        &self,
        request: &StageRequest<'_>,
    ) -> Result<StageResult, ReasonerError> {
        let session = self.session(request)?;
        let content = self.read_page(session, &request.context.url).await?;
        let prompt = format!("{}\n\nPage content:\n{}", request.prompt, content);
        let job: JobDescription = self.structured("job_description", &prompt).await?;

        Ok(StageResult::branch(
            branch::EXTRACTED,
            StagePayload::Job(job),
        ))
    }

    async fn score_fit(&self, request: &StageRequest<'_>) -> Result<StageResult, ReasonerError> {
        let fit: FitScore = self.structured("fit_score", &request.prompt).await?;
        Ok(StageResult::branch(
            branch::SCORED,
            StagePayload::Fit(FitScore {
                score: fit.score.clamp(1, 5),
                reason: fit.reason,
            }),
        ))
    }
}

#[async_trait::async_trait]
impl Reasoner for OpenAiReasoner {
    async fn invoke(&self, request: StageRequest<'_>) -> Result<StageResult, ReasonerError> {
        match request.stage {
            Stage::UrlChecker => self.check_url(&request).await,
            Stage::PageInspector => self.inspect_page(&request).await,
            Stage::Extractor => self.extract_job(&request).await,
            Stage::Screener => self.score_fit(&request).await,
            Stage::Summarizer => Err(ReasonerError::MalformedOutput {
                reason: "terminal stage has no reasoning step".to_string(),
            }),
        }
    }
}
