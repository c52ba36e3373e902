use async_trait::async_trait;
use log::debug;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::models::{
    AnalysisResult, GenerateSolutionRequest, GeneratedSolution, GuidanceRequest, GuidanceResponse,
    Problem, ProblemDraft, UploadRequest,
};
use crate::services::retry::{retry_with_policy, RetryConfig, RetryDecision};

/// Everything the interactive shell needs from a Solvy server
#[async_trait]
pub trait ShellApi: Send + Sync {
    async fn list_problems(&self) -> anyhow::Result<Vec<Problem>>;
    async fn get_problem(&self, id: &str) -> anyhow::Result<Problem>;
    async fn search_problems(&self, query: &str) -> anyhow::Result<Vec<Problem>>;
    /// Not idempotent: implementations must not retry this call.
    async fn create_problem(&self, draft: &ProblemDraft) -> anyhow::Result<Problem>;
    async fn analyze(&self, image: &str, problem_type: Option<&str>) -> anyhow::Result<AnalysisResult>;
    async fn guidance(
        &self,
        problem_id: &str,
        step: u32,
        student_answer: Option<&str>,
    ) -> anyhow::Result<GuidanceResponse>;
    /// Drafted steps plus the server's note when it fell back to a generic plan
    async fn generate_solution(
        &self,
        request: &GenerateSolutionRequest,
    ) -> anyhow::Result<(GeneratedSolution, Option<String>)>;
}

#[derive(Debug)]
pub enum ClientError {
    /// The server answered with an error envelope
    Api { status: StatusCode, message: String },
    Transport(reqwest::Error),
    /// A success status whose body is not the expected envelope
    Decode(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Api { status, message } => {
                write!(f, "{} ({})", message, status.as_u16())
            }
            ClientError::Transport(e) => write!(f, "Could not reach the server: {}", e),
            ClientError::Decode(msg) => write!(f, "Unexpected response: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e)
    }
}

impl ClientError {
    /// Transport faults and 5xx answers are worth another attempt; 4xx never.
    fn retry_decision(&self) -> RetryDecision {
        match self {
            ClientError::Api { status, .. } if status.is_client_error() => RetryDecision::Abort,
            ClientError::Decode(_) => RetryDecision::Abort,
            _ => RetryDecision::Retry,
        }
    }
}

/// Pull the message out of either error shape the server produces:
/// `{ "success": false, "error": "..." }` or `{ "error": { "message": "..." } }`.
pub fn error_message(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::String(message) => Some(message.clone()),
        Value::Object(inner) => inner
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string),
        _ => None,
    }
}

/// Unwrap `{ success, data, note? }` into the data and optional note
pub fn unwrap_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: Value,
) -> Result<(T, Option<String>), ClientError> {
    if !status.is_success() || body.get("success") == Some(&Value::Bool(false)) {
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
        return Err(ClientError::Api { status, message });
    }

    let note = body
        .get("note")
        .and_then(|n| n.as_str())
        .map(str::to_string);
    let data = body
        .get("data")
        .cloned()
        .ok_or_else(|| ClientError::Decode("missing data field".to_string()))?;
    let data = serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()))?;
    Ok((data, note))
}

/// reqwest-backed client for the `/api` surface
#[derive(Clone)]
pub struct SolvyClient {
    base_url: String,
    client: reqwest::Client,
    retry: RetryConfig,
}

impl SolvyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_retry(base_url, RetryConfig::default())
    }

    pub fn with_retry(base_url: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            retry,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn send_once<B, T>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&B>,
    ) -> Result<(T, Option<String>), ClientError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).map_err(|_| {
            if status.is_success() {
                ClientError::Decode(format!("non-JSON body from {}", url))
            } else {
                ClientError::Api {
                    status,
                    message: status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string(),
                }
            }
        })?;
        unwrap_envelope(status, body)
    }

    /// Idempotent call, retried on transport and server faults
    async fn read<B, T>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&B>,
    ) -> anyhow::Result<(T, Option<String>)>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let operation = format!("{} {}", method, path);
        let result = retry_with_policy(
            &self.retry,
            &operation,
            || self.send_once(method.clone(), path, query, body),
            ClientError::retry_decision,
        )
        .await?;
        Ok(result)
    }
}

#[async_trait]
impl ShellApi for SolvyClient {
    async fn list_problems(&self) -> anyhow::Result<Vec<Problem>> {
        let (problems, _) = self
            .read::<(), _>(Method::GET, "/problems", None, None)
            .await?;
        Ok(problems)
    }

    async fn get_problem(&self, id: &str) -> anyhow::Result<Problem> {
        let path = format!("/problems/{}", id);
        let (problem, _) = self.read::<(), _>(Method::GET, &path, None, None).await?;
        Ok(problem)
    }

    async fn search_problems(&self, query: &str) -> anyhow::Result<Vec<Problem>> {
        let params = [("q", query)];
        let (problems, _) = self
            .read::<(), _>(Method::GET, "/problems/search", Some(&params), None)
            .await?;
        Ok(problems)
    }

    async fn create_problem(&self, draft: &ProblemDraft) -> anyhow::Result<Problem> {
        let (problem, _) = self
            .send_once(Method::POST, "/problems", None, Some(draft))
            .await?;
        Ok(problem)
    }

    async fn analyze(&self, image: &str, problem_type: Option<&str>) -> anyhow::Result<AnalysisResult> {
        let body = UploadRequest {
            image_base64: Some(image.to_string()),
            problem_type: problem_type.map(str::to_string),
        };
        let (result, _) = self
            .read(Method::POST, "/analysis/upload", None, Some(&body))
            .await?;
        Ok(result)
    }

    async fn guidance(
        &self,
        problem_id: &str,
        step: u32,
        student_answer: Option<&str>,
    ) -> anyhow::Result<GuidanceResponse> {
        let body = GuidanceRequest {
            problem_id: Some(problem_id.to_string()),
            current_step: Some(i64::from(step)),
            student_answer: student_answer.map(str::to_string),
        };
        let (guidance, _) = self
            .read(Method::POST, "/analysis/guidance", None, Some(&body))
            .await?;
        Ok(guidance)
    }

    async fn generate_solution(
        &self,
        request: &GenerateSolutionRequest,
    ) -> anyhow::Result<(GeneratedSolution, Option<String>)> {
        // Drafting is a pure function of the request, so it can be retried.
        self.read(Method::POST, "/admin/generate-solution", None, Some(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_both_error_shapes() {
        assert_eq!(
            error_message(&json!({"success": false, "error": "Problem not found"})),
            Some("Problem not found".to_string())
        );
        assert_eq!(
            error_message(&json!({"error": {"message": "Route not found", "statusCode": 404}})),
            Some("Route not found".to_string())
        );
        assert_eq!(error_message(&json!({"success": true})), None);
    }

    #[test]
    fn unwraps_success_envelope_with_note() {
        let body = json!({"success": true, "data": [1, 2, 3], "note": "fallback"});
        let (data, note): (Vec<u32>, _) = unwrap_envelope(StatusCode::OK, body).unwrap();
        assert_eq!(data, vec![1, 2, 3]);
        assert_eq!(note.as_deref(), Some("fallback"));
    }

    #[test]
    fn error_envelope_becomes_api_error() {
        let body = json!({"success": false, "error": "Invalid step 5: problem has 4 steps"});
        let err = unwrap_envelope::<Value>(StatusCode::BAD_REQUEST, body).unwrap_err();
        match &err {
            ClientError::Api { status, message } => {
                assert_eq!(*status, StatusCode::BAD_REQUEST);
                assert!(message.starts_with("Invalid step 5"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.retry_decision(), RetryDecision::Abort);
    }

    #[test]
    fn server_faults_are_retried() {
        let err = ClientError::Api {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
        };
        assert_eq!(err.retry_decision(), RetryDecision::Retry);
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = SolvyClient::new("http://localhost:5000/");
        assert_eq!(client.url("/problems"), "http://localhost:5000/api/problems");
    }
}
