use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::constants;
use crate::error::{AppError, AppResult};
use crate::models::{GenerateSolutionRequest, GeneratedSolution, StepDraft};
use crate::services::retry::{retry_with_policy, RetryConfig, RetryDecision};

lazy_static! {
    static ref JSON_OBJECT_RE: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// Non-success HTTP answer from an AI provider
#[derive(Debug)]
pub struct ProviderError {
    pub status: u16,
    pub body: String,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "provider returned {}: {}", self.status, self.body)
    }
}

impl std::error::Error for ProviderError {}

/// Rejected requests (bad key, bad payload) fail the same way every time; 429 is transient.
fn retry_decision(error: &anyhow::Error) -> RetryDecision {
    match error.downcast_ref::<ProviderError>() {
        Some(e) if (400..500).contains(&e.status) && e.status != 429 => RetryDecision::Abort,
        _ => RetryDecision::Retry,
    }
}

/// AI provider trait for drafting solution steps
#[async_trait]
pub trait StepGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateSolutionRequest) -> anyhow::Result<GeneratedSolution>;
    /// Provider name
    fn name(&self) -> &'static str;
}

/// OpenAI chat completions provider
pub struct OpenAiStepGenerator {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiStepGenerator {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl StepGenerator for OpenAiStepGenerator {
    async fn generate(&self, request: &GenerateSolutionRequest) -> anyhow::Result<GeneratedSolution> {
        let request_body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are an expert high school math teacher. You break problems into small steps that leave the student room to think."
                },
                {
                    "role": "user",
                    "content": build_prompt(request)
                }
            ],
            "temperature": 0.7,
            "max_tokens": 2000
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ProviderError {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let result: Value = response.json().await?;
        let content = result["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format"))?;

        parse_generated(content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

fn build_prompt(request: &GenerateSolutionRequest) -> String {
    format!(
        r#"Create step-by-step guidance for the following math problem.

Title: {title}
Problem: {description}
Level: {level}
Category: {category}
Related theorems: {theorems}

Reply with a single JSON object:
{{
  "intent": "what the student should learn (1-2 sentences)",
  "approach": "recommended way to solve it (1-2 sentences)",
  "difficultyAssessment": "real difficulty and common pitfalls (1-2 sentences)",
  "steps": [
    {{ "step": 1, "hint": "one-sentence hint", "explanation": "2-3 sentence explanation", "formula": "optional formula" }}
  ]
}}
Use 4 to 6 steps. Leave the student room to think in each hint."#,
        title = request.title,
        description = request.description,
        level = request.level.as_str(),
        category = request.category.as_deref().unwrap_or(constants::DEFAULT_CATEGORY),
        theorems = request.theorems.join(", "),
    )
}

/// Pull the JSON object out of a model reply that may wrap it in prose or fences
pub fn parse_generated(content: &str) -> anyhow::Result<GeneratedSolution> {
    let json = JSON_OBJECT_RE
        .find(content)
        .map(|m| m.as_str())
        .unwrap_or(content);
    let parsed: GeneratedSolution = serde_json::from_str(json)?;
    if parsed.steps.is_empty() {
        return Err(anyhow::anyhow!("generated solution has no steps"));
    }
    Ok(parsed)
}

/// Generic four-step plan used when the AI backend fails
pub fn fallback_solution() -> GeneratedSolution {
    let step = |n: u32, hint: &str, explanation: &str| StepDraft {
        step: Some(n),
        hint: hint.to_string(),
        explanation: explanation.to_string(),
        formula: None,
        visual_description: None,
    };
    GeneratedSolution {
        intent: "Understand what the problem asks and practise the standard method.".to_string(),
        approach: "Apply the basic theorems and build the answer step by step.".to_string(),
        difficulty_assessment: "Standard difficulty; solvable with the core material.".to_string(),
        steps: vec![
            step(1, "Read the problem carefully and note what is asked.", "Organise the given information and state clearly what you need to find."),
            step(2, "Recall the theorems and formulas that apply.", "Decide which results from the course connect the given data to the unknown."),
            step(3, "Carry out the calculation.", "Use the chosen theorems to work towards the answer one step at a time."),
            step(4, "Check your answer.", "Verify that the result satisfies every condition in the problem."),
        ],
    }
}

/// Result of a drafting request
#[derive(Debug, Clone)]
pub struct DraftOutcome {
    pub solution: GeneratedSolution,
    /// Set when the fallback plan replaced a failed generation
    pub note: Option<String>,
}

/// Drafts solution steps for the admin flow
#[derive(Clone)]
pub struct SolutionDrafter {
    generator: Option<Arc<dyn StepGenerator>>,
    retry: RetryConfig,
}

impl SolutionDrafter {
    pub fn new(generator: Option<Arc<dyn StepGenerator>>, retry: RetryConfig) -> Self {
        Self { generator, retry }
    }

    /// OpenAI when a key is configured, otherwise no generator
    pub fn from_config(config: &Config) -> Self {
        let generator = config.openai_api_key.clone().map(|key| {
            Arc::new(OpenAiStepGenerator::new(key, config.openai_model.clone())) as Arc<dyn StepGenerator>
        });
        Self::new(generator, RetryConfig::default())
    }

    pub fn is_available(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn draft(&self, request: &GenerateSolutionRequest) -> AppResult<DraftOutcome> {
        if request.title.trim().is_empty() {
            return Err(AppError::Validation("title is required".to_string()));
        }
        let generator = self.generator.as_ref().ok_or_else(|| {
            AppError::Unavailable("no AI step generator configured; set OPENAI_API_KEY".to_string())
        })?;

        let generated = retry_with_policy(
            &self.retry,
            "Solution step generation",
            || generator.generate(request),
            retry_decision,
        )
        .await;

        match generated {
            Ok(mut solution) => {
                for (index, step) in solution.steps.iter_mut().enumerate() {
                    step.step = Some(index as u32 + 1);
                }
                log::info!(
                    "Generated {} steps for '{}' via {}",
                    solution.steps.len(),
                    request.title,
                    generator.name()
                );
                Ok(DraftOutcome {
                    solution,
                    note: None,
                })
            }
            Err(e) => {
                log::error!("Step generation via {} failed: {}", generator.name(), e);
                Ok(DraftOutcome {
                    solution: fallback_solution(),
                    note: Some("AI generation failed; returned the fallback step plan".to_string()),
                })
            }
        }
    }
}
