use serde::{Deserialize, Serialize};

use super::problem::{ProblemId, ProblemLevel, StepDraft};

/// Output of image-to-problem matching. Request scoped, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub recognized_text: String,
    pub formulas: Vec<String>,
    /// Absent when there is no confident match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_problem_id: Option<ProblemId>,
    pub confidence: f64,
    #[serde(rename = "rawOCRData")]
    pub raw_ocr_data: String,
}

/// Per-step hint payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceResponse {
    pub current_step: u32,
    pub total_steps: u32,
    pub hint: String,
    pub explanation: String,
    pub next_step_preparation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_description: Option<String>,
}

impl GuidanceResponse {
    pub fn has_more_steps(&self) -> bool {
        self.current_step < self.total_steps
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidanceRequest {
    #[serde(default)]
    pub problem_id: Option<String>,
    #[serde(default)]
    pub current_step: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_answer: Option<String>,
}

/// Problem facts handed to a step generator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSolutionRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub level: ProblemLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub theorems: Vec<String>,
}

/// Drafted solution: teaching intent plus ordered steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSolution {
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub approach: String,
    #[serde(default, alias = "difficulty_assessment")]
    pub difficulty_assessment: String,
    #[serde(default)]
    pub steps: Vec<StepDraft>,
}
