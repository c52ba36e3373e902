use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

pub type ProblemId = String;

/// Target audience of a problem
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProblemLevel {
    MiddleSchool,
    #[default]
    HighSchool,
    University,
}

impl ProblemLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemLevel::MiddleSchool => "middle-school",
            ProblemLevel::HighSchool => "high-school",
            ProblemLevel::University => "university",
        }
    }
}

impl std::str::FromStr for ProblemLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "middle-school" => Ok(ProblemLevel::MiddleSchool),
            "high-school" => Ok(ProblemLevel::HighSchool),
            "university" => Ok(ProblemLevel::University),
            other => Err(format!("unknown problem level: {}", other)),
        }
    }
}

/// One unit of guidance. `step` is 1-based and equals its index + 1 in the parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionStep {
    pub step: u32,
    pub hint: String,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_description: Option<String>,
}

/// A stored math exercise with its ordered hint sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: ProblemId,
    pub title: String,
    pub description: String,
    pub level: ProblemLevel,
    pub category: String,
    /// Theorem identifiers, informational only
    pub theorems: Vec<String>,
    pub keywords: Vec<String>,
    pub solution_steps: Vec<SolutionStep>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

/// Step as submitted by a client; a missing `step` is filled from its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
    #[serde(default)]
    pub hint: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_description: Option<String>,
}

/// Partial problem accepted by `POST /api/problems`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<ProblemLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theorems: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution_steps: Option<Vec<StepDraft>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl ProblemDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

impl Problem {
    /// Generate a fresh problem ID
    pub fn generate_id() -> ProblemId {
        uuid::Uuid::new_v4().to_string()
    }

    /// Current time at the precision every store can round-trip.
    pub fn timestamp() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(3)
    }

    pub fn total_steps(&self) -> usize {
        self.solution_steps.len()
    }

    /// Step by its 1-based number
    pub fn step(&self, number: usize) -> Option<&SolutionStep> {
        number
            .checked_sub(1)
            .and_then(|index| self.solution_steps.get(index))
    }

    /// Case-insensitive substring match on title, category and keywords.
    /// An empty query matches every problem.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self.category.to_lowercase().contains(&needle)
            || self
                .keywords
                .iter()
                .any(|k| k.to_lowercase().contains(&needle))
    }

    /// Extract LaTeX-style formula fragments from the description and step formulas
    pub fn extract_formulas(&self) -> Vec<String> {
        let mut formulas = crate::utils::extract_latex(&self.description);
        formulas.extend(
            self.solution_steps
                .iter()
                .filter_map(|s| s.formula.as_ref())
                .filter(|f| !f.trim().is_empty())
                .cloned(),
        );
        formulas
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Problem {
        let now = Problem::timestamp();
        Problem {
            id: "p-1".to_string(),
            title: "Star Pentagon".to_string(),
            description: "Show that $a + b = c$".to_string(),
            level: ProblemLevel::HighSchool,
            category: "Geometry".to_string(),
            theorems: vec![],
            keywords: vec!["Interior Angles".to_string()],
            solution_steps: vec![SolutionStep {
                step: 1,
                hint: "h".to_string(),
                explanation: "e".to_string(),
                formula: Some("5 × 36° = 180°".to_string()),
                visual_description: None,
            }],
            created_at: now,
            updated_at: now,
            image_url: None,
            video_url: None,
        }
    }

    #[test]
    fn matches_is_case_insensitive_across_fields() {
        let p = sample();
        assert!(p.matches("geometry"));
        assert!(p.matches("PENTAGON"));
        assert!(p.matches("interior"));
        assert!(p.matches(""));
        assert!(!p.matches("calculus"));
    }

    #[test]
    fn step_lookup_is_one_based() {
        let p = sample();
        assert!(p.step(0).is_none());
        assert_eq!(p.step(1).map(|s| s.hint.as_str()), Some("h"));
        assert!(p.step(2).is_none());
    }

    #[test]
    fn serializes_with_camel_case_and_kebab_level() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["level"], "high-school");
        assert!(json.get("solutionSteps").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("imageUrl").is_none());
        assert!(json["solutionSteps"][0].get("visualDescription").is_none());
    }

    #[test]
    fn extracts_description_and_step_formulas() {
        let formulas = sample().extract_formulas();
        assert_eq!(formulas, vec!["a + b = c".to_string(), "5 × 36° = 180°".to_string()]);
    }

    #[test]
    fn parses_levels() {
        assert_eq!("university".parse::<ProblemLevel>(), Ok(ProblemLevel::University));
        assert!("kindergarten".parse::<ProblemLevel>().is_err());
    }
}
