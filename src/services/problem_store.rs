use std::sync::Arc;
use tokio::sync::Mutex;

use crate::constants;
use crate::error::{AppError, AppResult};
use crate::models::{Problem, ProblemDraft, SolutionStep, StepDraft};
use crate::services::repository::ProblemRepository;

/// Problem Store: list, lookup, search and append-only creation over a repository
#[derive(Clone)]
pub struct ProblemService {
    repo: Arc<dyn ProblemRepository>,
    // Serialises `create` so id checks and append order stay consistent
    write_lock: Arc<Mutex<()>>,
}

impl ProblemService {
    pub fn new(repo: Arc<dyn ProblemRepository>) -> Self {
        Self {
            repo,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Insert `problems` when the store is empty. Returns how many were added.
    pub async fn seed_if_empty(&self, problems: Vec<Problem>) -> AppResult<usize> {
        let _guard = self.write_lock.lock().await;
        if self.repo.count().await? > 0 {
            return Ok(0);
        }
        let count = problems.len();
        for problem in &problems {
            self.repo.insert(problem).await?;
        }
        log::info!("Seeded problem store with {} problems", count);
        Ok(count)
    }

    pub async fn list_all(&self) -> AppResult<Vec<Problem>> {
        Ok(self.repo.list_all().await?)
    }

    pub async fn get_by_id(&self, id: &str) -> AppResult<Option<Problem>> {
        Ok(self.repo.get_by_id(id).await?)
    }

    /// Matches in store order; an empty query returns everything.
    pub async fn search(&self, query: &str) -> AppResult<Vec<Problem>> {
        let problems = self.repo.list_all().await?;
        Ok(problems.into_iter().filter(|p| p.matches(query)).collect())
    }

    /// Validate a draft, fill defaults, assign id and timestamps, then append.
    pub async fn create(&self, draft: ProblemDraft) -> AppResult<Problem> {
        let problem = build_problem(draft)?;

        let _guard = self.write_lock.lock().await;
        self.repo.insert(&problem).await?;
        log::info!("Created problem {} ({})", problem.id, problem.title);

        Ok(problem)
    }
}

fn build_problem(draft: ProblemDraft) -> AppResult<Problem> {
    let title = draft.title.unwrap_or_default().trim().to_string();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    let solution_steps = number_steps(draft.solution_steps.unwrap_or_default())?;
    let category = draft
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| constants::DEFAULT_CATEGORY.to_string());

    let now = Problem::timestamp();
    Ok(Problem {
        id: Problem::generate_id(),
        title,
        description: draft.description.unwrap_or_default(),
        level: draft.level.unwrap_or_default(),
        category,
        theorems: draft.theorems.unwrap_or_default(),
        keywords: draft.keywords.unwrap_or_default(),
        solution_steps,
        created_at: now,
        updated_at: now,
        image_url: draft.image_url,
        video_url: draft.video_url,
    })
}

/// Positions define progression; an explicit `step` must agree with its position.
fn number_steps(drafts: Vec<StepDraft>) -> AppResult<Vec<SolutionStep>> {
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            let position = index as u32 + 1;
            if let Some(step) = draft.step {
                if step != position {
                    return Err(AppError::Validation(format!(
                        "solution step at position {} is numbered {}",
                        position, step
                    )));
                }
            }
            if draft.hint.trim().is_empty() || draft.explanation.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "solution step {} needs a hint and an explanation",
                    position
                )));
            }
            Ok(SolutionStep {
                step: position,
                hint: draft.hint,
                explanation: draft.explanation,
                formula: draft.formula.filter(|f| !f.trim().is_empty()),
                visual_description: draft.visual_description.filter(|v| !v.trim().is_empty()),
            })
        })
        .collect()
}
