use async_trait::async_trait;
use std::sync::Arc;

use crate::constants;
use crate::error::{AppError, AppResult};
use crate::models::{GuidanceResponse, Problem};
use crate::services::problem_store::ProblemService;

/// Renders the content for one step of a problem.
///
/// The sequencer has already checked that `step` is within `1..=total_steps`.
#[async_trait]
pub trait GuidanceGenerator: Send + Sync {
    async fn render(
        &self,
        problem: &Problem,
        step: usize,
        student_answer: Option<&str>,
    ) -> AppResult<GuidanceResponse>;

    fn name(&self) -> &'static str;
}

/// Serves the problem's own stored hints and explanations
pub struct StoredStepGuidance;

#[async_trait]
impl GuidanceGenerator for StoredStepGuidance {
    async fn render(
        &self,
        problem: &Problem,
        step: usize,
        _student_answer: Option<&str>,
    ) -> AppResult<GuidanceResponse> {
        let current = problem.step(step).ok_or_else(|| {
            AppError::GuidanceFailed(format!("problem {} has no step {}", problem.id, step))
        })?;

        let next_step_preparation = match problem.step(step + 1) {
            Some(next) => format!("Next, step {}: {}", next.step, next.hint),
            None => constants::TERMINAL_STEP_MESSAGE.to_string(),
        };

        Ok(GuidanceResponse {
            current_step: step as u32,
            total_steps: problem.total_steps() as u32,
            hint: current.hint.clone(),
            explanation: current.explanation.clone(),
            next_step_preparation,
            formula: current.formula.clone(),
            visual_description: current.visual_description.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "stored-steps"
    }
}

/// Guidance Sequencer: resolves the problem, bounds-checks the step, delegates rendering
#[derive(Clone)]
pub struct GuidanceSequencer {
    problems: ProblemService,
    generator: Arc<dyn GuidanceGenerator>,
}

impl GuidanceSequencer {
    pub fn new(problems: ProblemService, generator: Arc<dyn GuidanceGenerator>) -> Self {
        Self { problems, generator }
    }

    pub fn stored_steps(problems: ProblemService) -> Self {
        Self::new(problems, Arc::new(StoredStepGuidance))
    }

    pub async fn guidance_for(
        &self,
        problem_id: &str,
        step: i64,
        student_answer: Option<&str>,
    ) -> AppResult<GuidanceResponse> {
        let problem = self
            .problems
            .get_by_id(problem_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("problem {}", problem_id)))?;

        let total_steps = problem.total_steps();
        if step < 1 || step as usize > total_steps {
            return Err(AppError::InvalidStep { step, total_steps });
        }

        if let Some(answer) = student_answer {
            log::debug!(
                "Student answer for {} step {}: {} chars",
                problem_id,
                step,
                answer.chars().count()
            );
        }

        let guidance = self
            .generator
            .render(&problem, step as usize, student_answer)
            .await?;
        log::debug!(
            "Guidance {}/{} for {} via {}",
            guidance.current_step,
            guidance.total_steps,
            problem_id,
            self.generator.name()
        );
        Ok(guidance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::repository::InMemoryProblemRepository;
    use crate::services::seed::{seed_problems, STAR_PENTAGON_ID};
    use std::collections::HashSet;

    fn sequencer() -> GuidanceSequencer {
        let problems =
            ProblemService::new(Arc::new(InMemoryProblemRepository::with_problems(seed_problems())));
        GuidanceSequencer::stored_steps(problems)
    }

    #[tokio::test]
    async fn walks_every_step_of_the_star_pentagon() {
        let sequencer = sequencer();
        let mut hints = HashSet::new();

        for step in 1..=4 {
            let guidance = sequencer
                .guidance_for(STAR_PENTAGON_ID, step, None)
                .await
                .unwrap();
            assert_eq!(guidance.current_step, step as u32);
            assert_eq!(guidance.total_steps, 4);
            hints.insert(guidance.hint);
        }
        assert_eq!(hints.len(), 4);
    }

    #[tokio::test]
    async fn previews_the_following_step() {
        let sequencer = sequencer();
        let first = sequencer.guidance_for(STAR_PENTAGON_ID, 1, None).await.unwrap();
        let second = sequencer.guidance_for(STAR_PENTAGON_ID, 2, None).await.unwrap();
        assert!(first.next_step_preparation.contains(&second.hint));
        assert!(first.has_more_steps());

        let last = sequencer.guidance_for(STAR_PENTAGON_ID, 4, None).await.unwrap();
        assert_eq!(last.next_step_preparation, constants::TERMINAL_STEP_MESSAGE);
        assert!(!last.has_more_steps());
    }

    #[tokio::test]
    async fn out_of_range_steps_fail() {
        let sequencer = sequencer();
        for step in [0, 5, -1] {
            let err = sequencer
                .guidance_for(STAR_PENTAGON_ID, step, None)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidStep { total_steps: 4, .. }));
        }
    }

    #[tokio::test]
    async fn unknown_problem_is_not_found() {
        let err = sequencer().guidance_for("missing", 1, None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn student_answer_does_not_change_the_hint() {
        let sequencer = sequencer();
        let plain = sequencer.guidance_for(STAR_PENTAGON_ID, 2, None).await.unwrap();
        let answered = sequencer
            .guidance_for(STAR_PENTAGON_ID, 2, Some("540°"))
            .await
            .unwrap();
        assert_eq!(plain, answered);
    }

    #[tokio::test]
    async fn problem_without_steps_has_no_valid_step() {
        let problems =
            ProblemService::new(Arc::new(InMemoryProblemRepository::with_problems(seed_problems())));
        let created = problems
            .create(crate::models::ProblemDraft::titled("Empty"))
            .await
            .unwrap();
        let sequencer = GuidanceSequencer::stored_steps(problems);
        let err = sequencer.guidance_for(&created.id, 1, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidStep { total_steps: 0, .. }));
    }
}
