use log::{info, warn};

use super::api::ShellApi;
use super::state::{InvalidTransition, ShellEvent, ShellState};

/// Drives a [`ShellState`] against a server.
///
/// Out-of-order user actions are rejected with [`InvalidTransition`] and leave
/// the state alone. Request failures are not errors here: they move the shell
/// onto the `ErrorShown` overlay so the caller can show the message.
pub struct ClientShell<A: ShellApi> {
    api: A,
    state: ShellState,
}

impl<A: ShellApi> ClientShell<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: ShellState::Idle,
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn apply(&mut self, event: ShellEvent) -> Result<&ShellState, InvalidTransition> {
        self.state = self.state.next(event)?;
        Ok(&self.state)
    }

    fn fail(&mut self, error: anyhow::Error) -> Result<&ShellState, InvalidTransition> {
        warn!("Request failed while {}: {}", self.state.name(), error);
        self.apply(ShellEvent::RequestFailed(error.to_string()))
    }

    pub fn select_image(
        &mut self,
        image: String,
        problem_type: Option<String>,
    ) -> Result<&ShellState, InvalidTransition> {
        self.apply(ShellEvent::SelectImage {
            image,
            problem_type,
        })
    }

    /// Send the selected image for analysis
    pub async fn analyze(&mut self) -> Result<&ShellState, InvalidTransition> {
        self.apply(ShellEvent::Analyze)?;
        let (image, problem_type) = match &self.state {
            ShellState::Analyzing {
                image,
                problem_type,
            } => (image.clone(), problem_type.clone()),
            _ => return Ok(&self.state),
        };

        match self.api.analyze(&image, problem_type.as_deref()).await {
            Ok(analysis) => {
                info!(
                    "Analysis matched {:?} with confidence {:.2}",
                    analysis.matched_problem_id, analysis.confidence
                );
                self.apply(ShellEvent::AnalysisCompleted(analysis))
            }
            Err(e) => self.fail(e),
        }
    }

    /// Fetch the first step after an analysis, or the next one while advancing
    pub async fn fetch_guidance(
        &mut self,
        student_answer: Option<&str>,
    ) -> Result<&ShellState, InvalidTransition> {
        self.apply(ShellEvent::RequestGuidance)?;
        let (problem_id, step) = match &self.state {
            ShellState::FetchingGuidance {
                problem_id, step, ..
            } => (problem_id.clone(), *step),
            // No match: already on the error overlay
            _ => return Ok(&self.state),
        };

        match self.api.guidance(&problem_id, step, student_answer).await {
            Ok(guidance) => self.apply(ShellEvent::GuidanceReceived(guidance)),
            Err(e) => self.fail(e),
        }
    }

    /// Move on to the next step of the current problem
    pub async fn advance(
        &mut self,
        student_answer: Option<&str>,
    ) -> Result<&ShellState, InvalidTransition> {
        self.apply(ShellEvent::Advance)?;
        self.fetch_guidance(student_answer).await
    }

    pub fn dismiss_error(&mut self) -> Result<&ShellState, InvalidTransition> {
        self.apply(ShellEvent::Dismiss)
    }

    pub fn reset(&mut self) -> &ShellState {
        self.state = ShellState::Idle;
        &self.state
    }
}
