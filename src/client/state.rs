use std::fmt;

use crate::models::{AnalysisResult, GuidanceResponse, ProblemId};

/// Where the student currently is in the upload → analyze → guidance walk.
///
/// Pending states (`Analyzing`, `FetchingGuidance`, `AdvancingStep`) remember
/// enough to fall back to the settled state that started them, so a failed
/// request lands on an `ErrorShown` overlay without losing progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ShellState {
    #[default]
    Idle,
    ImageSelected {
        image: String,
        problem_type: Option<String>,
    },
    Analyzing {
        image: String,
        problem_type: Option<String>,
    },
    Analyzed {
        analysis: AnalysisResult,
    },
    FetchingGuidance {
        problem_id: ProblemId,
        step: u32,
        origin: Box<ShellState>,
    },
    GuidanceShown {
        problem_id: ProblemId,
        guidance: GuidanceResponse,
    },
    AdvancingStep {
        problem_id: ProblemId,
        guidance: GuidanceResponse,
    },
    ErrorShown {
        message: String,
        previous: Box<ShellState>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    SelectImage {
        image: String,
        problem_type: Option<String>,
    },
    Analyze,
    AnalysisCompleted(AnalysisResult),
    RequestGuidance,
    GuidanceReceived(GuidanceResponse),
    Advance,
    RequestFailed(String),
    Dismiss,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTransition {
    pub state: &'static str,
    pub event: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot {} while {}", self.event, self.state)
    }
}

impl std::error::Error for InvalidTransition {}

impl ShellState {
    pub fn name(&self) -> &'static str {
        match self {
            ShellState::Idle => "idle",
            ShellState::ImageSelected { .. } => "image selected",
            ShellState::Analyzing { .. } => "analyzing",
            ShellState::Analyzed { .. } => "analyzed",
            ShellState::FetchingGuidance { .. } => "fetching guidance",
            ShellState::GuidanceShown { .. } => "showing guidance",
            ShellState::AdvancingStep { .. } => "advancing step",
            ShellState::ErrorShown { .. } => "showing an error",
        }
    }

    /// True while a request is outstanding
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            ShellState::Analyzing { .. }
                | ShellState::FetchingGuidance { .. }
                | ShellState::AdvancingStep { .. }
        )
    }

    /// The state a failure in `self` falls back to once dismissed
    fn settled(&self) -> ShellState {
        match self {
            ShellState::Analyzing {
                image,
                problem_type,
            } => ShellState::ImageSelected {
                image: image.clone(),
                problem_type: problem_type.clone(),
            },
            ShellState::FetchingGuidance { origin, .. } => origin.settled(),
            ShellState::AdvancingStep {
                problem_id,
                guidance,
            } => ShellState::GuidanceShown {
                problem_id: problem_id.clone(),
                guidance: guidance.clone(),
            },
            ShellState::ErrorShown { previous, .. } => previous.settled(),
            other => other.clone(),
        }
    }

    /// Compute the state that follows `event`. The current state is left untouched.
    pub fn next(&self, event: ShellEvent) -> Result<ShellState, InvalidTransition> {
        let invalid = |event: &'static str| InvalidTransition {
            state: self.name(),
            event,
        };

        match (self, event) {
            (_, ShellEvent::Reset) => Ok(ShellState::Idle),

            (
                ShellState::Idle
                | ShellState::ImageSelected { .. }
                | ShellState::Analyzed { .. }
                | ShellState::GuidanceShown { .. },
                ShellEvent::SelectImage {
                    image,
                    problem_type,
                },
            ) => Ok(ShellState::ImageSelected {
                image,
                problem_type,
            }),
            (_, ShellEvent::SelectImage { .. }) => Err(invalid("select an image")),

            (
                ShellState::ImageSelected {
                    image,
                    problem_type,
                },
                ShellEvent::Analyze,
            ) => Ok(ShellState::Analyzing {
                image: image.clone(),
                problem_type: problem_type.clone(),
            }),
            (_, ShellEvent::Analyze) => Err(invalid("analyze")),

            (ShellState::Analyzing { .. }, ShellEvent::AnalysisCompleted(analysis)) => {
                Ok(ShellState::Analyzed { analysis })
            }
            (_, ShellEvent::AnalysisCompleted(_)) => Err(invalid("accept an analysis")),

            (ShellState::Analyzed { analysis }, ShellEvent::RequestGuidance) => {
                match &analysis.matched_problem_id {
                    Some(problem_id) => Ok(ShellState::FetchingGuidance {
                        problem_id: problem_id.clone(),
                        step: 1,
                        origin: Box::new(self.clone()),
                    }),
                    None => Ok(ShellState::ErrorShown {
                        message: "No matching problem was recognized in this image".to_string(),
                        previous: Box::new(self.clone()),
                    }),
                }
            }
            (
                ShellState::AdvancingStep {
                    problem_id,
                    guidance,
                },
                ShellEvent::RequestGuidance,
            ) => Ok(ShellState::FetchingGuidance {
                problem_id: problem_id.clone(),
                step: guidance.current_step + 1,
                origin: Box::new(self.clone()),
            }),
            (_, ShellEvent::RequestGuidance) => Err(invalid("request guidance")),

            (ShellState::FetchingGuidance { problem_id, .. }, ShellEvent::GuidanceReceived(guidance)) => {
                Ok(ShellState::GuidanceShown {
                    problem_id: problem_id.clone(),
                    guidance,
                })
            }
            (_, ShellEvent::GuidanceReceived(_)) => Err(invalid("accept guidance")),

            (
                ShellState::GuidanceShown {
                    problem_id,
                    guidance,
                },
                ShellEvent::Advance,
            ) if guidance.has_more_steps() => Ok(ShellState::AdvancingStep {
                problem_id: problem_id.clone(),
                guidance: guidance.clone(),
            }),
            (ShellState::GuidanceShown { .. }, ShellEvent::Advance) => {
                Err(invalid("advance past the last step"))
            }
            (_, ShellEvent::Advance) => Err(invalid("advance")),

            (ShellState::ErrorShown { .. }, ShellEvent::RequestFailed(_)) => {
                Err(invalid("report a failure"))
            }
            (state, ShellEvent::RequestFailed(message)) => Ok(ShellState::ErrorShown {
                message,
                previous: Box::new(state.settled()),
            }),

            (ShellState::ErrorShown { previous, .. }, ShellEvent::Dismiss) => {
                Ok(previous.as_ref().clone())
            }
            (_, ShellEvent::Dismiss) => Err(invalid("dismiss")),
        }
    }
}
