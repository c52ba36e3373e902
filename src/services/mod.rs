pub mod analysis;
pub mod database;
pub mod guidance;
pub mod problem_store;
pub mod repository;
pub mod retry;
pub mod seed;
pub mod step_generator;

pub use analysis::{AnalysisService, Analyzer, ImagePayload, MockAnalyzer};
pub use database::SqliteProblemRepository;
pub use guidance::{GuidanceGenerator, GuidanceSequencer, StoredStepGuidance};
pub use problem_store::ProblemService;
pub use repository::{InMemoryProblemRepository, ProblemRepository};
pub use step_generator::{OpenAiStepGenerator, SolutionDrafter, StepGenerator};
