use actix_web::{web, HttpResponse};

use crate::error::AppResult;
use crate::models::{ApiResponse, GenerateSolutionRequest};
use crate::services::SolutionDrafter;

/// Draft solution steps for a problem that is about to be registered
pub async fn generate_solution(
    body: web::Json<GenerateSolutionRequest>,
    drafter: web::Data<SolutionDrafter>,
) -> AppResult<HttpResponse> {
    let outcome = drafter.draft(&body).await?;

    let envelope = match outcome.note {
        Some(note) => ApiResponse::with_note(outcome.solution, note),
        None => ApiResponse::ok(outcome.solution),
    };
    Ok(HttpResponse::Ok().json(envelope))
}
