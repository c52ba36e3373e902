use actix_web::{web, HttpResponse};

use crate::error::{AppError, AppResult};
use crate::models::{ApiResponse, ProblemDraft, SearchQuery};
use crate::services::ProblemService;

/// List all problems in insertion order
pub async fn list_problems(problems: web::Data<ProblemService>) -> AppResult<HttpResponse> {
    let all = problems.list_all().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(all)))
}

/// Free-text search over title, category and keywords
pub async fn search_problems(
    query: web::Query<SearchQuery>,
    problems: web::Data<ProblemService>,
) -> AppResult<HttpResponse> {
    let matches = problems.search(&query.q).await?;
    log::debug!("Search '{}' matched {} problems", query.q, matches.len());
    Ok(HttpResponse::Ok().json(ApiResponse::ok(matches)))
}

/// Get single problem
pub async fn get_problem(
    path: web::Path<String>,
    problems: web::Data<ProblemService>,
) -> AppResult<HttpResponse> {
    let problem_id = path.into_inner();

    match problems.get_by_id(&problem_id).await? {
        Some(problem) => Ok(HttpResponse::Ok().json(ApiResponse::ok(problem))),
        None => Err(AppError::NotFound("Problem not found".to_string())),
    }
}

/// Register a problem from a partial record
pub async fn create_problem(
    body: web::Json<ProblemDraft>,
    problems: web::Data<ProblemService>,
) -> AppResult<HttpResponse> {
    let problem = problems.create(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(problem)))
}
