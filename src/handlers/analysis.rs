use actix_web::{web, HttpResponse};

use crate::error::{AppError, AppResult};
use crate::models::{ApiResponse, GuidanceRequest, UploadRequest};
use crate::services::{AnalysisService, GuidanceSequencer};

/// Analyze an uploaded notebook photo
pub async fn upload_image(
    body: web::Json<UploadRequest>,
    analysis: web::Data<AnalysisService>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let image = request
        .image_base64
        .filter(|i| !i.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Image data is required".to_string()))?;

    let result = analysis
        .analyze(&image, request.problem_type.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(result)))
}

/// Hint and explanation for one step of a problem
pub async fn get_guidance(
    body: web::Json<GuidanceRequest>,
    guidance: web::Data<GuidanceSequencer>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let problem_id = request
        .problem_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("problemId is required".to_string()))?;
    let current_step = request
        .current_step
        .ok_or_else(|| AppError::Validation("currentStep is required".to_string()))?;

    let response = guidance
        .guidance_for(&problem_id, current_step, request.student_answer.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(response)))
}
