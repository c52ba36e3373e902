use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose;

use crate::constants;
use crate::error::{AppError, AppResult};
use crate::models::AnalysisResult;
use crate::services::problem_store::ProblemService;

/// Decoded image upload
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Payload as received, kept for diagnostics
    pub raw: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// Accepts `data:<mime>;base64,<data>` or bare base64 (standard or URL-safe, padding optional).
    pub fn parse(raw: &str) -> AppResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput("image payload is empty".to_string()));
        }

        let (mime_type, data) = match trimmed.strip_prefix("data:") {
            Some(rest) => {
                let (header, data) = rest.split_once(',').ok_or_else(|| {
                    AppError::InvalidInput("data URI has no payload".to_string())
                })?;
                let mime = header.strip_suffix(";base64").ok_or_else(|| {
                    AppError::InvalidInput("data URI is not base64 encoded".to_string())
                })?;
                let mime = (!mime.is_empty()).then(|| mime.to_string());
                (mime, data)
            }
            None => (None, trimmed),
        };

        let bytes = decode_base64(data)
            .ok_or_else(|| AppError::InvalidInput("image payload is not valid base64".to_string()))?;
        if bytes.is_empty() {
            return Err(AppError::InvalidInput("image payload decodes to nothing".to_string()));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            mime_type,
            bytes,
        })
    }

    /// Head of the payload for `rawOCRData`
    pub fn preview(&self) -> String {
        let head: String = self.raw.chars().take(constants::RAW_OCR_PREVIEW_CHARS).collect();
        format!("{}...", head)
    }
}

fn decode_base64(data: &str) -> Option<Vec<u8>> {
    let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    [
        &general_purpose::STANDARD,
        &general_purpose::STANDARD_NO_PAD,
        &general_purpose::URL_SAFE,
        &general_purpose::URL_SAFE_NO_PAD,
    ]
    .iter()
    .find_map(|engine| engine.decode(&compact).ok())
}

/// Seam for a vision/OCR backend
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        image: &ImagePayload,
        problem_type: Option<&str>,
    ) -> AppResult<AnalysisResult>;

    fn name(&self) -> &'static str;
}

/// Deterministic stand-in that "recognizes" a stored problem.
///
/// With a type hint the first search hit wins, otherwise the first stored problem.
/// Problems without solution steps are never offered, since guidance could not start.
pub struct MockAnalyzer {
    problems: ProblemService,
    match_threshold: f64,
}

impl MockAnalyzer {
    const HINTED_CONFIDENCE: f64 = 0.95;
    const DEFAULT_CONFIDENCE: f64 = 0.85;

    pub fn new(problems: ProblemService, match_threshold: f64) -> Self {
        Self {
            problems,
            match_threshold,
        }
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    async fn analyze(
        &self,
        image: &ImagePayload,
        problem_type: Option<&str>,
    ) -> AppResult<AnalysisResult> {
        let hint = problem_type.map(str::trim).filter(|h| !h.is_empty());
        let (candidate, confidence) = match hint {
            Some(hint) => (self.problems.search(hint).await?, Self::HINTED_CONFIDENCE),
            None => (self.problems.list_all().await?, Self::DEFAULT_CONFIDENCE),
        };
        let candidate = candidate.into_iter().find(|p| p.total_steps() > 0);

        let Some(problem) = candidate else {
            return Ok(AnalysisResult {
                recognized_text: String::new(),
                formulas: vec![],
                matched_problem_id: None,
                confidence: 0.0,
                raw_ocr_data: image.preview(),
            });
        };

        Ok(AnalysisResult {
            recognized_text: problem.title.clone(),
            formulas: problem.extract_formulas(),
            matched_problem_id: (confidence >= self.match_threshold).then(|| problem.id.clone()),
            confidence,
            raw_ocr_data: image.preview(),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Analysis Adapter: payload validation and output checks around an `Analyzer`
#[derive(Clone)]
pub struct AnalysisService {
    analyzer: std::sync::Arc<dyn Analyzer>,
    problems: ProblemService,
}

impl AnalysisService {
    pub fn new(analyzer: std::sync::Arc<dyn Analyzer>, problems: ProblemService) -> Self {
        Self { analyzer, problems }
    }

    pub async fn analyze(&self, image: &str, problem_type: Option<&str>) -> AppResult<AnalysisResult> {
        let payload = ImagePayload::parse(image)?;

        log::info!(
            "Analyzing {} byte image ({}) with {}",
            payload.bytes.len(),
            payload.mime_type.as_deref().unwrap_or("unknown type"),
            self.analyzer.name()
        );
        let result = match self.analyzer.analyze(&payload, problem_type).await {
            Ok(result) => result,
            // Storage and internal detail must stay out of the public message
            Err(e @ (AppError::Storage(_) | AppError::Internal(_) | AppError::AnalysisFailed(_))) => {
                return Err(e);
            }
            Err(e) => return Err(AppError::AnalysisFailed(e.to_string())),
        };
        self.check(&result).await?;
        Ok(result)
    }

    async fn check(&self, result: &AnalysisResult) -> AppResult<()> {
        if !result.confidence.is_finite() || !(0.0..=1.0).contains(&result.confidence) {
            return Err(AppError::AnalysisFailed(format!(
                "{} returned confidence {} outside [0, 1]",
                self.analyzer.name(),
                result.confidence
            )));
        }
        if let Some(id) = &result.matched_problem_id {
            if self.problems.get_by_id(id).await?.is_none() {
                return Err(AppError::AnalysisFailed(format!(
                    "{} matched unknown problem {}",
                    self.analyzer.name(),
                    id
                )));
            }
        }
        Ok(())
    }
}
