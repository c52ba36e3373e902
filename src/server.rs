use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpResponse, HttpServer};
use log::info;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::handlers;
use crate::services::{
    seed, AnalysisService, GuidanceSequencer, InMemoryProblemRepository,
    MockAnalyzer, ProblemRepository, ProblemService, SolutionDrafter, SqliteProblemRepository,
};

/// Everything the HTTP layer hands to handlers
#[derive(Clone)]
pub struct AppServices {
    pub config: Config,
    pub problems: ProblemService,
    pub analysis: AnalysisService,
    pub guidance: GuidanceSequencer,
    pub drafter: SolutionDrafter,
}

impl AppServices {
    /// Wire services over the configured store and seed it when empty
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let repo: Arc<dyn ProblemRepository> = match &config.database_url {
            Some(url) => {
                info!("Using SQLite problem store at {}", url);
                Arc::new(SqliteProblemRepository::new(url).await?)
            }
            None => {
                info!("Using in-memory problem store");
                Arc::new(InMemoryProblemRepository::new())
            }
        };
        let drafter = SolutionDrafter::from_config(&config);
        Self::with_repository(config, repo, drafter).await
    }

    pub async fn with_repository(
        config: Config,
        repo: Arc<dyn ProblemRepository>,
        drafter: SolutionDrafter,
    ) -> anyhow::Result<Self> {
        let problems = ProblemService::new(repo);
        problems
            .seed_if_empty(seed::seed_problems())
            .await
            .map_err(|e| anyhow::anyhow!("failed to seed problem store: {}", e))?;

        let analyzer = Arc::new(MockAnalyzer::new(problems.clone(), config.match_threshold));
        let analysis = AnalysisService::new(analyzer, problems.clone());
        let guidance = GuidanceSequencer::stored_steps(problems.clone());

        Ok(Self {
            config,
            problems,
            analysis,
            guidance,
            drafter,
        })
    }

    /// Register shared state, body limits, error shaping and routes
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        let development = self.config.development;
        let json_config = web::JsonConfig::default()
            .limit(self.config.max_body_bytes)
            .error_handler(move |err, _req| {
                let status = match &err {
                    JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                        StatusCode::PAYLOAD_TOO_LARGE
                    }
                    _ => StatusCode::BAD_REQUEST,
                };
                let details = err.to_string();
                let response = framework_error(status, "Invalid request body", &details, development);
                InternalError::from_response(err, response).into()
            });

        cfg.app_data(json_config)
            .app_data(web::Data::new(self.config.clone()))
            .app_data(web::Data::new(self.problems.clone()))
            .app_data(web::Data::new(self.analysis.clone()))
            .app_data(web::Data::new(self.guidance.clone()))
            .app_data(web::Data::new(self.drafter.clone()))
            .configure(configure_routes)
            .default_service(web::to(handlers::not_found));
    }
}

pub async fn run(config: Config) -> std::io::Result<()> {
    let host = config.host.clone();
    let port = config.port;

    let services = AppServices::build(config)
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    print_banner(&host, port);
    info!("Server running at http://{}:{}/", host, port);
    if !services.drafter.is_available() {
        info!("OPENAI_API_KEY not set; solution drafting is disabled");
    }

    let startup_time = Instant::now();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(|cfg| services.configure(cfg))
    })
    .bind((host, port))?
    .run()
    .await?;

    info!("Server stopped. Uptime: {:?}", startup_time.elapsed());
    Ok(())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health)).service(
        web::scope("/api")
            .route("/problems", web::get().to(handlers::list_problems))
            .route("/problems", web::post().to(handlers::create_problem))
            .route("/problems/search", web::get().to(handlers::search_problems))
            .route("/problems/{id}", web::get().to(handlers::get_problem))
            .route("/analysis/upload", web::post().to(handlers::upload_image))
            .route("/analysis/guidance", web::post().to(handlers::get_guidance))
            .route(
                "/admin/generate-solution",
                web::post().to(handlers::generate_solution),
            ),
    );
}

/// Body for faults raised outside handlers: `{ "error": { "message", "statusCode" } }`
pub fn framework_error(
    status: StatusCode,
    message: &str,
    details: &str,
    development: bool,
) -> HttpResponse {
    log::warn!("{} ({}): {}", message, status.as_u16(), details);
    let mut error = serde_json::json!({
        "message": message,
        "statusCode": status.as_u16(),
    });
    if development {
        error["details"] = serde_json::Value::String(details.to_string());
    }
    HttpResponse::build(status).json(serde_json::json!({ "error": error }))
}

fn print_banner(host: &str, port: u16) {
    let banner = r#"
 ____        _
/ ___|  ___ | |_   ___   _
\___ \ / _ \| \ \ / / | | |
 ___) | (_) | |\ V /| |_| |
|____/ \___/|_| \_/  \__, |
                     |___/
"#;
    println!("{}", banner);
    println!("         Solvy server started at: http://{}:{}\n", host, port);
}
