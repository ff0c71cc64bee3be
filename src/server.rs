use std::io::Write;
use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, HttpServer, get, post, web};
use futures::StreamExt;
use log::{error, info};
use serde_json::json;

use crate::client::OllamaClient;
use crate::config::GatewayConfig;
use crate::error::ClientError;
use crate::io_struct::{
    GenerateReqInput, HealthResponse, ModelsResponse, PipelineReqInput, PipelineRespOutput,
    SwitchModelReqInput, SwitchModelResponse,
};
use crate::pipeline::{self, PipelineState, WorkflowError};
use crate::resolver;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<OllamaClient>,
    pub supported_models: Vec<String>,
    pub log_interval: u64,
}

impl AppState {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        Ok(AppState {
            client: Arc::new(OllamaClient::new(config)?),
            supported_models: config.supported_models.clone(),
            log_interval: config.log_interval,
        })
    }
}

/// Translate client failures to distinguishable HTTP outcomes: unreachable
/// daemon is a gateway problem, unknown model is the caller's, everything
/// else is on us.
fn client_error(err: ClientError) -> actix_web::Error {
    match &err {
        ClientError::ConnectionFailed { .. } => actix_web::error::ErrorBadGateway(err.to_string()),
        ClientError::ModelNotFound { .. } => actix_web::error::ErrorNotFound(err.to_string()),
        ClientError::GenerationFailed { .. } | ClientError::UnexpectedPayload { .. } => {
            actix_web::error::ErrorInternalServerError(err.to_string())
        }
    }
}

fn workflow_error(err: WorkflowError) -> actix_web::Error {
    match err {
        WorkflowError::Inference(inner) => client_error(inner),
        topology => actix_web::error::ErrorInternalServerError(topology.to_string()),
    }
}

#[get("/")]
pub async fn index(_req: HttpRequest, _: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": "Ollama gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health",
    }))
}

#[get("/health")]
pub async fn health(_req: HttpRequest, app_state: web::Data<AppState>) -> HttpResponse {
    match app_state.client.check_health().await {
        Ok(details) => HttpResponse::Ok().json(HealthResponse {
            status: "healthy".to_string(),
            daemon_running: true,
            details: Some(details),
        }),
        Err(err) => {
            error!("daemon health check failed: {}", err);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "unhealthy".to_string(),
                daemon_running: false,
                details: Some(json!({ "error": err.to_string() })),
            })
        }
    }
}

#[get("/llm/models")]
pub async fn list_models(
    _req: HttpRequest,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let models = app_state.client.list_models().await.map_err(client_error)?;
    Ok(HttpResponse::Ok().json(ModelsResponse {
        count: models.len(),
        models,
    }))
}

#[post("/llm/generate")]
pub async fn generate(
    _req: HttpRequest,
    req: web::Json<GenerateReqInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let req = req.into_inner();
    if req.stream {
        let stream = app_state
            .client
            .generate_stream(&req.prompt, req.think, req.options.as_ref())
            .await
            .map_err(client_error)?;
        let stream = stream.map(|chunk| chunk.map_err(actix_web::error::ErrorBadGateway));
        return Ok(HttpResponse::Ok()
            .content_type("application/x-ndjson")
            .streaming(stream));
    }
    let output = app_state
        .client
        .generate(&req.prompt, req.think, req.options.as_ref())
        .await
        .map_err(client_error)?;
    Ok(HttpResponse::Ok().json(output))
}

#[post("/llm/models/switch")]
pub async fn switch_model(
    _req: HttpRequest,
    req: web::Json<SwitchModelReqInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let requested = req.into_inner().model;
    let outcome = app_state
        .client
        .switch_model(&requested)
        .await
        .map_err(client_error)?;
    let response = match outcome {
        Some(active) => SwitchModelResponse {
            success: true,
            message: format!("Successfully switched to {}", active),
            model: active,
        },
        None => {
            let active = app_state.client.active_model().await;
            SwitchModelResponse {
                success: false,
                message: format!("Model {} not available. Still using {}", requested, active),
                model: active,
            }
        }
    };
    Ok(HttpResponse::Ok().json(response))
}

#[post("/agents/pipeline")]
pub async fn run_pipeline(
    _req: HttpRequest,
    req: web::Json<PipelineReqInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let state = pipeline::run_sequential(&app_state.client, req.into_inner().text)
        .await
        .map_err(client_error)?;
    let model = app_state.client.active_model().await;
    Ok(HttpResponse::Ok().json(PipelineRespOutput {
        summary: state.summary.unwrap_or_default(),
        analysis: state.analysis.unwrap_or_default(),
        model,
    }))
}

#[post("/agents/workflow")]
pub async fn run_workflow(
    _req: HttpRequest,
    req: web::Json<PipelineReqInput>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let initial = PipelineState {
        text: req.into_inner().text,
        ..PipelineState::default()
    };
    let state = pipeline::analysis_workflow()
        .run(&app_state.client, initial)
        .await
        .map_err(workflow_error)?;
    Ok(HttpResponse::Ok().json(state))
}

/// Background task: report daemon reachability and catalog size on an
/// interval, and on the first pass log which configured models the daemon
/// actually has.
pub async fn periodic_logging(app_state: AppState) {
    match app_state.client.list_models().await {
        Ok(models) => {
            let usable = resolver::probe_models(&app_state.supported_models, &models);
            info!(
                "daemon reports {} models; {} of {} configured models present: {}",
                models.len(),
                usable.len(),
                app_state.supported_models.len(),
                usable.join(", ")
            );
        }
        Err(e) => error!("initial daemon probe failed: {}", e),
    }
    loop {
        tokio::time::sleep(std::time::Duration::from_secs(app_state.log_interval)).await;
        match app_state.client.check_health().await {
            Ok(_) => match app_state.client.list_models().await {
                Ok(models) => info!(
                    "daemon healthy, {} models available, active model {}",
                    models.len(),
                    app_state.client.active_model().await
                ),
                Err(e) => error!("daemon catalog check failed: {}", e),
            },
            Err(e) => error!("daemon health check failed: {}", e),
        }
    }
}

pub async fn startup(config: GatewayConfig, app_state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(app_state);

    println!("Starting server at {}:{}", config.host, config.port);

    // default level is info
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, log::LevelFilter::Info)
        .init();

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(app_state.clone())
            .service(index)
            .service(health)
            .service(list_models)
            .service(switch_model)
            .service(generate)
            .service(run_pipeline)
            .service(run_workflow)
    })
    .bind((config.host, config.port))?
    .run()
    .await?;

    std::io::Result::Ok(())
}
