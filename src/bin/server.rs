use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use slab_optimizer::compare::Comparison;
use slab_optimizer::config::OptimizerConfig;
use slab_optimizer::error::{ErrorKind, ErrorReport, OptimizeError};
use slab_optimizer::presets::PieceStats;
use slab_optimizer::types::{PieceRequest, Solution};
use slab_optimizer::Solver;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct OptimizeRequest {
    #[serde(default)]
    config: OptimizerConfig,
    pieces: Vec<PieceRequest>,
}

#[derive(Serialize)]
struct OptimizeResponse {
    #[serde(flatten)]
    solution: Solution,
    piece_stats: PieceStats,
}

type ApiError = (StatusCode, Json<ErrorReport>);

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::Unplaceable | ErrorKind::Infeasible => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Computation => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: OptimizeError) -> ApiError {
    if matches!(err, OptimizeError::Computation(_)) {
        tracing::error!(error = %err, "optimization failed");
        sentry::capture_message(&err.to_string(), sentry::Level::Error);
    } else {
        tracing::info!(error = %err, "request rejected");
    }
    (status_for(err.kind()), Json(err.report()))
}

/// Runs `job` on the blocking pool so long searches do not stall the runtime.
async fn run_blocking<T, F>(job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> slab_optimizer::Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => result.map_err(reject),
        Err(join) => Err(reject(OptimizeError::Computation(join.to_string()))),
    }
}

async fn optimize(Json(req): Json<OptimizeRequest>) -> Result<Json<OptimizeResponse>, ApiError> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    let solver = Solver::new(req.config, req.pieces);
    let piece_stats = solver.piece_stats();
    if piece_stats.oversized_count > 0 {
        tracing::info!(oversized = piece_stats.oversized_count, "request has oversized pieces");
    }
    let solution = run_blocking(move || solver.solve()).await?;
    Ok(Json(OptimizeResponse {
        solution,
        piece_stats,
    }))
}

async fn compare(Json(req): Json<OptimizeRequest>) -> Result<Json<Comparison>, ApiError> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /compare"
    );

    let solver = Solver::new(req.config, req.pieces);
    run_blocking(move || solver.compare()).await.map(Json)
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .route("/compare", post(compare))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

fn main() {
    let log_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: failed to open development.log: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    // Reporting is disabled when SENTRY_DSN is unset.
    let _sentry = sentry::init((
        std::env::var("SENTRY_DSN").ok(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    ));

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    runtime.block_on(serve());
}

async fn serve() {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    eprintln!("Listening on {addr}");
    if let Err(e) = axum::serve(listener, app()).await {
        tracing::error!(error = %e, "server stopped");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
