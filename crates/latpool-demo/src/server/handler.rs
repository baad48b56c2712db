//! HTTP handlers for the worker-pool demo.
//!
//! `/process?num=N` runs one batch of `N` tasks through the shared
//! [`WorkerPool`], writes the per-task processing times to the configured
//! chart, and answers with a one-line summary. Every request gets its own
//! batch, so concurrent requests never mix their results.

use super::config::ServerConfig;
use crate::plot::plot_processing_times;
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use latpool::{TimingSeries, WorkerPool};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pool: Arc<WorkerPool>,
    config: Arc<ServerConfig>,
    // Overlapping requests write the same chart file.
    plot_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pool: Arc<WorkerPool>, config: ServerConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            plot_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/process", get(process))
        .route("/health", get(health))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ProcessParams {
    num: Option<String>,
}

/// Everything `/process` can fail with, mapped onto an HTTP status.
#[derive(Debug)]
pub enum ApiError {
    InvalidCount,
    Pool(latpool::Error),
    Plot(anyhow::Error),
}

impl From<latpool::Error> for ApiError {
    fn from(err: latpool::Error) -> Self {
        Self::Pool(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidCount => {
                (StatusCode::BAD_REQUEST, "Invalid number of requests").into_response()
            }
            Self::Pool(err) => {
                let status = match &err {
                    latpool::Error::InvalidBatch { .. } => StatusCode::BAD_REQUEST,
                    latpool::Error::ServiceShutdown => StatusCode::SERVICE_UNAVAILABLE,
                    latpool::Error::Starvation { .. } => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                tracing::warn!("Batch failed: {err}");
                (status, err.to_string()).into_response()
            }
            Self::Plot(err) => {
                tracing::error!("Failed to create plot: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create plot").into_response()
            }
        }
    }
}

/// Parses the `num` query parameter: a non-negative integer with no
/// surrounding whitespace.
fn parse_count(raw: Option<&str>) -> Result<usize, ApiError> {
    raw.and_then(|s| s.parse::<usize>().ok())
        .ok_or(ApiError::InvalidCount)
}

#[tracing::instrument(skip_all)]
async fn process(
    State(state): State<AppState>,
    Query(params): Query<ProcessParams>,
) -> Result<String, ApiError> {
    let count = parse_count(params.num.as_deref())?;

    let series = state
        .pool
        .run_batch(count, state.config.batch_timeout)
        .await?;

    if let Some(mean) = series.mean() {
        tracing::info!(
            "Processed {count} tasks (mean {mean:?}, max {:?})",
            series.max().unwrap_or_default()
        );
    }

    write_plot(&state, series).await?;

    Ok(format!(
        "Processed {count} requests. See {} for the plot.\n",
        state.config.plot_path.display()
    ))
}

async fn write_plot(state: &AppState, series: TimingSeries) -> Result<(), ApiError> {
    let path = state.config.plot_path.clone();
    let lock = Arc::clone(&state.plot_lock);

    tokio::task::spawn_blocking(move || {
        let _guard = lock.lock();
        plot_processing_times(&series, &path)
    })
    .await
    .map_err(|e| ApiError::Plot(e.into()))?
    .map_err(ApiError::Plot)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    if state.pool.is_shutting_down() {
        (StatusCode::SERVICE_UNAVAILABLE, "shutting down")
    } else {
        (StatusCode::OK, "ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use core::time::Duration;
    use latpool::Workload;
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn test_config(plot_path: PathBuf) -> ServerConfig {
        ServerConfig {
            num_workers: 4,
            queue_capacity: 16,
            max_batch_size: 1_000,
            batch_timeout: Some(Duration::from_secs(30)),
            shutdown_timeout: Duration::from_secs(1),
            workload: Workload::primes(200, 10_000),
            server_addr: "127.0.0.1:0".to_string(),
            plot_path,
        }
    }

    fn temp_plot(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("latpool-{}-{name}.svg", std::process::id()))
    }

    fn test_app(config: ServerConfig) -> (Router, AppState) {
        let pool = Arc::new(WorkerPool::new(config.pool_config()).unwrap());
        let state = AppState::new(pool, config);
        (router(state.clone()), state)
    }

    async fn fetch(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn parses_counts() {
        assert!(matches!(parse_count(Some("12")), Ok(12)));
        assert!(matches!(parse_count(Some(" 7 ")), Err(ApiError::InvalidCount)));
        assert!(matches!(parse_count(Some("0")), Ok(0)));
        assert!(matches!(parse_count(Some("-3")), Err(ApiError::InvalidCount)));
        assert!(matches!(parse_count(Some("abc")), Err(ApiError::InvalidCount)));
        assert!(matches!(parse_count(Some("")), Err(ApiError::InvalidCount)));
        assert!(matches!(parse_count(None), Err(ApiError::InvalidCount)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn process_writes_plot_and_summarizes() {
        let plot = temp_plot("process");
        let (app, _) = test_app(test_config(plot.clone()));

        let (status, body) = fetch(&app, "/process?num=25").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            format!("Processed 25 requests. See {} for the plot.\n", plot.display())
        );
        let svg = std::fs::read_to_string(&plot).unwrap();
        assert!(svg.contains("<svg"));
        let _ = std::fs::remove_file(&plot);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn zero_requests_is_fine() {
        let plot = temp_plot("zero");
        let (app, _) = test_app(test_config(plot.clone()));

        let (status, body) = fetch(&app, "/process?num=0").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("Processed 0 requests."));
        let _ = std::fs::remove_file(&plot);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn rejects_malformed_counts() {
        let (app, _) = test_app(test_config(temp_plot("malformed")));

        for uri in [
            "/process?num=abc",
            "/process?num=-3",
            "/process?num=1.5",
            "/process?num=%207%20",
            "/process",
        ] {
            let (status, body) = fetch(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body, "Invalid number of requests");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn rejects_oversized_batches() {
        let (app, _) = test_app(test_config(temp_plot("oversized")));
        let (status, body) = fetch(&app, "/process?num=1001").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("exceeds maximum allowed"), "{body}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn plot_failure_is_a_server_error() {
        let unwritable = std::env::temp_dir()
            .join(format!("latpool-missing-{}", std::process::id()))
            .join("nested")
            .join("chart.svg");
        let (app, _) = test_app(test_config(unwritable));

        let (status, body) = fetch(&app, "/process?num=3").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Failed to create plot");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn deadline_is_a_gateway_timeout() {
        let plot = temp_plot("deadline");
        let mut config = test_config(plot.clone());
        config.batch_timeout = Some(Duration::from_millis(5));
        config.workload = Workload::sleep(Duration::from_millis(200), Duration::from_millis(200));
        let (app, state) = test_app(config);

        let (status, body) = fetch(&app, "/process?num=8").await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body.contains("starved"), "{body}");
        assert!(body.contains("of 8 records"), "{body}");
        assert!(!plot.exists());
        assert_eq!(state.pool().batches_inflight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn worker_failure_is_a_server_error() {
        let plot = temp_plot("worker-failure");
        let mut config = test_config(plot.clone());
        config.workload = Workload::custom(|task| {
            if task == 2 {
                panic!("synthetic failure");
            }
        });
        let (app, _) = test_app(config);

        let (status, body) = fetch(&app, "/process?num=3").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Task 2 failed"), "{body}");
        assert!(body.contains("synthetic failure"), "{body}");
        assert!(!plot.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_are_isolated() {
        let plot = temp_plot("concurrent");
        let (app, _) = test_app(test_config(plot.clone()));

        let (a, b) = tokio::join!(
            fetch(&app, "/process?num=5"),
            fetch(&app, "/process?num=7")
        );

        assert_eq!(a.0, StatusCode::OK);
        assert_eq!(b.0, StatusCode::OK);
        assert!(a.1.starts_with("Processed 5 requests."));
        assert!(b.1.starts_with("Processed 7 requests."));
        let _ = std::fs::remove_file(&plot);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn shutdown_turns_requests_away() {
        let (app, state) = test_app(test_config(temp_plot("shutdown")));

        assert_eq!(fetch(&app, "/health").await, (StatusCode::OK, "ok".to_string()));

        state.pool().shutdown().await.unwrap();

        let (status, _) = fetch(&app, "/process?num=1").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let (status, _) = fetch(&app, "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
