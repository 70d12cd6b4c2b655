use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use tenet_core::{AskResult, IngestReport};

use super::error::ApiError;
use super::server::AppState;

#[derive(Debug, serde::Deserialize)]
pub(crate) struct AskRequest {
    pub query: String,
    #[serde(default)]
    pub k: Option<usize>,
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.health())
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.metrics())
}

pub(crate) async fn ingest_handler(
    State(state): State<AppState>,
) -> Result<Json<IngestReport>, ApiError> {
    let report = state.engine.ingest(&state.data_dir).await?;
    Ok(Json(report))
}

pub(crate) async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResult>, ApiError> {
    let k = request.k.unwrap_or_else(|| state.engine.default_k());
    let result = state.engine.ask(&request.query, k).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_request_k_is_optional() {
        let req: AskRequest = serde_json::from_str(r#"{"query":"refund?"}"#).unwrap();
        assert_eq!(req.query, "refund?");
        assert_eq!(req.k, None);

        let req: AskRequest = serde_json::from_str(r#"{"query":"q","k":2}"#).unwrap();
        assert_eq!(req.k, Some(2));
    }

    #[test]
    fn ask_request_requires_query() {
        assert!(serde_json::from_str::<AskRequest>(r#"{"k":2}"#).is_err());
    }
}
