//! HTTP surface: extraction, company matching and case overview.
//!
//! Handlers are thin wrappers; all decisions live in the core modules.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::case::{
    aggregate_deadlines, derive_case_stage, next_hearing_iso, AggregatedDeadline, InsolvencyDocument,
    ProcedureStage,
};
use crate::company::Company;
use crate::extractor::{ExtractError, Extractor};
use crate::matching::{best_match, best_match_two_sided, suggest_companies, PartyRef};
use crate::schema::{Debtor, ExtractionResult};
use crate::vision::{image_data_url, VisionError};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Extractor,
}

pub fn router(state: AppState, body_limit_mb: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/extract", post(extract_images))
        .route("/extract/upload", post(extract_upload))
        .route("/companies/match", post(match_company))
        .route("/companies/match/two-sided", post(match_company_two_sided))
        .route("/companies/from-debtor", post(company_from_debtor))
        .route("/cases/overview", post(case_overview))
        .layer(DefaultBodyLimit::max(body_limit_mb * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

/// Error response body: `{ "error": "<message>" }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ExtractError> for ApiError {
    fn from(err: ExtractError) -> Self {
        let status = match &err {
            ExtractError::NoImages => StatusCode::BAD_REQUEST,
            ExtractError::Vision(VisionError::EmptyResponse) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Extraction failed: {}", err);
        }
        Self::new(status, err.to_string())
    }
}

// ============================================================================
// Extraction
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct ExtractRequest {
    #[serde(default)]
    images: Vec<String>,
}

/// Extract from page images already encoded as data URLs.
async fn extract_images(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractionResult>, ApiError> {
    info!("Received extraction request with {} image(s)", request.images.len());
    let result = state.extractor.extract(&request.images).await?;
    Ok(Json(result))
}

/// Extract from uploaded image files, one multipart field per page.
async fn extract_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionResult>, ApiError> {
    let mut images = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("Multipart error: {}", e)))?
    {
        let mime = field
            .content_type()
            .filter(|ct| ct.starts_with("image/"))
            .unwrap_or("image/png")
            .to_string();
        let filename = field.file_name().unwrap_or("page").to_string();
        let data = field.bytes().await.map_err(|e| {
            ApiError::new(StatusCode::BAD_REQUEST, format!("Failed to read file: {}", e))
        })?;
        if data.is_empty() {
            warn!("Skipping empty upload field: {}", filename);
            continue;
        }
        info!("Received page: {} ({} bytes, {})", filename, data.len(), mime);
        images.push(image_data_url(&mime, &data));
    }

    let result = state.extractor.extract(&images).await?;
    Ok(Json(result))
}

// ============================================================================
// Companies
// ============================================================================

#[derive(Debug, Deserialize)]
struct MatchRequest {
    companies: Vec<Company>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    identifiers: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchResponse {
    #[serde(rename = "match")]
    matched: Option<Company>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestions: Option<Vec<Company>>,
}

async fn match_company(Json(request): Json<MatchRequest>) -> Json<MatchResponse> {
    let matched = best_match(&request.companies, &request.name, &request.identifiers).cloned();
    let suggestions = suggest_companies(&request.companies, &request.name, &request.identifiers)
        .into_iter()
        .cloned()
        .collect();
    info!(
        "Company match for '{}': {}",
        request.name,
        matched.as_ref().map(|c| c.id.as_str()).unwrap_or("none")
    );
    Json(MatchResponse {
        matched,
        suggestions: Some(suggestions),
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PartyInput {
    name: String,
    identifiers: String,
}

#[derive(Debug, Deserialize)]
struct TwoSidedMatchRequest {
    companies: Vec<Company>,
    #[serde(default)]
    first: PartyInput,
    #[serde(default)]
    second: PartyInput,
}

async fn match_company_two_sided(Json(request): Json<TwoSidedMatchRequest>) -> Json<MatchResponse> {
    let matched = best_match_two_sided(
        &request.companies,
        PartyRef::new(&request.first.name, &request.first.identifiers),
        PartyRef::new(&request.second.name, &request.second.identifiers),
    )
    .cloned();
    Json(MatchResponse {
        matched,
        suggestions: None,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FromDebtorRequest {
    debtor: Debtor,
    #[serde(default)]
    created_by: Option<String>,
}

async fn company_from_debtor(Json(request): Json<FromDebtorRequest>) -> Result<Json<Company>, ApiError> {
    Company::from_debtor(&request.debtor, request.created_by)
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, "Company name is required."))
}

// ============================================================================
// Cases
// ============================================================================

#[derive(Debug, Deserialize)]
struct CaseOverviewRequest {
    #[serde(default)]
    documents: Vec<InsolvencyDocument>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CaseOverview {
    stage: ProcedureStage,
    stage_label: String,
    deadlines: Vec<AggregatedDeadline>,
    next_hearing_iso: Option<String>,
}

async fn case_overview(Json(request): Json<CaseOverviewRequest>) -> Json<CaseOverview> {
    let stage = derive_case_stage(&request.documents);
    Json(CaseOverview {
        stage,
        stage_label: stage.label(),
        deadlines: aggregate_deadlines(&request.documents),
        next_hearing_iso: next_hearing_iso(&request.documents),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::VisionModel;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct CannedModel(&'static str);

    #[async_trait::async_trait]
    impl VisionModel for CannedModel {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _system_prompt: &str, _images: &[String]) -> Result<String, VisionError> {
            if self.0.is_empty() {
                Err(VisionError::EmptyResponse)
            } else {
                Ok(self.0.to_string())
            }
        }
    }

    fn app(reply: &'static str) -> Router {
        let extractor = Extractor::new(Arc::new(CannedModel(reply)), "system");
        router(AppState { extractor }, 1)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_extract_returns_normalized_record() {
        let (status, body) = post_json(
            app(r#"{"document":{"type":"notification_opening"}}"#),
            "/extract",
            json!({ "images": ["data:image/png;base64,AAAA"] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["document"]["docType"], "notification_opening");
        assert_eq!(body["case"]["court"]["name"], "Not found");
    }

    #[tokio::test]
    async fn test_extract_without_images_is_bad_request() {
        let (status, body) = post_json(app("{}"), "/extract", json!({ "images": [] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Request must include a non-empty 'images' array");
    }

    #[tokio::test]
    async fn test_empty_model_reply_is_bad_gateway() {
        let (status, _) = post_json(app(""), "/extract", json!({ "images": ["x"] })).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_unparseable_model_reply_is_server_error() {
        let (status, body) = post_json(app("not json"), "/extract", json!({ "images": ["x"] })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("invalid JSON"));
    }

    #[tokio::test]
    async fn test_match_endpoint() {
        let companies = json!([
            { "id": "alfa", "name": "Alfa Construct SRL", "nationalId": "12345678", "createdAt": "2025-01-10T09:30:00Z" },
            { "id": "beta", "name": "Beta Logistic SRL", "cuiRo": "87654321", "createdAt": "2025-01-11T09:30:00Z" }
        ]);
        let (status, body) = post_json(
            app("{}"),
            "/companies/match",
            json!({ "companies": companies, "name": "Beta Logistic", "identifiers": "RO 12345678" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["match"]["id"], "alfa");
        assert_eq!(body["suggestions"][0]["id"], "alfa");
        assert_eq!(body["suggestions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_two_sided_endpoint_without_match() {
        let (status, body) = post_json(
            app("{}"),
            "/companies/match/two-sided",
            json!({ "companies": [], "first": { "name": "Alfa" } }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["match"], Value::Null);
        assert!(body.get("suggestions").is_none());
    }

    #[tokio::test]
    async fn test_from_debtor_requires_name() {
        let (status, _) = post_json(
            app("{}"),
            "/companies/from-debtor",
            json!({ "debtor": { "cui": "RO1234" } }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, body) = post_json(
            app("{}"),
            "/companies/from-debtor",
            json!({ "debtor": { "name": "Gama SRL", "address": "Not found" }, "createdBy": "jon-doe" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Gama SRL");
        assert_eq!(body["address"], "");
        assert_eq!(body["createdBy"], "jon-doe");
    }

    #[tokio::test]
    async fn test_case_overview() {
        let documents = json!([
            { "id": "d1", "extraction": {
                "case": { "procedure": { "stage": "opened" } },
                "deadlines": [{ "type": "appeal", "date": { "text": "x", "iso": "2024-05-01" } }]
            } },
            { "id": "d2", "extraction": {
                "case": { "procedure": { "stage": "claims_window" } },
                "deadlines": [{ "type": "next_hearing", "date": { "text": "y", "iso": "2024-03-01" } }]
            } }
        ]);
        let (status, body) =
            post_json(app("{}"), "/cases/overview", json!({ "documents": documents })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "claims_window");
        assert_eq!(body["stageLabel"], "Claims Window");
        assert_eq!(body["deadlines"][0]["type"], "next_hearing");
        assert_eq!(body["deadlines"][0]["sourceDocId"], "d2");
        assert_eq!(body["nextHearingIso"], "2024-03-01");
    }
}
