//! # API REST
//!
//! Single-shot assessment API.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS)
//!
//! Uses `api-shared` for common types and utilities.

#![warn(rust_2018_idioms)]

use agent_core::{AgentPipeline, ModelClient};
use agent_types::PatientId;
use api_shared::{
    ApiError, AssessmentReq, AssessmentRes, ErrorBody, ErrorDetail, HealthRes, HealthService,
    ServiceInfoRes, SourcesRes,
};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use fhir::RecordSource;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Name reported by `/` and `/health`.
pub const SERVICE_NAME: &str = "Agents REST API";

/// Application state for the REST API server
///
/// Holds the pipeline shared by every request. Cloning is cheap: the pipeline only holds
/// `Arc`s.
pub struct AppState<R, M> {
    pipeline: AgentPipeline<R, M>,
}

impl<R, M> Clone for AppState<R, M> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(service_info, health, comprehensive_assessment),
    components(schemas(
        ServiceInfoRes,
        HealthRes,
        AssessmentReq,
        AssessmentRes,
        SourcesRes,
        ErrorBody,
        ErrorDetail,
    ))
)]
pub struct ApiDoc;

/// Build the REST router around `pipeline`.
///
/// # Arguments
/// * `pipeline` - Pipeline used for every assessment request
///
/// # Returns
/// A router serving `/`, `/health`, `POST /assessment/comprehensive` and the Swagger UI.
pub fn router<R, M>(pipeline: AgentPipeline<R, M>) -> Router
where
    R: RecordSource + 'static,
    M: ModelClient + 'static,
{
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route(
            "/assessment/comprehensive",
            post(comprehensive_assessment::<R, M>),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { pipeline })
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service identity", body = ServiceInfoRes)
    )
)]
/// Service identity endpoint
#[axum::debug_handler]
async fn service_info() -> Json<ServiceInfoRes> {
    Json(HealthService::service_info(SERVICE_NAME))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks. Reports healthy even without a
/// model credential.
#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health(SERVICE_NAME))
}

#[utoipa::path(
    post,
    path = "/assessment/comprehensive",
    request_body = AssessmentReq,
    responses(
        (status = 200, description = "Normalised clinician and pharmacist assessment", body = AssessmentRes),
        (status = 400, description = "Invalid patient identifier", body = ErrorBody),
        (status = 404, description = "Patient not found", body = ErrorBody),
        (status = 500, description = "Model credential not configured", body = ErrorBody),
        (status = 502, description = "Record retrieval or model failure", body = ErrorBody)
    )
)]
/// Run both agent turns for one patient and return the normalised result
///
/// # Arguments
/// * `req` - Request body naming the patient
///
/// # Returns
/// * `Ok(Json<AssessmentRes>)` - Summary, per-role texts and source entry counts
/// * `Err(ApiError)` - Structured error body
///
/// # Errors
/// Returns:
/// - `400 Bad Request` if the identifier is not a valid FHIR id,
/// - `404 Not Found` if the patient does not exist,
/// - `500 Internal Server Error` if no model credential is configured,
/// - `502 Bad Gateway` if record retrieval or the model fails.
async fn comprehensive_assessment<R, M>(
    State(state): State<AppState<R, M>>,
    Json(req): Json<AssessmentReq>,
) -> Result<Json<AssessmentRes>, ApiError>
where
    R: RecordSource + 'static,
    M: ModelClient + 'static,
{
    let patient_id = PatientId::new(&req.patient_id)?;
    let assessment = state.pipeline.assess(&patient_id).await?;
    Ok(Json(AssessmentRes::new(assessment, chrono::Utc::now())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{AgentConfig, ScriptedModel};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use fhir::{ClinicalRecordSet, FetchOutcome, StaticRecords};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn records() -> ClinicalRecordSet {
        ClinicalRecordSet::new(
            json!({"resourceType": "Patient", "id": "52664210", "gender": "female"}),
            json!({"resourceType": "Bundle", "entry": [
                {"resource": {"code": {"text": "Hypertension"}}},
                {"resource": {"code": {"text": "Asthma"}}}
            ]}),
            json!({"resourceType": "Bundle", "entry": [
                {"resource": {"medicationCodeableConcept": {"text": "Salbutamol"}}}
            ]}),
        )
    }

    fn config(api_key: Option<&'static str>) -> Arc<AgentConfig> {
        Arc::new(
            AgentConfig::from_lookup(move |key| match key {
                "OPENAI_API_KEY" => api_key.map(str::to_string),
                _ => None,
            })
            .expect("config"),
        )
    }

    fn app(outcome: FetchOutcome, api_key: Option<&'static str>) -> (Router, Arc<StaticRecords>) {
        let records = Arc::new(StaticRecords::new(outcome));
        let model = Arc::new(
            ScriptedModel::new(["**Stable** asthma."], ["No *interactions*."]).with_name("gpt-4o"),
        );
        let pipeline = AgentPipeline::new(Arc::clone(&records), model, config(api_key));
        (router(pipeline), records)
    }

    async fn post_assessment(app: Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/assessment/comprehensive")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).expect("request");
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[tokio::test]
    async fn root_and_health_respond() {
        let (app, _) = app(FetchOutcome::NotFound, None);
        let (status, body) = get_json(app.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], SERVICE_NAME);
        assert_eq!(body["status"], "running");

        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn assessment_returns_summary_and_sources() {
        let (app, _) = app(FetchOutcome::Found(records()), Some("sk-test"));
        let (status, body) = post_assessment(app, json!({"patient_id": "52664210"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["patient_id"], "52664210");
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["summary"], "Stable asthma.\n\nNo interactions.");
        assert_eq!(body["clinician"], "Stable asthma.");
        assert_eq!(body["pharmacist"], "No interactions.");
        assert_eq!(body["sources"], json!({"conditions": 2, "medications": 1}));
        assert!(body["generated_at"].is_string());
    }

    #[tokio::test]
    async fn unexpected_source_shape_reports_null_count() {
        let odd = ClinicalRecordSet::new(
            json!({"resourceType": "Patient", "id": "1"}),
            json!({"resourceType": "Bundle", "entry": []}),
            json!({"resourceType": "OperationOutcome"}),
        );
        let (app, _) = app(FetchOutcome::Found(odd), Some("sk-test"));
        let (status, body) = post_assessment(app, json!({"patient_id": "1"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sources"], json!({"conditions": 0, "medications": null}));
    }

    #[tokio::test]
    async fn unknown_patient_is_404_without_summary() {
        let (app, _) = app(FetchOutcome::NotFound, Some("sk-test"));
        let (status, body) = post_assessment(app, json!({"patient_id": "does-not-exist"})).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(body.get("summary").is_none());
    }

    #[tokio::test]
    async fn transport_failure_is_502() {
        let (app, _) = app(FetchOutcome::TransportFailure("timed out".into()), Some("sk-test"));
        let (status, body) = post_assessment(app, json!({"patient_id": "52664210"})).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "TRANSPORT_FAILURE");
    }

    #[tokio::test]
    async fn invalid_identifier_is_rejected_before_retrieval() {
        let (app, records) = app(FetchOutcome::Found(records()), Some("sk-test"));
        let (status, body) = post_assessment(app, json!({"patient_id": "../Patient/1"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert_eq!(records.calls(), 0);
    }

    #[tokio::test]
    async fn missing_credential_is_a_configuration_error() {
        let (app, records) = app(FetchOutcome::Found(records()), None);
        let (status, body) = post_assessment(app, json!({"patient_id": "52664210"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "CONFIGURATION_ERROR");
        assert_eq!(records.calls(), 0);
    }

    #[tokio::test]
    async fn serves_openapi_document() {
        let (app, _) = app(FetchOutcome::NotFound, None);
        let (status, body) = get_json(app, "/api-docs/openapi.json").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/assessment/comprehensive").is_some());
    }
}
