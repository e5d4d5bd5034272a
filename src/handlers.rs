use crate::config::Config;
use crate::errors::AppError;
use crate::fiscal_code;
use crate::models::*;
use crate::reformat;
use crate::resolver::{LinkageResolver, SearchMode};
use crate::search_client::SearchIndexClient;
use crate::services::RecordStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Client for the hosted search-index service.
    pub search: SearchIndexClient,
}

impl AppState {
    fn resolver(&self) -> LinkageResolver<RecordStore> {
        LinkageResolver::new(RecordStore::new(self.db.clone()))
    }
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-fiscal-api",
            "version": "0.1.0"
        })),
    )
}

/// GET /api/v1/entities/search
///
/// Free-text entity search against the search index with typed filters,
/// pagination and sorting. An empty query with no filters matches everything
/// (the index treats `*` as match-all).
pub async fn search_entities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EntitySearchParams>,
) -> Result<Json<SearchPage<Subject>>, AppError> {
    tracing::info!("GET /entities/search - q: {:?}", params.q);

    let options = SubjectSearchOptions {
        query: params.q.clone().unwrap_or_else(|| "*".to_string()),
        filters: params.filters(),
        page: params.page.unwrap_or(1).max(1),
        per_page: params.per_page.unwrap_or(20).clamp(1, 100),
        sort_by: params.sort_by.clone(),
    };

    let mut page = state.search.search_subjects(&options).await?;
    page.results = page
        .results
        .into_iter()
        .map(reformat::subject_for_display)
        .collect();

    Ok(Json(page))
}

/// GET /api/v1/entities/autocomplete
///
/// Search-as-you-type suggestions. Failures inside the client degrade to an
/// empty list so the input stays responsive.
pub async fn autocomplete(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AutocompleteParams>,
) -> Result<Json<Vec<AutocompleteItem>>, AppError> {
    let limit = params.limit.unwrap_or(10).clamp(1, 50);
    let items = state.search.autocomplete(&params.q, limit).await?;
    Ok(Json(items))
}

/// GET /api/v1/entities/loan-parties
///
/// All subjects attached to one loan in a given borrower role; used for the
/// guarantor/joint/heir cards on the entity detail view.
pub async fn loan_parties(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LoanPartyQuery>,
) -> Result<Json<SearchPage<Subject>>, AppError> {
    tracing::info!(
        "GET /entities/loan-parties - record_id: {} role: {}",
        params.record_id,
        params.borrower_type_id
    );

    let mut page = state.search.subjects_by_loan_key(&params).await?;
    page.results = page
        .results
        .into_iter()
        .map(reformat::subject_for_display)
        .collect();

    Ok(Json(page))
}

/// GET /api/v1/fiscal-code/:code/validate
///
/// Structural validation of a fiscal code, without touching any backend.
pub async fn validate_code(Path(code): Path<String>) -> Json<ValidationOutcome> {
    let outcome = match fiscal_code::validate(&code) {
        Ok(canonical) => ValidationOutcome {
            is_valid: true,
            error: None,
            display: Some(fiscal_code::format(&canonical)),
            formatted: Some(canonical),
        },
        Err(e) => ValidationOutcome {
            is_valid: false,
            error: Some(e.to_string()),
            formatted: None,
            display: None,
        },
    };
    Json(outcome)
}

/// GET /api/v1/fiscal-code/:code
///
/// The full result bundle for a fiscal code: matching subjects plus every
/// related-record category, deduplicated. `?partial=true` switches the
/// primary lookup to a substring match for incomplete codes.
pub async fn get_bundle(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(params): Query<BundleParams>,
) -> Result<Json<ResultBundle>, AppError> {
    let mode = if params.partial.unwrap_or(false) {
        SearchMode::Partial
    } else {
        SearchMode::Strict
    };
    tracing::info!("GET /fiscal-code/{} - mode: {:?}", code, mode);

    let mut bundle = state.resolver().resolve_bundle(&code, mode).await?;
    bundle.subjects = bundle
        .subjects
        .into_iter()
        .map(reformat::subject_for_display)
        .collect();
    bundle.joints = bundle
        .joints
        .into_iter()
        .map(reformat::subject_for_display)
        .collect();

    tracing::info!(
        "Bundle for {}: {} subject(s), {} guarantor(s), {} contact(s)",
        bundle.query,
        bundle.subjects.len(),
        bundle.summary.guarantors_count,
        bundle.summary.contacts_count
    );

    Ok(Json(bundle))
}

/// GET /api/v1/fiscal-code/:code/records
///
/// The related records of a bundle as one flat, category-tagged list.
pub async fn get_related_records(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Vec<RelatedRecord>>, AppError> {
    let bundle = state
        .resolver()
        .resolve_bundle(&code, SearchMode::Strict)
        .await?;
    Ok(Json(bundle.related_records()))
}

/// GET /api/v1/fiscal-code/:code/summary
///
/// Per-category counts, used by the display layer to decide which tabs to
/// enable. A count failure for one category degrades to zero instead of
/// failing the summary.
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<CategorySummary>, AppError> {
    tracing::info!("GET /fiscal-code/{}/summary", code);

    let summary = state.resolver().category_summary(&code).await?;
    Ok(Json(summary))
}
