use crate::config::Config;
use crate::errors::AppError;
use crate::models::{
    AutocompleteItem, FacetCount, LoanPartyQuery, SearchFilters, SearchPage, Subject,
    SubjectSearchOptions,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Name of the entity collection in the search index.
const ENTITIES_COLLECTION: &str = "entities";

/// Minimum query length before autocomplete issues a request.
const AUTOCOMPLETE_MIN_LEN: usize = 2;

/// Raw search response from the index service.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct SearchResponse<T> {
    #[serde(default)]
    found: i64,
    #[serde(default)]
    hits: Vec<SearchHit<T>>,
    #[serde(default)]
    facet_counts: Vec<FacetCount>,
}

#[derive(Debug, Deserialize)]
struct SearchHit<T> {
    document: T,
}

/// Client for the hosted search-index service.
///
/// The index exposes per-collection document search: free-text query over
/// named fields, an ANDed `field:=value` filter expression, pagination and
/// sorting. Authentication is a static API key sent as a request header.
#[derive(Clone)]
pub struct SearchIndexClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Builds the `field:=value && ...` filter expression from typed filters.
pub fn build_filter_string(filters: &SearchFilters) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(is_company) = filters.is_company {
        parts.push(format!("is_company:={}", is_company));
    }
    if let Some(ref gender) = filters.gender {
        parts.push(format!("gender:={}", gender));
    }
    if let Some(is_deceased) = filters.is_deceased {
        parts.push(format!("is_deceased:={}", is_deceased));
    }
    if let Some(ref source_system) = filters.source_system {
        parts.push(format!("source_system:={}", source_system));
    }
    if let Some(borrower_type_id) = filters.borrower_type_id {
        parts.push(format!("borrower_type_id:={}", borrower_type_id));
    }
    if let Some(ref country) = filters.country_of_birth {
        parts.push(format!("country_of_birth:={}", country));
    }
    if let Some(ref region) = filters.region_of_birth {
        parts.push(format!("region_of_birth:={}", region));
    }
    if let Some(ref province) = filters.province_of_birth {
        parts.push(format!("province_of_birth:={}", province));
    }

    parts.join(" && ")
}

impl SearchIndexClient {
    /// Creates a new `SearchIndexClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the search-index service.
    /// * `api_key` - The API key for authentication.
    pub fn new(base_url: String, api_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::SearchIndexError(format!("Failed to create search client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.search_base_url.clone(),
            config.search_api_key.clone(),
        )
    }

    /// Performs one document search against a collection.
    ///
    /// Parameters are encoded via `Url::parse_with_params`; the API key is
    /// never part of the URL so it cannot leak into logs.
    async fn search_collection<T: DeserializeOwned>(
        &self,
        collection: &str,
        params: &[(&str, String)],
    ) -> Result<SearchResponse<T>, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!(
                "{}/collections/{}/documents/search",
                self.base_url, collection
            ),
            params,
        )
        .map_err(|e| AppError::SearchIndexError(format!("Failed to build URL: {}", e)))?;

        let response = self
            .client
            .get(url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::SearchIndexError(format!("Search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::SearchIndexError(format!(
                "Search index returned {}: {}",
                status, error_text
            )));
        }

        let result = response.json().await.map_err(|e| {
            AppError::SearchIndexError(format!("Failed to parse search response: {}", e))
        })?;

        Ok(result)
    }

    /// Free-text subject search with typed filters, pagination and sorting.
    pub async fn search_subjects(
        &self,
        options: &SubjectSearchOptions,
    ) -> Result<SearchPage<Subject>, AppError> {
        let per_page = options.per_page.max(1);
        let query = if options.query.is_empty() {
            "*".to_string()
        } else {
            options.query.clone()
        };

        let mut params: Vec<(&str, String)> = vec![
            ("q", query),
            ("query_by", "name,fiscal_code,entity_id".to_string()),
            ("page", options.page.to_string()),
            ("per_page", per_page.to_string()),
            (
                "sort_by",
                options
                    .sort_by
                    .clone()
                    .unwrap_or_else(|| "borrower_id:desc".to_string()),
            ),
        ];

        let filter_string = build_filter_string(&options.filters);
        if !filter_string.is_empty() {
            params.push(("filter_by", filter_string));
        }

        tracing::debug!(
            "Subject search: q={:?} page={} per_page={}",
            options.query,
            options.page,
            per_page
        );

        let response: SearchResponse<Subject> =
            self.search_collection(ENTITIES_COLLECTION, &params).await?;

        Ok(Self::into_page(response, options.page, per_page))
    }

    /// Search-as-you-type suggestions.
    ///
    /// Short queries short-circuit to an empty list without touching the
    /// index, and request failures degrade to an empty list so the input box
    /// stays responsive.
    pub async fn autocomplete(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<AutocompleteItem>, AppError> {
        if query.len() < AUTOCOMPLETE_MIN_LEN {
            return Ok(Vec::new());
        }

        let params: Vec<(&str, String)> = vec![
            ("q", query.to_string()),
            ("query_by", "name,fiscal_code".to_string()),
            ("per_page", limit.to_string()),
            ("include_fields", "entity_id,name,fiscal_code".to_string()),
        ];

        match self
            .search_collection::<AutocompleteItem>(ENTITIES_COLLECTION, &params)
            .await
        {
            Ok(response) => Ok(response.hits.into_iter().map(|h| h.document).collect()),
            Err(e) => {
                tracing::warn!("Autocomplete degraded to empty result: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// All subjects attached to one loan in a given borrower role.
    ///
    /// Used by the display layer for guarantor/joint/heir cards on the
    /// entity detail view.
    pub async fn subjects_by_loan_key(
        &self,
        query: &LoanPartyQuery,
    ) -> Result<SearchPage<Subject>, AppError> {
        let page = query.page.unwrap_or(1);
        let per_page = query.per_page.unwrap_or(20).max(1);

        let params: Vec<(&str, String)> = vec![
            ("q", "*".to_string()),
            ("query_by", "name".to_string()),
            (
                "filter_by",
                format!(
                    "source_system:={} && record_id:={} && borrower_type_id:={}",
                    query.source_system, query.record_id, query.borrower_type_id
                ),
            ),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
            (
                "sort_by",
                query
                    .sort_by
                    .clone()
                    .unwrap_or_else(|| "borrower_id:desc".to_string()),
            ),
        ];

        let response: SearchResponse<Subject> =
            self.search_collection(ENTITIES_COLLECTION, &params).await?;

        Ok(Self::into_page(response, page, per_page))
    }

    /// Startup connectivity probe.
    pub async fn health(&self) -> Result<bool, AppError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| AppError::SearchIndexError(format!("Health check failed: {}", e)))?;

        Ok(response.status().is_success())
    }

    fn into_page(
        response: SearchResponse<Subject>,
        page: u32,
        per_page: u32,
    ) -> SearchPage<Subject> {
        let results: Vec<Subject> = response.hits.into_iter().map(|h| h.document).collect();
        let total_pages = ((response.found.max(0) as u64 + per_page as u64 - 1)
            / per_page as u64) as u32;

        SearchPage {
            results,
            found: response.found,
            page,
            total_pages,
            facets: response.facet_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = SearchIndexClient::new(
            "https://example.com".to_string(),
            "test-key".to_string(),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_empty_filters_build_empty_string() {
        assert_eq!(build_filter_string(&SearchFilters::default()), "");
    }
}
