/// Integration tests with a mocked search-index service
/// Tests query construction, response decoding and failure behavior without
/// hitting a real index
use rust_fiscal_api::config::Config;
use rust_fiscal_api::errors::AppError;
use rust_fiscal_api::models::{
    LoanPartyQuery, SearchFilters, SubjectSearchOptions,
};
use rust_fiscal_api::search_client::{build_filter_string, SearchIndexClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper function to create test config
fn create_test_config(search_base_url: String) -> Config {
    Config {
        database_url: "postgresql://test".to_string(),
        port: 8080,
        search_base_url,
        search_api_key: "test_key".to_string(),
    }
}

/// A complete entity document as the index returns it
fn subject_doc(fiscal_code: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "entity_id": format!("ent-{}", fiscal_code),
        "name": name,
        "fiscal_code": fiscal_code,
        "record_id": "L42",
        "borrower_id": 1001,
        "borrower_type_id": 1,
        "is_company": false,
        "is_deceased": false,
        "gender": "M",
        "date_of_birth": "1985-06-15",
        "country_of_birth": "Italia",
        "region_of_birth": "Lazio",
        "province_of_birth": "RM",
        "city_of_birth": "Roma",
        "source_system": "legacy_npl",
        "created_date": "2024-01-10T08:30:00Z",
        "modified_date": "2024-02-05T12:00:00Z",
        "extracted_date": "2024-03-01T06:15:00Z"
    })
}

#[tokio::test]
async fn test_subject_search_success() {
    let mock_server = MockServer::start().await;

    let mock_response = serde_json::json!({
        "found": 2,
        "hits": [
            { "document": subject_doc("RSSMRA85H15F205X", "Mario Rossi") },
            { "document": subject_doc("BNCGNN60B12F205K", "Gianni Bianchi") }
        ],
        "facet_counts": [
            {
                "field_name": "source_system",
                "counts": [ { "value": "legacy_npl", "count": 2 } ]
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/collections/entities/documents/search"))
        .and(query_param("q", "rossi"))
        .and(query_param("sort_by", "borrower_id:desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&mock_response))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let client = SearchIndexClient::from_config(&config).unwrap();

    let options = SubjectSearchOptions {
        query: "rossi".to_string(),
        per_page: 20,
        ..Default::default()
    };
    let page = client.search_subjects(&options).await.unwrap();

    assert_eq!(page.found, 2);
    assert_eq!(page.results.len(), 2);
    assert_eq!(page.results[0].fiscal_code, "RSSMRA85H15F205X");
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.facets.len(), 1);
    assert_eq!(page.facets[0].counts[0].count, 2);
}

#[tokio::test]
async fn test_search_sends_filter_expression() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections/entities/documents/search"))
        .and(query_param(
            "filter_by",
            "is_company:=false && source_system:=legacy_npl",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "found": 0,
            "hits": [],
            "facet_counts": []
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let client = SearchIndexClient::from_config(&config).unwrap();

    let options = SubjectSearchOptions {
        query: "*".to_string(),
        filters: SearchFilters {
            is_company: Some(false),
            source_system: Some("legacy_npl".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let page = client.search_subjects(&options).await.unwrap();

    assert_eq!(page.found, 0);
    assert!(page.results.is_empty());
}

#[tokio::test]
async fn test_empty_query_falls_back_to_match_all() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections/entities/documents/search"))
        .and(query_param("q", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "found": 0,
            "hits": [],
            "facet_counts": []
        })))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let client = SearchIndexClient::from_config(&config).unwrap();

    let options = SubjectSearchOptions {
        query: String::new(),
        ..Default::default()
    };
    assert!(client.search_subjects(&options).await.is_ok());
}

#[tokio::test]
async fn test_search_error_maps_to_search_index_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections/entities/documents/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("index unavailable"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let client = SearchIndexClient::from_config(&config).unwrap();

    let result = client
        .search_subjects(&SubjectSearchOptions::default())
        .await;

    match result {
        Err(AppError::SearchIndexError(msg)) => {
            assert!(msg.contains("503"));
            assert!(msg.contains("index unavailable"));
        }
        other => panic!("Expected SearchIndexError, got {:?}", other.map(|p| p.found)),
    }
}

#[tokio::test]
async fn test_autocomplete_short_query_issues_no_request() {
    let mock_server = MockServer::start().await;

    // Any request to the mock would be a failure of the short-circuit
    Mock::given(method("GET"))
        .and(path("/collections/entities/documents/search"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let client = SearchIndexClient::from_config(&config).unwrap();

    let items = client.autocomplete("A", 10).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_autocomplete_success() {
    let mock_server = MockServer::start().await;

    let mock_response = serde_json::json!({
        "found": 1,
        "hits": [
            {
                "document": {
                    "entity_id": "ent-1",
                    "name": "Mario Rossi",
                    "fiscal_code": "RSSMRA85H15F205X"
                }
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/collections/entities/documents/search"))
        .and(query_param("q", "ros"))
        .and(query_param("include_fields", "entity_id,name,fiscal_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&mock_response))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let client = SearchIndexClient::from_config(&config).unwrap();

    let items = client.autocomplete("ros", 10).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Mario Rossi");
    assert_eq!(items[0].fiscal_code.as_deref(), Some("RSSMRA85H15F205X"));
}

#[tokio::test]
async fn test_autocomplete_error_degrades_to_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/collections/entities/documents/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let client = SearchIndexClient::from_config(&config).unwrap();

    let items = client.autocomplete("rossi", 10).await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_loan_party_search_builds_role_filter() {
    let mock_server = MockServer::start().await;

    let mock_response = serde_json::json!({
        "found": 1,
        "hits": [ { "document": subject_doc("GRNLGU70A01H501Z", "Luigi Verdi") } ],
        "facet_counts": []
    });

    Mock::given(method("GET"))
        .and(path("/collections/entities/documents/search"))
        .and(query_param(
            "filter_by",
            "source_system:=legacy_npl && record_id:=L42 && borrower_type_id:=5",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(&mock_response))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let client = SearchIndexClient::from_config(&config).unwrap();

    let query = LoanPartyQuery {
        source_system: "legacy_npl".to_string(),
        record_id: "L42".to_string(),
        borrower_type_id: 5,
        page: None,
        per_page: None,
        sort_by: None,
    };
    let page = client.subjects_by_loan_key(&query).await.unwrap();

    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].fiscal_code, "GRNLGU70A01H501Z");
}

#[tokio::test]
async fn test_health_probe() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let config = create_test_config(mock_server.uri());
    let client = SearchIndexClient::from_config(&config).unwrap();

    assert!(client.health().await.unwrap());
}

#[cfg(test)]
mod filter_string_tests {
    use super::*;

    #[test]
    fn test_filter_parts_are_anded_in_field_order() {
        let filters = SearchFilters {
            is_company: Some(true),
            gender: Some("F".to_string()),
            is_deceased: Some(false),
            borrower_type_id: Some(2),
            ..Default::default()
        };

        assert_eq!(
            build_filter_string(&filters),
            "is_company:=true && gender:=F && is_deceased:=false && borrower_type_id:=2"
        );
    }

    #[test]
    fn test_birth_place_filters() {
        let filters = SearchFilters {
            country_of_birth: Some("Italia".to_string()),
            province_of_birth: Some("RM".to_string()),
            ..Default::default()
        };

        assert_eq!(
            build_filter_string(&filters),
            "country_of_birth:=Italia && province_of_birth:=RM"
        );
    }

    #[test]
    fn test_no_filters_no_expression() {
        assert_eq!(build_filter_string(&SearchFilters::default()), "");
    }
}
