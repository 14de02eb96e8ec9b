// crates/client/tests/http.rs
//! `HttpJobsApi` against a mockito server.

use std::time::Duration;

use bulkadd_client::{ClientConfig, HttpJobsApi};
use bulkadd_core::{ApiError, JobsApi};
use bulkadd_types::{Collection, JobState, JobStatus, SubmissionRequest, SubmitOutcome};
use mockito::Matcher;
use pretty_assertions::assert_eq;

fn api(server: &mockito::ServerGuard) -> HttpJobsApi {
    HttpJobsApi::new(ClientConfig::new(server.url())).unwrap()
}

#[tokio::test]
async fn test_submit_selected_returns_job() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/collections/abc/companies")
        .match_body(Matcher::Json(serde_json::json!({ "company_ids": [1, 2, 3] })))
        .with_header("content-type", "application/json")
        .with_body(r#"{"bulk_add_job_id": 42}"#)
        .create_async()
        .await;

    let outcome = api(&server)
        .submit_bulk_add(&SubmissionRequest::selected("abc", [3, 2, 1]))
        .await
        .unwrap();

    assert_eq!(outcome, SubmitOutcome::Queued(42));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_submit_whole_collection_null_is_synchronous() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/collections/abc/companies")
        .match_body(Matcher::Json(serde_json::json!({ "source_collection_id": "src" })))
        .with_body(r#"{"bulk_add_job_id": null}"#)
        .create_async()
        .await;

    let outcome = api(&server)
        .submit_bulk_add(&SubmissionRequest::whole_collection("abc", "src"))
        .await
        .unwrap();

    assert_eq!(outcome, SubmitOutcome::Synchronous);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_job_status_parses_server_spelling() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/bulk_add_jobs/7")
        .with_body(r#"{"id": 7, "status": "cancelled", "added": 3, "total": 10}"#)
        .create_async()
        .await;

    let status = api(&server).get_job_status(7).await.unwrap();
    assert_eq!(status, JobStatus::new(JobState::Canceled, 3, 10));
}

#[tokio::test]
async fn test_status_for_another_job_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/bulk_add_jobs/7")
        .with_body(r#"{"id": 8, "status": "completed", "added": 10, "total": 10}"#)
        .create_async()
        .await;

    let err = api(&server).get_job_status(7).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(ref m) if m.contains("job 8")), "{err:?}");
}

#[tokio::test]
async fn test_missing_job_maps_to_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/bulk_add_jobs/99")
        .with_status(404)
        .with_body(r#"{"detail": "Job not found"}"#)
        .create_async()
        .await;

    let err = api(&server).get_job_status(99).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref d) if d == "Job not found"), "{err:?}");
}

#[tokio::test]
async fn test_cancel_rejected_when_not_in_progress() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/bulk_add_jobs/5/cancel")
        .with_status(400)
        .with_body(r#"{"detail": "Job cannot be cancelled"}"#)
        .create_async()
        .await;

    let err = api(&server).cancel_job(5).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected(_)));
    assert_eq!(err.to_string(), "Request rejected: Job cannot be cancelled");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_server_error_without_json_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/bulk_add_jobs/1")
        .with_status(502)
        .create_async()
        .await;

    let err = api(&server).get_job_status(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 502, ref detail } if detail == "Bad Gateway"));
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/bulk_add_jobs/1")
        .with_body(r#"{"status": 3}"#)
        .create_async()
        .await;

    let err = api(&server).get_job_status(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn test_list_collections_and_page() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/collections")
        .with_body(r#"[{"id": "a", "collection_name": "My List"}, {"id": "b", "collection_name": "Liked Companies"}]"#)
        .create_async()
        .await;
    server
        .mock("GET", "/collections/a")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("offset".into(), "10".into()),
            Matcher::UrlEncoded("limit".into(), "2".into()),
        ]))
        .with_body(
            r#"{"id": "a", "collection_name": "My List", "total": 12,
                "companies": [{"id": 11, "company_name": "Acme", "liked": true},
                              {"id": 12, "company_name": "Globex", "liked": false}]}"#,
        )
        .create_async()
        .await;

    let api = api(&server);
    let collections = api.list_collections().await.unwrap();
    assert_eq!(
        collections,
        vec![
            Collection { id: "a".into(), collection_name: "My List".into() },
            Collection { id: "b".into(), collection_name: "Liked Companies".into() },
        ]
    );

    let page = api.list_collection_items(&"a".into(), 10, 2).await.unwrap();
    assert_eq!(page.total, 12);
    assert_eq!(page.collection.collection_name, "My List");
    assert_eq!(page.companies.len(), 2);
    assert!(page.companies[0].liked);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let config = ClientConfig::new("http://127.0.0.1:1").with_request_timeout(Duration::from_secs(2));
    let err = HttpJobsApi::new(config).unwrap().get_job_status(1).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout(_)), "{err:?}");
}
