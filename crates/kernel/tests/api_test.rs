#![allow(clippy::unwrap_used, clippy::expect_used)]
//! HTTP tests for the query, field catalog and health endpoints.
//!
//! The router is the one the binary serves; only the store is in memory.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use sift_kernel::query::MemoryStore;
use sift_test_utils::{assert, test_session};

mod common;
use common::{TestApp, numbered_questions, question_bank, question_numbers};

fn app() -> TestApp {
    TestApp::new(MemoryStore::new().with_rows("questions", question_bank()))
}

#[tokio::test]
async fn health_reports_store_status() {
    let (status, body) = app().get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["postgres"], true);
}

#[tokio::test]
async fn query_wraps_slice_in_envelope() {
    let (status, body) = app()
        .post_json(
            "/api/questions/query",
            &json!({
                "where": {
                    "operator": "AND",
                    "children": [
                        {"condition": {"field": "exam", "op": "EQUALS", "values": ["neet"]}},
                        {"condition": {"field": "year", "op": "YEAR_BETWEEN", "values": ["2020", "2022"]}}
                    ]
                },
                "sorts": [{"field": "questionNumber", "ascending": true}],
                "page": 0,
                "size": 10
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Success");
    assert_eq!(question_numbers(&body), vec![3, 4]);
    assert_eq!(body["data"]["hasNext"], false);
    assert_eq!(body["data"]["page"], 0);
    assert_eq!(body["data"]["size"], 10);
}

#[tokio::test]
async fn query_pages_with_has_next() {
    let app = TestApp::new(MemoryStore::new().with_rows("questions", numbered_questions(25)));
    let request = |page: i64| {
        json!({
            "sorts": [{"field": "questionNumber", "ascending": true}],
            "page": page,
            "size": 10
        })
    };

    let (_, first) = app.post_json("/api/questions/query", &request(0)).await;
    assert_eq!(question_numbers(&first).len(), 10);
    assert_eq!(first["data"]["hasNext"], true);

    let (_, last) = app.post_json("/api/questions/query", &request(2)).await;
    assert_eq!(question_numbers(&last), (21..=25).collect::<Vec<_>>());
    assert_eq!(last["data"]["hasNext"], false);
}

#[tokio::test]
async fn empty_body_object_returns_first_page() {
    let (status, body) = app().post_json("/api/questions/query", &json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 6);
    assert_eq!(body["data"]["size"], 20);
}

#[tokio::test]
async fn unknown_sort_is_bad_request_and_skips_store() {
    let app = app();
    let (status, body) = app
        .post_json(
            "/api/questions/query",
            &json!({"sorts": [{"field": "nope", "ascending": true}]}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"].is_null());
    assert::contains(body["message"].as_str().unwrap(), "unknown sort field: nope");
    assert_eq!(app.store.fetch_count(), 0);
}

#[tokio::test]
async fn insufficient_values_is_bad_request() {
    let (status, body) = app()
        .post_json(
            "/api/questions/query",
            &json!({"where": {"condition": {"field": "year", "op": "YEAR_BETWEEN", "values": ["2020"]}}}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert::contains(body["message"].as_str().unwrap(), "YEAR_BETWEEN");
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (status, body) = app()
        .request(
            Request::post("/api/questions/query")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"where\": "))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn unknown_operation_is_bad_request() {
    let (status, _) = app()
        .post_json(
            "/api/questions/query",
            &json!({"where": {"condition": {"field": "topic", "op": "LIKE", "values": ["x"]}}}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn undecodable_rows_are_internal_errors_without_detail() {
    let app = TestApp::new(MemoryStore::new().with_rows(
        "questions",
        [sift_test_utils::test_question("ASTRONOMY", "NEET").build()],
    ));

    let (status, body) = app.post_json("/api/questions/query", &json!({})).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "internal server error");
}

#[tokio::test]
async fn fields_lists_filterable_definitions() {
    let (status, body) = app().get("/api/questions/fields").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Success");

    let fields = body["data"].as_array().unwrap();
    let exam = fields.iter().find(|f| f["name"] == "examType").unwrap();
    assert_eq!(exam["displayName"], "Exam Type");
    assert_eq!(exam["entityPath"], "exam_type");
    assert_eq!(exam["valueSourceType"], "ENUM");
    assert::strings_eq(&exam["synonyms"], &["exam"]);
    assert!(fields.iter().all(|f| f["filterable"] == true));
    assert!(!fields.iter().any(|f| f["name"] == "questionText"));
}

#[tokio::test]
async fn field_values_resolve_synonyms() {
    let app = app();

    let (status, body) = app.get("/api/questions/fields/EXAM/values").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "examType");
    assert::strings_eq(&body["data"]["values"], &["JEE_ADVANCED", "JEE_MAIN", "NEET"]);

    let (_, body) = app.get("/api/questions/fields/year/values").await;
    assert::strings_eq(
        &body["data"]["values"],
        &["2019", "2020", "2021", "2022", "2023"],
    );

    let (status, body) = app.get("/api/questions/fields/nope/values").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "nope");
    assert::strings_eq(&body["data"]["values"], &[]);
}

#[tokio::test]
async fn sessions_are_served_from_their_own_table() {
    let store = MemoryStore::new()
        .with_rows("questions", question_bank())
        .with_rows(
            "sessions",
            [
                test_session("u1", "COMPLETED").build(),
                test_session("u2", "ABANDONED").build(),
            ],
        );
    let app = TestApp::new(store);

    let (status, body) = app
        .post_json(
            "/api/sessions/query",
            &json!({"where": {"condition": {"field": "state", "op": "IN", "values": ["completed"]}}}),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["user_id"], "u1");

    let (_, body) = app.get("/api/sessions/fields/user/values").await;
    assert::strings_eq(&body["data"]["values"], &["u1", "u2"]);
}

#[test]
fn registry_is_shared_across_services() {
    let app = app();
    app.state.questions().fields().unwrap();
    app.state.sessions().fields().unwrap();

    assert!(
        app.state
            .registry()
            .is_registered(sift_sdk::EntityType::Question)
    );
    assert!(
        app.state
            .registry()
            .is_registered(sift_sdk::EntityType::Session)
    );
}
