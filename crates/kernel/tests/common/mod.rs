#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Tests run the real router, services and compiler over a
//! [`MemoryStore`], so no database is needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use sift_kernel::query::MemoryStore;
use sift_kernel::routes;
use sift_kernel::state::AppState;
use sift_test_utils::test_question;

/// Test application over an in-memory store.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub state: AppState<MemoryStore>,
    pub router: Router,
}

impl TestApp {
    pub fn new(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        let state = AppState::with_store(Arc::clone(&store));
        let router = routes::api_router().with_state(state.clone());
        Self {
            store,
            state,
            router,
        }
    }

    /// Send a request and return the status and parsed JSON body.
    pub async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.request(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

/// `count` physics NEET questions numbered 1.., for pagination tests.
pub fn numbered_questions(count: i64) -> Vec<Value> {
    (1..=count)
        .map(|n| {
            test_question("PHYSICS", "NEET")
                .int("question_number", n)
                .build()
        })
        .collect()
}

/// A small mixed question bank.
///
/// | # | subject   | exam         | year | topic        | difficulty |
/// |---|-----------|--------------|------|--------------|------------|
/// | 1 | PHYSICS   | NEET         | 2019 | Optics       | EASY       |
/// | 2 | PHYSICS   | JEE_MAIN     | 2020 | Kinematics   | MEDIUM     |
/// | 3 | CHEMISTRY | NEET         | 2021 | Organic      | HARD       |
/// | 4 | BIOLOGY   | NEET         | 2022 | Genetics     | MEDIUM     |
/// | 5 | MATHEMATICS | JEE_ADVANCED | 2023 | Calculus   | HARD       |
/// | 6 | CHEMISTRY | JEE_MAIN     | null | null         | null       |
pub fn question_bank() -> Vec<Value> {
    let rows = [
        ("PHYSICS", "NEET", Some(2019), Some("Optics"), Some("EASY")),
        ("PHYSICS", "JEE_MAIN", Some(2020), Some("Kinematics"), Some("MEDIUM")),
        ("CHEMISTRY", "NEET", Some(2021), Some("Organic"), Some("HARD")),
        ("BIOLOGY", "NEET", Some(2022), Some("Genetics"), Some("MEDIUM")),
        ("MATHEMATICS", "JEE_ADVANCED", Some(2023), Some("Calculus"), Some("HARD")),
        ("CHEMISTRY", "JEE_MAIN", None, None, None),
    ];

    rows.into_iter()
        .enumerate()
        .map(|(i, (subject, exam, year, topic, difficulty))| {
            let mut row = test_question(subject, exam)
                .int("question_number", i as i64 + 1)
                .text("question_text", &format!("{subject} question {}", i + 1));
            row = match year {
                Some(year) => row.int("year", year),
                None => row.null("year"),
            };
            row = match topic {
                Some(topic) => row.text("topic", topic),
                None => row.null("topic"),
            };
            row = match difficulty {
                Some(level) => row.text("difficulty", level),
                None => row.null("difficulty"),
            };
            row.build()
        })
        .collect()
}

/// Question numbers of the results in a `{data: Slice}` body.
pub fn question_numbers(body: &Value) -> Vec<i64> {
    body["data"]["results"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|r| r["question_number"].as_i64())
                .collect()
        })
        .unwrap_or_default()
}
