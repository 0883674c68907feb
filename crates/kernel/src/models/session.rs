//! Practice session entity.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sift_sdk::{ClosedSet, Searchable};

use super::base::BaseEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ClosedSet)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

/// Exam type of a session; a session may mix exams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ClosedSet)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionExamType {
    JeeAdvanced,
    JeeMain,
    Neet,
    Mixed,
}

/// Subject of a session; a session may mix subjects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ClosedSet)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionSubject {
    Physics,
    Chemistry,
    Mathematics,
    Biology,
    Mixed,
}

/// One user's attempt at a set of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Searchable)]
#[searchable(entity = Session, table = "sessions")]
pub struct Session {
    #[serde(flatten)]
    #[searchable(flatten)]
    pub base: BaseEntity,

    #[searchable(display_name = "User", synonyms = ["user"])]
    pub user_id: String,

    #[serde(default)]
    pub question_ids: Vec<String>,

    #[searchable(
        display_name = "Started",
        field_type = "date_string",
        searchable = false,
        synonyms = ["date"]
    )]
    pub start_time: Option<NaiveDateTime>,

    #[searchable(display_name = "Ended", field_type = "date_string", searchable = false)]
    pub end_time: Option<NaiveDateTime>,

    #[searchable(
        display_name = "Status",
        enum_class = SessionStatus,
        searchable = false,
        synonyms = ["state"]
    )]
    pub status: SessionStatus,

    pub score: Option<f64>,

    #[searchable(display_name = "Questions", field_type = "integer", searchable = false)]
    pub total_questions: Option<i32>,

    #[searchable(display_name = "Correct", field_type = "integer", searchable = false)]
    pub correct_answers: Option<i32>,

    pub incorrect_answers: Option<i32>,

    pub unanswered: Option<i32>,

    /// Question id to the user's answer.
    #[serde(default)]
    pub answers: BTreeMap<String, String>,

    #[searchable(display_name = "Time Spent", field_type = "integer", searchable = false)]
    pub time_spent_seconds: Option<i64>,

    #[searchable(
        display_name = "Exam Type",
        enum_class = SessionExamType,
        searchable = false,
        synonyms = ["exam"]
    )]
    pub exam_type: Option<SessionExamType>,

    #[searchable(display_name = "Subject", enum_class = SessionSubject, searchable = false)]
    pub subject: Option<SessionSubject>,
}
