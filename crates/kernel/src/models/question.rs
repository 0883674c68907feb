//! Exam question entity.

use serde::{Deserialize, Serialize};
use sift_sdk::{ClosedSet, Searchable};

use super::base::BaseEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ClosedSet)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Subject {
    Physics,
    Chemistry,
    Mathematics,
    Biology,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ClosedSet)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamType {
    JeeAdvanced,
    JeeMain,
    Neet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ClosedSet)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

/// A past-paper question.
///
/// `year` is stored as an integer but matched by the year operators as
/// text, like every other year-bearing column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Searchable)]
#[searchable(entity = Question, table = "questions")]
pub struct Question {
    #[serde(flatten)]
    #[searchable(flatten)]
    pub base: BaseEntity,

    #[searchable(display_name = "Question", filterable = false, sortable = false)]
    pub question_text: String,

    #[searchable(display_name = "Subject", enum_class = Subject, searchable = false)]
    pub subject: Subject,

    #[searchable(
        display_name = "Exam Type",
        enum_class = ExamType,
        searchable = false,
        synonyms = ["exam"]
    )]
    pub exam_type: ExamType,

    #[searchable(
        display_name = "Difficulty",
        enum_class = DifficultyLevel,
        searchable = false,
        synonyms = ["level"]
    )]
    pub difficulty: Option<DifficultyLevel>,

    #[serde(default)]
    pub options: Vec<String>,

    pub correct_answer: Option<String>,

    #[searchable(display_name = "Explanation", filterable = false, sortable = false)]
    pub explanation: Option<String>,

    #[serde(default)]
    pub image_urls: Vec<String>,

    #[searchable(display_name = "Year", field_type = "integer", searchable = false)]
    pub year: Option<i32>,

    #[searchable(display_name = "Paper", field_type = "integer", searchable = false)]
    pub paper_number: Option<i32>,

    #[searchable(display_name = "Question Number", field_type = "integer", searchable = false)]
    pub question_number: Option<i32>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[searchable(display_name = "Topic", synonyms = ["chapter"])]
    pub topic: Option<String>,

    #[searchable(display_name = "Marks", field_type = "integer", searchable = false)]
    pub marks: Option<i32>,

    pub negative_marks: Option<f64>,

    #[searchable(display_name = "Active", field_type = "boolean", searchable = false)]
    pub is_active: Option<bool>,
}
