//! Entity models.
//!
//! Each entity derives `Searchable`; its annotated fields become the query
//! engine's field catalog for that entity type.

mod base;
mod question;
mod session;

pub use base::BaseEntity;
pub use question::{DifficultyLevel, ExamType, Question, Subject};
pub use session::{Session, SessionExamType, SessionStatus, SessionSubject};
