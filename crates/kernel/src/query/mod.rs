//! Dynamic query engine.
//!
//! Entities declare queryable fields with `#[derive(Searchable)]`. The
//! engine detects them into a [`FieldRegistry`], compiles
//! [`QueryRequest`](sift_sdk::QueryRequest)s into store predicates, and
//! returns over-fetched [`Slice`](sift_sdk::Slice)s.

pub mod compiler;
pub mod detector;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod registry;
pub mod service;
pub mod store;
pub mod values;

pub use compiler::{FilterCompiler, MAX_YEAR_SPAN, YEAR_MAX, YEAR_MIN};
pub use error::{QueryError, QueryResult};
pub use memory::MemoryStore;
pub use postgres::PgEntityStore;
pub use registry::{FieldCatalog, FieldRegistry};
pub use service::QueryService;
pub use store::{EntityStore, FetchRequest, PredicateBuilder, Projection, TextMatch};
pub use values::FieldValueProvider;
