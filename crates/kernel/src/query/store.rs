//! Store seam.
//!
//! The compiler never talks to a database directly. It builds predicates and
//! orderings through a [`PredicateBuilder`] and hands them to an
//! [`EntityStore`] for one bounded fetch. Attribute paths are the
//! `entity_path` of a field definition and are opaque to the engine.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Anchoring of a case-insensitive pattern match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Contains,
    StartsWith,
    EndsWith,
}

/// How a column is projected when listing its distinct values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// The column as stored.
    Raw,
    /// The column cast to text.
    Text,
}

/// Predicate and ordering construction over named attribute paths.
///
/// Text comparisons lower-case both sides; `contains` is the one
/// case-sensitive operation and compares the stored text verbatim.
pub trait PredicateBuilder {
    type Predicate: Send;
    type Order: Send;

    fn always(&self) -> Self::Predicate;
    fn never(&self) -> Self::Predicate;

    /// Conjunction. An empty list is `always`.
    fn and(&self, predicates: Vec<Self::Predicate>) -> Self::Predicate;

    /// Disjunction. An empty list is `never`.
    fn or(&self, predicates: Vec<Self::Predicate>) -> Self::Predicate;

    fn not(&self, predicate: Self::Predicate) -> Self::Predicate;

    fn equals_ignore_case(&self, path: &str, value: &str) -> Self::Predicate;
    fn not_equals_ignore_case(&self, path: &str, value: &str) -> Self::Predicate;
    fn matches_ignore_case(&self, path: &str, value: &str, mode: TextMatch) -> Self::Predicate;

    /// Case-sensitive substring match on the text form of the attribute.
    fn contains(&self, path: &str, value: &str) -> Self::Predicate;

    fn in_ignore_case(&self, path: &str, values: &[String]) -> Self::Predicate;

    fn order_by(&self, path: &str, ascending: bool) -> Self::Order;
}

/// One bounded, ordered, offset fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest<P, O> {
    pub table: &'static str,
    pub predicate: P,
    pub order: Vec<O>,
    pub limit: u64,
    pub offset: u64,
}

pub type PredicateOf<S> = <<S as EntityStore>::Builder as PredicateBuilder>::Predicate;
pub type OrderOf<S> = <<S as EntityStore>::Builder as PredicateBuilder>::Order;

/// Backing store for entity rows.
///
/// Rows come back as JSON objects keyed by column name; decoding into the
/// entity type happens in the query service.
#[async_trait]
pub trait EntityStore: Send + Sync {
    type Builder: PredicateBuilder + Send + Sync;

    fn predicates(&self) -> &Self::Builder;

    /// Run one fetch and return the matching rows in order.
    async fn fetch(
        &self,
        request: FetchRequest<PredicateOf<Self>, OrderOf<Self>>,
    ) -> Result<Vec<Value>>;

    /// Distinct non-null values of one column, ascending, at most `limit`.
    async fn distinct_values(
        &self,
        table: &str,
        path: &str,
        projection: Projection,
        limit: u64,
    ) -> Result<Vec<String>>;

    /// Whether the store is reachable.
    async fn healthy(&self) -> bool {
        true
    }
}
