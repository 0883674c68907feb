//! In-memory entity store.
//!
//! Holds JSON rows per table and evaluates predicates with SQL three-valued
//! logic, so a missing or null attribute behaves the way a NULL column does
//! in PostgreSQL: it satisfies neither a comparison nor its negation.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::store::{EntityStore, FetchRequest, PredicateBuilder, Projection, TextMatch};

/// Predicate over one JSON row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowPredicate {
    Const(bool),
    And(Vec<RowPredicate>),
    Or(Vec<RowPredicate>),
    Not(Box<RowPredicate>),
    Text { path: String, test: TextTest },
}

/// Comparison applied to the text form of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum TextTest {
    /// Operands are stored lower-cased.
    Equals(String),
    NotEquals(String),
    Matches(String, TextMatch),
    In(Vec<String>),
    /// Case-sensitive.
    Contains(String),
}

impl RowPredicate {
    /// `None` is SQL UNKNOWN.
    pub fn eval(&self, row: &Value) -> Option<bool> {
        match self {
            RowPredicate::Const(value) => Some(*value),
            RowPredicate::And(children) => {
                let mut result = Some(true);
                for child in children {
                    match child.eval(row) {
                        Some(false) => return Some(false),
                        None => result = None,
                        Some(true) => {}
                    }
                }
                result
            }
            RowPredicate::Or(children) => {
                let mut result = Some(false);
                for child in children {
                    match child.eval(row) {
                        Some(true) => return Some(true),
                        None => result = None,
                        Some(false) => {}
                    }
                }
                result
            }
            RowPredicate::Not(inner) => inner.eval(row).map(|v| !v),
            RowPredicate::Text { path, test } => {
                let text = text_of(row.get(path.as_str())?)?;
                Some(test.apply(&text))
            }
        }
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.eval(row) == Some(true)
    }
}

impl TextTest {
    fn apply(&self, text: &str) -> bool {
        match self {
            TextTest::Contains(needle) => text.contains(needle.as_str()),
            TextTest::Equals(value) => text.to_lowercase() == *value,
            TextTest::NotEquals(value) => text.to_lowercase() != *value,
            TextTest::In(values) => {
                let lower = text.to_lowercase();
                values.iter().any(|v| *v == lower)
            }
            TextTest::Matches(value, mode) => {
                let lower = text.to_lowercase();
                match mode {
                    TextMatch::Contains => lower.contains(value.as_str()),
                    TextMatch::StartsWith => lower.starts_with(value.as_str()),
                    TextMatch::EndsWith => lower.ends_with(value.as_str()),
                }
            }
        }
    }
}

/// Text form of a JSON value, the way a text cast renders it. Null has none.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Ordering on one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOrder {
    pub path: String,
    pub ascending: bool,
}

impl RowOrder {
    /// Nulls sort after everything ascending and first descending.
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let left = a.get(self.path.as_str()).unwrap_or(&Value::Null);
        let right = b.get(self.path.as_str()).unwrap_or(&Value::Null);

        let ordering = match (left, right) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (x, y) => text_of(x).cmp(&text_of(y)),
        };

        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

/// Builds [`RowPredicate`]s and [`RowOrder`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowPredicates;

impl RowPredicates {
    fn text(path: &str, test: TextTest) -> RowPredicate {
        RowPredicate::Text {
            path: path.to_string(),
            test,
        }
    }
}

impl PredicateBuilder for RowPredicates {
    type Predicate = RowPredicate;
    type Order = RowOrder;

    fn always(&self) -> RowPredicate {
        RowPredicate::Const(true)
    }

    fn never(&self) -> RowPredicate {
        RowPredicate::Const(false)
    }

    fn and(&self, predicates: Vec<RowPredicate>) -> RowPredicate {
        RowPredicate::And(predicates)
    }

    fn or(&self, predicates: Vec<RowPredicate>) -> RowPredicate {
        RowPredicate::Or(predicates)
    }

    fn not(&self, predicate: RowPredicate) -> RowPredicate {
        RowPredicate::Not(Box::new(predicate))
    }

    fn equals_ignore_case(&self, path: &str, value: &str) -> RowPredicate {
        Self::text(path, TextTest::Equals(value.to_lowercase()))
    }

    fn not_equals_ignore_case(&self, path: &str, value: &str) -> RowPredicate {
        Self::text(path, TextTest::NotEquals(value.to_lowercase()))
    }

    fn matches_ignore_case(&self, path: &str, value: &str, mode: TextMatch) -> RowPredicate {
        Self::text(path, TextTest::Matches(value.to_lowercase(), mode))
    }

    fn contains(&self, path: &str, value: &str) -> RowPredicate {
        Self::text(path, TextTest::Contains(value.to_string()))
    }

    fn in_ignore_case(&self, path: &str, values: &[String]) -> RowPredicate {
        Self::text(
            path,
            TextTest::In(values.iter().map(|v| v.to_lowercase()).collect()),
        )
    }

    fn order_by(&self, path: &str, ascending: bool) -> RowOrder {
        RowOrder {
            path: path.to_string(),
            ascending,
        }
    }
}

/// Entity store backed by in-process tables of JSON rows.
///
/// Used by tests and by anything that wants the engine without PostgreSQL.
/// Counts fetches so callers can assert that a rejected request never
/// reached the store.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    fetches: AtomicUsize,
    predicates: RowPredicates,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows to a table, creating it if needed.
    pub fn insert(&self, table: &str, rows: impl IntoIterator<Item = Value>) {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn with_rows(self, table: &str, rows: impl IntoIterator<Item = Value>) -> Self {
        self.insert(table, rows);
        self
    }

    /// Number of `fetch` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(AtomicOrdering::SeqCst)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    type Builder = RowPredicates;

    fn predicates(&self) -> &RowPredicates {
        &self.predicates
    }

    async fn fetch(&self, request: FetchRequest<RowPredicate, RowOrder>) -> Result<Vec<Value>> {
        self.fetches.fetch_add(1, AtomicOrdering::SeqCst);

        let tables = self.tables.read();
        let mut rows: Vec<&Value> = tables
            .get(request.table)
            .map(|rows| rows.iter().filter(|r| request.predicate.matches(r)).collect())
            .unwrap_or_default();

        rows.sort_by(|a, b| {
            request
                .order
                .iter()
                .map(|order| order.compare(a, b))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        let offset = usize::try_from(request.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(request.limit).unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn distinct_values(
        &self,
        table: &str,
        path: &str,
        _projection: Projection,
        limit: u64,
    ) -> Result<Vec<String>> {
        let tables = self.tables.read();
        let values: BTreeSet<String> = tables
            .get(table)
            .into_iter()
            .flatten()
            .filter_map(|row| row.get(path).and_then(text_of))
            .collect();

        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(values.into_iter().take(limit).collect())
    }
}
