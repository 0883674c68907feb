//! Query request DSL.
//!
//! A [`QueryRequest`] carries free-text search, a boolean filter tree,
//! sort specs, and pagination. The wire format matches the historical JSON
//! shape: a filter node is a flat object that is a leaf when it carries a
//! `condition` and a group otherwise.

use serde::{Deserialize, Serialize};

/// Default page size when a request omits one.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Comparison operation of a leaf filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    EndsWith,
    In,
    // Year operators target DATE_STRING fields stored as free text.
    YearEquals,
    YearIn,
    YearBetween,
    YearLessThan,
    YearGreaterThan,
    YearLessThanOrEqual,
    YearGreaterThanOrEqual,
}

impl Operation {
    /// Minimum number of values the operation reads.
    pub fn min_values(&self) -> usize {
        match self {
            Operation::YearBetween => 2,
            _ => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Equals => "EQUALS",
            Operation::NotEquals => "NOT_EQUALS",
            Operation::Contains => "CONTAINS",
            Operation::StartsWith => "STARTS_WITH",
            Operation::EndsWith => "ENDS_WITH",
            Operation::In => "IN",
            Operation::YearEquals => "YEAR_EQUALS",
            Operation::YearIn => "YEAR_IN",
            Operation::YearBetween => "YEAR_BETWEEN",
            Operation::YearLessThan => "YEAR_LESS_THAN",
            Operation::YearGreaterThan => "YEAR_GREATER_THAN",
            Operation::YearLessThanOrEqual => "YEAR_LESS_THAN_OR_EQUAL",
            Operation::YearGreaterThanOrEqual => "YEAR_GREATER_THAN_OR_EQUAL",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean connective of a group node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

/// Leaf condition: `field op values`, optionally negated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Canonical field name or synonym.
    pub field: String,
    pub op: Operation,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub negated: bool,
}

impl Filter {
    pub fn new<I, S>(field: &str, op: Operation, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            op,
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    pub fn negate(mut self) -> Self {
        self.negated = !self.negated;
        self
    }
}

/// Node of the structured filter tree.
///
/// An object carrying `condition` is always a leaf, even if it also
/// carries group keys. A malformed condition is an error, never a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, from = "RawFilterNode")]
pub enum FilterNode {
    Leaf {
        condition: Filter,
        #[serde(default)]
        negated: bool,
    },
    Group {
        #[serde(default)]
        operator: LogicalOperator,
        #[serde(default)]
        children: Vec<FilterNode>,
        #[serde(default)]
        negated: bool,
    },
}

/// Wire shape of a filter node before leaf/group discrimination.
#[derive(Deserialize)]
struct RawFilterNode {
    #[serde(default)]
    condition: Option<Filter>,
    #[serde(default)]
    operator: LogicalOperator,
    #[serde(default)]
    children: Vec<FilterNode>,
    #[serde(default)]
    negated: bool,
}

impl From<RawFilterNode> for FilterNode {
    fn from(raw: RawFilterNode) -> Self {
        match raw.condition {
            Some(condition) => FilterNode::Leaf {
                condition,
                negated: raw.negated,
            },
            None => FilterNode::Group {
                operator: raw.operator,
                children: raw.children,
                negated: raw.negated,
            },
        }
    }
}

impl FilterNode {
    pub fn leaf(condition: Filter) -> Self {
        FilterNode::Leaf {
            condition,
            negated: false,
        }
    }

    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::Group {
            operator: LogicalOperator::And,
            children,
            negated: false,
        }
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Group {
            operator: LogicalOperator::Or,
            children,
            negated: false,
        }
    }

    /// Flip the node-level NOT flag.
    pub fn negate(mut self) -> Self {
        match &mut self {
            FilterNode::Leaf { negated, .. } | FilterNode::Group { negated, .. } => {
                *negated = !*negated;
            }
        }
        self
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, FilterNode::Leaf { .. })
    }

    pub fn is_negated(&self) -> bool {
        match self {
            FilterNode::Leaf { negated, .. } | FilterNode::Group { negated, .. } => *negated,
        }
    }
}

/// Sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Canonical field name or synonym.
    pub field: String,
    #[serde(default)]
    pub ascending: bool,
}

impl SortSpec {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }
}

/// A single search/filter/sort/paginate request against one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Free-text search across searchable fields.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub sorts: Vec<SortSpec>,
    /// Zero-based page number.
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
    /// Root of the structured filter tree.
    #[serde(default, rename = "where")]
    pub where_clause: Option<FilterNode>,
}

impl QueryRequest {
    /// Page number clamped to zero.
    pub fn normalized_page(&self) -> u64 {
        self.page.map_or(0, |p| p.max(0) as u64)
    }

    /// Page size clamped to at least one.
    pub fn normalized_size(&self) -> u64 {
        self.size.map_or(DEFAULT_PAGE_SIZE, |s| s.max(1) as u64)
    }

    /// The search text, if it contains anything besides whitespace.
    pub fn search_text(&self) -> Option<&str> {
        self.q.as_deref().filter(|q| !q.trim().is_empty())
    }

    pub fn with_search(mut self, q: &str) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn with_where(mut self, node: FilterNode) -> Self {
        self.where_clause = Some(node);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn with_page(mut self, page: i64, size: i64) -> Self {
        self.page = Some(page);
        self.size = Some(size);
        self
    }
}
