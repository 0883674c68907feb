//! Filter tree compilation.
//!
//! Walks a [`FilterNode`] and emits one predicate through a
//! [`PredicateBuilder`]. Every name is resolved and every value checked here,
//! so a request that compiles never fails for configuration reasons later.

use sift_sdk::{Filter, FilterNode, LogicalOperator, Operation, SortSpec};

use super::error::{QueryError, QueryResult};
use super::registry::FieldCatalog;
use super::store::{PredicateBuilder, TextMatch};

/// Lower bound of the year enumeration for open-ended year operators.
pub const YEAR_MIN: i32 = 1900;
/// Upper bound of the year enumeration for open-ended year operators.
pub const YEAR_MAX: i32 = 2100;
/// Most years a single range operator may enumerate.
pub const MAX_YEAR_SPAN: i64 = 1000;

/// Compiles filters, search text and sorts against one entity's catalog.
pub struct FilterCompiler<'a, B: PredicateBuilder> {
    catalog: &'a FieldCatalog,
    builder: &'a B,
}

impl<'a, B: PredicateBuilder> FilterCompiler<'a, B> {
    pub fn new(catalog: &'a FieldCatalog, builder: &'a B) -> Self {
        Self { catalog, builder }
    }

    /// Compile an optional tree. No tree matches everything.
    pub fn compile(&self, node: Option<&FilterNode>) -> QueryResult<B::Predicate> {
        match node {
            Some(node) => self.compile_node(node),
            None => Ok(self.builder.always()),
        }
    }

    fn compile_node(&self, node: &FilterNode) -> QueryResult<B::Predicate> {
        let (predicate, negated) = match node {
            FilterNode::Leaf { condition, negated } => (self.compile_filter(condition)?, *negated),
            FilterNode::Group {
                operator,
                children,
                negated,
            } => {
                let children = children
                    .iter()
                    .map(|child| self.compile_node(child))
                    .collect::<QueryResult<Vec<_>>>()?;

                let predicate = if children.is_empty() {
                    self.builder.always()
                } else {
                    match operator {
                        LogicalOperator::And => self.builder.and(children),
                        LogicalOperator::Or => self.builder.or(children),
                    }
                };
                (predicate, *negated)
            }
        };

        Ok(self.negate_if(predicate, negated))
    }

    /// Compile one leaf condition, applying its own `negated` flag.
    pub fn compile_filter(&self, filter: &Filter) -> QueryResult<B::Predicate> {
        let field = self
            .catalog
            .resolve(&filter.field)
            .ok_or_else(|| QueryError::UnknownField(filter.field.clone()))?;
        let path = field.entity_path.as_str();
        let b = self.builder;

        let predicate = match filter.op {
            Operation::Equals => b.equals_ignore_case(path, first_value(filter)?),
            Operation::NotEquals => b.not_equals_ignore_case(path, first_value(filter)?),
            Operation::Contains => {
                b.matches_ignore_case(path, first_value(filter)?, TextMatch::Contains)
            }
            Operation::StartsWith => {
                b.matches_ignore_case(path, first_value(filter)?, TextMatch::StartsWith)
            }
            Operation::EndsWith => {
                b.matches_ignore_case(path, first_value(filter)?, TextMatch::EndsWith)
            }
            Operation::In => b.in_ignore_case(path, values(filter)?),
            Operation::YearEquals => b.contains(path, first_value(filter)?),
            Operation::YearIn => {
                let years = values(filter)?
                    .iter()
                    .map(|year| b.contains(path, year))
                    .collect();
                b.or(years)
            }
            Operation::YearBetween => {
                let bounds = values(filter)?;
                let start = parse_year(filter, &bounds[0])?;
                let end = parse_year(filter, &bounds[1])?;
                self.year_range(filter, path, start, end)?
            }
            Operation::YearLessThan => {
                let year = parse_year(filter, first_value(filter)?)?;
                self.year_range(filter, path, YEAR_MIN, year.saturating_sub(1))?
            }
            Operation::YearGreaterThan => {
                let year = parse_year(filter, first_value(filter)?)?;
                self.year_range(filter, path, year.saturating_add(1), YEAR_MAX)?
            }
            Operation::YearLessThanOrEqual => {
                let year = parse_year(filter, first_value(filter)?)?;
                self.year_range(filter, path, YEAR_MIN, year)?
            }
            Operation::YearGreaterThanOrEqual => {
                let year = parse_year(filter, first_value(filter)?)?;
                self.year_range(filter, path, year, YEAR_MAX)?
            }
        };

        Ok(self.negate_if(predicate, filter.negated))
    }

    /// OR of case-insensitive substring matches over every searchable field.
    ///
    /// `None` when the entity has no searchable fields.
    pub fn search(&self, text: &str) -> Option<B::Predicate> {
        let matches: Vec<_> = self
            .catalog
            .fields()
            .iter()
            .filter(|f| f.searchable)
            .map(|f| {
                self.builder
                    .matches_ignore_case(&f.entity_path, text, TextMatch::Contains)
            })
            .collect();

        if matches.is_empty() {
            None
        } else {
            Some(self.builder.or(matches))
        }
    }

    /// Resolve sort specs into orderings, in request order.
    pub fn sorts(&self, sorts: &[SortSpec]) -> QueryResult<Vec<B::Order>> {
        sorts
            .iter()
            .map(|sort| {
                let field = self
                    .catalog
                    .resolve(&sort.field)
                    .ok_or_else(|| QueryError::UnknownSortField(sort.field.clone()))?;
                Ok(self.builder.order_by(&field.entity_path, sort.ascending))
            })
            .collect()
    }

    /// One substring match per year in `[start, end]`. An empty range
    /// matches nothing; one wider than [`MAX_YEAR_SPAN`] is rejected.
    fn year_range(
        &self,
        filter: &Filter,
        path: &str,
        start: i32,
        end: i32,
    ) -> QueryResult<B::Predicate> {
        if end < start {
            return Ok(self.builder.never());
        }

        let span = i64::from(end) - i64::from(start) + 1;
        if span > MAX_YEAR_SPAN {
            return Err(QueryError::YearRangeTooWide {
                field: filter.field.clone(),
                start,
                end,
                max: MAX_YEAR_SPAN,
            });
        }

        let years = (start..=end)
            .map(|year| self.builder.contains(path, &year.to_string()))
            .collect();
        Ok(self.builder.or(years))
    }

    fn negate_if(&self, predicate: B::Predicate, negated: bool) -> B::Predicate {
        if negated {
            self.builder.not(predicate)
        } else {
            predicate
        }
    }
}

fn first_value(filter: &Filter) -> QueryResult<&str> {
    filter
        .values
        .first()
        .map(String::as_str)
        .ok_or_else(|| QueryError::MissingValue {
            field: filter.field.clone(),
        })
}

/// All values, checked against the operation's minimum arity.
fn values(filter: &Filter) -> QueryResult<&[String]> {
    let expected = filter.op.min_values();
    match filter.values.len() {
        0 => Err(QueryError::MissingValue {
            field: filter.field.clone(),
        }),
        actual if actual < expected => Err(QueryError::InsufficientValues {
            field: filter.field.clone(),
            op: filter.op,
            expected,
            actual,
        }),
        _ => Ok(&filter.values),
    }
}

fn parse_year(filter: &Filter, value: &str) -> QueryResult<i32> {
    value
        .trim()
        .parse()
        .map_err(|_| QueryError::InvalidYear {
            field: filter.field.clone(),
            value: value.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::query::registry::FieldRegistry;
    use sift_sdk::{EntityType, FieldDefinition};

    /// Renders predicates as compact strings for structural assertions.
    struct Render;

    impl PredicateBuilder for Render {
        type Predicate = String;
        type Order = String;

        fn always(&self) -> String {
            "TRUE".into()
        }

        fn never(&self) -> String {
            "FALSE".into()
        }

        fn and(&self, predicates: Vec<String>) -> String {
            format!("and({})", predicates.join(", "))
        }

        fn or(&self, predicates: Vec<String>) -> String {
            format!("or({})", predicates.join(", "))
        }

        fn not(&self, predicate: String) -> String {
            format!("not({predicate})")
        }

        fn equals_ignore_case(&self, path: &str, value: &str) -> String {
            format!("{path}~={value}")
        }

        fn not_equals_ignore_case(&self, path: &str, value: &str) -> String {
            format!("{path}~!={value}")
        }

        fn matches_ignore_case(&self, path: &str, value: &str, mode: TextMatch) -> String {
            format!("{path}~{mode:?}({value})")
        }

        fn contains(&self, path: &str, value: &str) -> String {
            format!("{path}[{value}]")
        }

        fn in_ignore_case(&self, path: &str, values: &[String]) -> String {
            format!("{path}~in({})", values.join("|"))
        }

        fn order_by(&self, path: &str, ascending: bool) -> String {
            format!("{path} {}", if ascending { "asc" } else { "desc" })
        }
    }

    fn catalog() -> std::sync::Arc<FieldCatalog> {
        let registry = FieldRegistry::new();
        registry
            .register_fields(
                EntityType::Question,
                vec![
                    FieldDefinition::new(EntityType::Question, "subject").searchable(false),
                    FieldDefinition::new(EntityType::Question, "examType")
                        .entity_path("exam_type")
                        .searchable(false)
                        .synonym("exam"),
                    FieldDefinition::new(EntityType::Question, "topic"),
                    FieldDefinition::new(EntityType::Question, "questionText")
                        .entity_path("question_text"),
                    FieldDefinition::new(EntityType::Question, "year").searchable(false),
                ],
            )
            .unwrap();
        registry.catalog(EntityType::Question)
    }

    fn compile(filter: Filter) -> QueryResult<String> {
        let catalog = catalog();
        FilterCompiler::new(&catalog, &Render).compile_filter(&filter)
    }

    #[test]
    fn absent_tree_matches_everything() {
        let catalog = catalog();
        let compiler = FilterCompiler::new(&catalog, &Render);
        assert_eq!(compiler.compile(None).unwrap(), "TRUE");
    }

    #[test]
    fn string_operations_resolve_paths() {
        assert_eq!(
            compile(Filter::new("EXAM", Operation::Equals, ["NEET", "ignored"])).unwrap(),
            "exam_type~=NEET"
        );
        assert_eq!(
            compile(Filter::new("topic", Operation::NotEquals, ["optics"])).unwrap(),
            "topic~!=optics"
        );
        assert_eq!(
            compile(Filter::new("topic", Operation::StartsWith, ["opt"])).unwrap(),
            "topic~StartsWith(opt)"
        );
        assert_eq!(
            compile(Filter::new("subject", Operation::In, ["PHYSICS", "chemistry"])).unwrap(),
            "subject~in(PHYSICS|chemistry)"
        );
    }

    #[test]
    fn leaf_negation_wraps_the_operation() {
        let filter = Filter::new("topic", Operation::Contains, ["wave"]).negate();
        assert_eq!(compile(filter).unwrap(), "not(topic~Contains(wave))");
    }

    #[test]
    fn filter_and_node_negation_both_apply() {
        let catalog = catalog();
        let compiler = FilterCompiler::new(&catalog, &Render);
        let node =
            FilterNode::leaf(Filter::new("topic", Operation::Equals, ["x"]).negate()).negate();

        assert_eq!(
            compiler.compile(Some(&node)).unwrap(),
            "not(not(topic~=x))"
        );
    }

    #[test]
    fn groups_combine_children_in_order() {
        let catalog = catalog();
        let compiler = FilterCompiler::new(&catalog, &Render);
        let node = FilterNode::and(vec![
            FilterNode::leaf(Filter::new("subject", Operation::Equals, ["PHYSICS"])),
            FilterNode::or(vec![
                FilterNode::leaf(Filter::new("exam", Operation::Equals, ["NEET"])),
                FilterNode::leaf(Filter::new("exam", Operation::Equals, ["JEE_MAIN"])),
            ]),
        ])
        .negate();

        assert_eq!(
            compiler.compile(Some(&node)).unwrap(),
            "not(and(subject~=PHYSICS, or(exam_type~=NEET, exam_type~=JEE_MAIN)))"
        );
    }

    #[test]
    fn empty_group_is_always_true() {
        let catalog = catalog();
        let compiler = FilterCompiler::new(&catalog, &Render);

        assert_eq!(
            compiler.compile(Some(&FilterNode::or(vec![]))).unwrap(),
            "TRUE"
        );
        assert_eq!(
            compiler
                .compile(Some(&FilterNode::and(vec![]).negate()))
                .unwrap(),
            "not(TRUE)"
        );
    }

    #[test]
    fn year_equals_is_case_sensitive_substring() {
        assert_eq!(
            compile(Filter::new("year", Operation::YearEquals, ["2021"])).unwrap(),
            "year[2021]"
        );
        assert_eq!(
            compile(Filter::new("year", Operation::YearIn, ["2019", "2021"])).unwrap(),
            "or(year[2019], year[2021])"
        );
    }

    #[test]
    fn year_between_enumerates_inclusive_range() {
        assert_eq!(
            compile(Filter::new("year", Operation::YearBetween, ["2020", "2022"])).unwrap(),
            "or(year[2020], year[2021], year[2022])"
        );
        assert_eq!(
            compile(Filter::new("year", Operation::YearBetween, ["2022", "2020"])).unwrap(),
            "FALSE"
        );
    }

    #[test]
    fn open_year_ranges_use_fixed_bounds() {
        let lt = compile(Filter::new("year", Operation::YearLessThan, ["1903"])).unwrap();
        assert_eq!(lt, "or(year[1900], year[1901], year[1902])");

        let gt = compile(Filter::new("year", Operation::YearGreaterThan, ["2098"])).unwrap();
        assert_eq!(gt, "or(year[2099], year[2100])");

        let lte = compile(Filter::new("year", Operation::YearLessThanOrEqual, ["1901"])).unwrap();
        assert_eq!(lte, "or(year[1900], year[1901])");

        let gte =
            compile(Filter::new("year", Operation::YearGreaterThanOrEqual, ["2100"])).unwrap();
        assert_eq!(gte, "or(year[2100])");

        let none = compile(Filter::new("year", Operation::YearLessThan, ["1900"])).unwrap();
        assert_eq!(none, "FALSE");
    }

    #[test]
    fn year_operands_outside_fixed_bounds_are_kept() {
        let gt = compile(Filter::new("year", Operation::YearGreaterThan, ["1850"])).unwrap();
        assert!(gt.starts_with("or(year[1851], year[1852], "), "{gt}");
        assert!(gt.ends_with("year[2100])"), "{gt}");

        let gte =
            compile(Filter::new("year", Operation::YearGreaterThanOrEqual, ["1850"])).unwrap();
        assert!(gte.starts_with("or(year[1850], "), "{gte}");

        let lt = compile(Filter::new("year", Operation::YearLessThan, ["2200"])).unwrap();
        assert!(lt.starts_with("or(year[1900], "), "{lt}");
        assert!(lt.ends_with("year[2199])"), "{lt}");

        let between =
            compile(Filter::new("year", Operation::YearBetween, ["1850", "1852"])).unwrap();
        assert_eq!(between, "or(year[1850], year[1851], year[1852])");

        let late = compile(Filter::new("year", Operation::YearBetween, ["2150", "2151"])).unwrap();
        assert_eq!(late, "or(year[2150], year[2151])");
    }

    #[test]
    fn overly_wide_year_range_is_rejected() {
        let err = compile(Filter::new("year", Operation::YearBetween, ["0", "2000000000"]))
            .unwrap_err();
        assert!(
            matches!(err, QueryError::YearRangeTooWide { max: MAX_YEAR_SPAN, .. }),
            "{err}"
        );
        assert!(err.is_configuration());

        let empty = compile(Filter::new("year", Operation::YearLessThanOrEqual, ["-5000"]));
        assert!(matches!(empty, Ok(ref p) if p == "FALSE"), "{empty:?}");

        let err = compile(Filter::new("year", Operation::YearGreaterThan, ["-5000"])).unwrap_err();
        assert!(matches!(err, QueryError::YearRangeTooWide { .. }));

        let widest = (i64::from(YEAR_MAX) - MAX_YEAR_SPAN + 1).to_string();
        assert!(
            compile(Filter::new("year", Operation::YearGreaterThanOrEqual, [widest])).is_ok()
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = compile(Filter::new("nope", Operation::Equals, ["x"])).unwrap_err();
        assert!(matches!(err, QueryError::UnknownField(name) if name == "nope"));
    }

    #[test]
    fn missing_and_insufficient_values_are_rejected() {
        let err = compile(Filter::new("topic", Operation::Equals, Vec::<String>::new()));
        assert!(matches!(err, Err(QueryError::MissingValue { .. })));

        let err = compile(Filter::new("subject", Operation::In, Vec::<String>::new()));
        assert!(matches!(err, Err(QueryError::MissingValue { .. })));

        let err = compile(Filter::new("year", Operation::YearBetween, ["2020"]));
        assert!(matches!(
            err,
            Err(QueryError::InsufficientValues {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn non_numeric_year_is_rejected() {
        let err = compile(Filter::new("year", Operation::YearGreaterThan, ["twenty"])).unwrap_err();
        assert!(matches!(err, QueryError::InvalidYear { value, .. } if value == "twenty"));
    }

    #[test]
    fn search_covers_searchable_fields_only() {
        let catalog = catalog();
        let compiler = FilterCompiler::new(&catalog, &Render);

        assert_eq!(
            compiler.search("Newton").unwrap(),
            "or(topic~Contains(Newton), question_text~Contains(Newton))"
        );
    }

    #[test]
    fn sorts_resolve_synonyms_and_reject_unknown_fields() {
        let catalog = catalog();
        let compiler = FilterCompiler::new(&catalog, &Render);

        let orders = compiler
            .sorts(&[SortSpec::asc("exam"), SortSpec::desc("year")])
            .unwrap();
        assert_eq!(orders, vec!["exam_type asc", "year desc"]);

        let err = compiler.sorts(&[SortSpec::asc("doesNotExist")]).unwrap_err();
        assert!(matches!(err, QueryError::UnknownSortField(name) if name == "doesNotExist"));
    }
}
