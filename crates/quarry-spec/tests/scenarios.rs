//! End-to-end scenarios over the builder, evaluator chain and validator.

use quarry_spec::{
    Evaluator, FieldValue, Number, Op, PagingEvaluator, ProjectedSpecification, Query, Queryable,
    Record, Result, SpecError, Specification, SpecificationEvaluator, SpecificationValidator,
    UpdateSpecification, Value,
};

// ============================================================================
// Fixture
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Package {
    id: i64,
    name: String,
    version: i64,
    deprecated: bool,
}

impl Package {
    fn new(id: i64, name: &str, version: i64) -> Self {
        Self {
            id,
            name: name.to_string(),
            version,
            deprecated: false,
        }
    }
}

impl Record for Package {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "id" => Value::Number(Number::I64(self.id)),
            "name" => Value::String(&self.name),
            "version" => Value::Number(Number::I64(self.version)),
            "deprecated" => Value::Bool(self.deprecated),
            _ => Value::None,
        }
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> Result<()> {
        match field {
            "name" => self.name = value.into_string(field)?,
            "version" => self.version = value.into_number(field)?,
            "deprecated" => self.deprecated = value.into_bool(field)?,
            _ => return Err(SpecError::unknown_field(field)),
        }
        Ok(())
    }
}

fn five_rows() -> Vec<Package> {
    (1..=5)
        .map(|id| Package::new(id, &format!("pkg-{id}"), id * 10))
        .collect()
}

fn ids(found: &[&Package]) -> Vec<i64> {
    found.iter().map(|p| p.id).collect()
}

// ============================================================================
// Filtering and validation
// ============================================================================

#[test]
fn where_id_validates_only_matching_row() {
    let spec = Specification::<Package>::builder().filter_eq("id", 5i64).build();
    let validator = SpecificationValidator::<Package>::new();

    let valid: Vec<i64> = five_rows()
        .iter()
        .filter(|p| validator.is_valid(p, &spec))
        .map(|p| p.id)
        .collect();
    assert_eq!(valid, vec![5]);
}

#[test]
fn filters_are_conjunctive() {
    let rows = five_rows();
    let spec = Specification::<Package>::builder()
        .filter("version", Op::Gte, 20i64)
        .filter("version", Op::Lt, 50i64)
        .filter_by("odd id", |p: &Package| p.id % 2 == 1)
        .build();

    assert_eq!(ids(&spec.evaluate(&rows).unwrap()), vec![3]);
    for row in &rows {
        let expected = row.version >= 20 && row.version < 50 && row.id % 2 == 1;
        assert_eq!(spec.is_satisfied_by(row), expected, "row {}", row.id);
    }
}

#[test]
fn search_groups_or_within_and_across() {
    let rows = vec![
        Package::new(1, "serde-json", 1),
        Package::new(2, "serde-yaml", 1),
        Package::new(3, "toml", 1),
        Package::new(4, "json5", 1),
    ];
    let spec = Specification::<Package>::builder()
        .search("name", "%json%", 1)
        .unwrap()
        .or_search("name", "%yaml%")
        .unwrap()
        .search("name", "serde%", 2)
        .unwrap()
        .build();

    assert_eq!(ids(&spec.evaluate(&rows).unwrap()), vec![1, 2]);
    assert!(!spec.is_satisfied_by(&rows[3]));
}

#[test]
fn search_is_case_insensitive_and_anchored() {
    let spec = Specification::<Package>::builder()
        .search("name", "SERDE_JSON", 1)
        .unwrap()
        .build();
    assert!(spec.is_satisfied_by(&Package::new(1, "serde-json", 1)));
    assert!(!spec.is_satisfied_by(&Package::new(2, "serde-json5", 1)));
}

// ============================================================================
// Ordering and paging
// ============================================================================

#[test]
fn order_then_by_desc() {
    let rows = vec![
        Package::new(1, "b", 1),
        Package::new(2, "a", 2),
        Package::new(3, "a", 5),
    ];
    let spec = Specification::<Package>::builder()
        .order_by("name")
        .then_by_desc("version")
        .build();

    let found: Vec<(&str, i64)> = spec
        .evaluate(&rows)
        .unwrap()
        .iter()
        .map(|p| (p.name.as_str(), p.version))
        .collect();
    assert_eq!(found, vec![("a", 5), ("a", 2), ("b", 1)]);
}

#[test]
fn skip_then_take_window() {
    let rows = five_rows();
    let spec = Specification::<Package>::builder()
        .order_by("id")
        .take(2)
        .skip(2)
        .build();
    assert_eq!(ids(&spec.evaluate(&rows).unwrap()), vec![3, 4]);
}

#[test]
fn strict_chain_rejects_unordered_paging() {
    let rows = five_rows();
    let spec = Specification::<Package>::builder().skip(1).build();

    assert_eq!(spec.evaluate(&rows).unwrap().len(), 4);
    let err = SpecificationEvaluator::strict()
        .evaluate(Query::new(), &spec)
        .unwrap_err();
    assert!(matches!(err, SpecError::UnorderedPaging));
}

#[test]
fn single_result_takes_at_most_one() {
    let rows = five_rows();
    let spec = Specification::<Package>::builder()
        .filter("id", Op::Gt, 2i64)
        .order_by_desc("id")
        .single()
        .build();
    assert_eq!(ids(&spec.evaluate(&rows).unwrap()), vec![5]);
}

#[test]
fn max_take_caps_results() {
    let rows = five_rows();
    let chain = SpecificationEvaluator::with_paging(PagingEvaluator::lenient().with_max_take(Some(3)));
    let spec = Specification::<Package>::builder().order_by("id").build();
    let query = chain.evaluate(Query::new(), &spec).unwrap();
    assert_eq!(ids(&query.load(&rows)), vec![1, 2, 3]);
}

// ============================================================================
// Chain behavior
// ============================================================================

#[test]
fn evaluation_is_deterministic() {
    let spec = Specification::<Package>::builder()
        .filter("version", Op::Gt, 10i64)
        .search("name", "pkg%", 1)
        .unwrap()
        .include("owner")
        .then_include("team")
        .as_no_tracking()
        .order_by_desc("version")
        .then_by("name")
        .skip(1)
        .take(2)
        .build();
    let chain = SpecificationEvaluator::new();

    let first = chain.evaluate(Query::new(), &spec).unwrap();
    let second = chain.evaluate(Query::new(), &spec).unwrap();
    assert_eq!(first.plan(), second.plan());
    assert_eq!(
        first.plan(),
        vec![
            "where version gt 10",
            "search group 1: name like \"pkg%\"",
            "include owner.team",
            "as_no_tracking",
            "order_by version desc",
            "then_by name asc",
            "skip 1",
            "take 2",
        ]
    );

    let rows = five_rows();
    assert_eq!(first.load(&rows), second.load(&rows));
}

#[test]
fn criteria_evaluation_skips_shaping() {
    let rows = five_rows();
    let spec = Specification::<Package>::builder()
        .filter("id", Op::Gt, 1i64)
        .order_by("id")
        .take(1)
        .build();
    let query = SpecificationEvaluator::new()
        .evaluate_criteria(Query::new(), &spec)
        .unwrap();
    assert!(!query.is_ordered());
    assert_eq!(query.count(&rows), 4);
}

struct HideDeprecated;

impl<Q: Queryable<Package>> Evaluator<Package, Q> for HideDeprecated {
    fn name(&self) -> &'static str {
        "hide_deprecated"
    }

    fn application_order(&self) -> i32 {
        150
    }

    fn is_criteria_evaluator(&self) -> bool {
        true
    }

    fn evaluate(&self, query: Q, _spec: &Specification<Package>) -> Result<Q> {
        query.filter(&quarry_spec::Clause::new("deprecated", Op::Eq, false).into())
    }
}

#[test]
fn custom_evaluator_runs_at_its_order() {
    let mut rows = five_rows();
    rows[0].deprecated = true;
    let chain = SpecificationEvaluator::new().with_evaluator(HideDeprecated);
    let spec = Specification::<Package>::builder()
        .filter("id", Op::Lt, 3i64)
        .build();

    let query = chain.evaluate(Query::new(), &spec).unwrap();
    assert_eq!(query.plan(), vec!["where id lt 3", "where deprecated eq false"]);
    assert_eq!(ids(&query.load(&rows)), vec![2]);
}

// ============================================================================
// Projection
// ============================================================================

#[test]
fn select_projects_matches() {
    let rows = five_rows();
    let spec = ProjectedSpecification::<Package, String>::builder()
        .filter("id", Op::Lte, 2i64)
        .order_by_desc("id")
        .select(|p| p.name.clone())
        .unwrap()
        .build();
    assert_eq!(spec.evaluate(&rows).unwrap(), vec!["pkg-2", "pkg-1"]);
}

#[test]
fn select_many_flattens() {
    let rows = five_rows();
    let spec = ProjectedSpecification::<Package, i64>::builder()
        .take(2)
        .order_by("id")
        .select_many(|p| vec![p.id, p.version])
        .unwrap()
        .build();
    assert_eq!(spec.evaluate(&rows).unwrap(), vec![1, 10, 2, 20]);
}

#[test]
fn concurrent_selectors_fail_in_both_orders() {
    let select_first = ProjectedSpecification::<Package, i64>::builder()
        .select(|p| p.id)
        .unwrap()
        .select_many(|p| vec![p.id]);
    assert!(matches!(
        select_first,
        Err(SpecError::ConcurrentSelectors {
            existing: "select",
            attempted: "select_many"
        })
    ));

    let many_first = ProjectedSpecification::<Package, i64>::builder()
        .select_many(|p| vec![p.id])
        .unwrap()
        .select(|p| p.id);
    assert!(matches!(
        many_first,
        Err(SpecError::ConcurrentSelectors {
            existing: "select_many",
            attempted: "select"
        })
    ));
}

#[test]
fn missing_selector_fails_at_evaluation() {
    let spec = ProjectedSpecification::<Package, i64>::builder()
        .filter_eq("id", 1i64)
        .build();
    assert!(matches!(
        spec.evaluate(&five_rows()),
        Err(SpecError::SelectorNotFound)
    ));
}

// ============================================================================
// Updates
// ============================================================================

#[test]
fn two_assignments_on_different_fields() {
    let mut rows = five_rows();
    let spec = UpdateSpecification::<Package>::builder()
        .filter("id", Op::Gte, 4i64)
        .set("deprecated", true)
        .set_with("version", |p: &Package| FieldValue::from(p.version + 1))
        .build();

    assert_eq!(spec.assignments().len(), 2);
    assert_eq!(spec.execute(&mut rows).unwrap(), 2);
    assert!(rows[3].deprecated && rows[4].deprecated);
    assert_eq!((rows[3].version, rows[4].version), (41, 51));
    assert!(!rows[0].deprecated);
    assert_eq!(rows[0].version, 10);
}

#[test]
fn same_field_assignment_last_wins() {
    let mut rows = five_rows();
    let spec = UpdateSpecification::<Package>::builder()
        .filter_eq("id", 1i64)
        .set("name", "first")
        .set("name", "second")
        .build();
    assert_eq!(spec.assignments().len(), 1);
    spec.execute(&mut rows).unwrap();
    assert_eq!(rows[0].name, "second");
}

#[test]
fn update_of_unknown_field_fails() {
    let mut rows = five_rows();
    let spec = UpdateSpecification::<Package>::builder()
        .set("owner", "nobody")
        .build();
    assert!(matches!(
        spec.execute(&mut rows),
        Err(SpecError::UnknownField { .. })
    ));
}

#[test]
fn failed_update_changes_no_row() {
    let mut rows = five_rows();
    let before = rows.clone();
    let spec = UpdateSpecification::<Package>::builder()
        .filter("id", Op::Lte, 2i64)
        .set("name", "x")
        .set("owner", 1i64)
        .build();
    assert!(spec.execute(&mut rows).is_err());
    assert_eq!(rows, before);
}
