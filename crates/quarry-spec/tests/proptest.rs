//! Property-based tests for specifications using proptest.

use proptest::prelude::*;
use quarry_spec::{
    Number, Op, Query, Record, Specification, SpecificationEvaluator, SpecificationValidator, Value,
};

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Item {
    value: i64,
    rank: i64,
    name: String,
    active: bool,
}

impl Record for Item {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "value" => Value::Number(Number::I64(self.value)),
            "rank" => Value::Number(Number::I64(self.rank)),
            "name" => Value::String(&self.name),
            "active" => Value::Bool(self.active),
            _ => Value::None,
        }
    }
}

fn item_strategy() -> impl Strategy<Value = Item> {
    (-50i64..50, 0i64..5, "[a-c]{1,4}", any::<bool>()).prop_map(|(value, rank, name, active)| {
        Item {
            value,
            rank,
            name,
            active,
        }
    })
}

fn items_strategy() -> impl Strategy<Value = Vec<Item>> {
    prop::collection::vec(item_strategy(), 0..40)
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// An entity passes validation iff it satisfies every filter.
    #[test]
    fn conjunction_law(
        items in items_strategy(),
        low in -50i64..50,
        high in -50i64..50,
        active in any::<bool>(),
    ) {
        let spec = Specification::<Item>::builder()
            .filter("value", Op::Gte, low)
            .filter("value", Op::Lt, high)
            .filter_eq("active", active)
            .build();
        let validator = SpecificationValidator::<Item>::new();

        for item in &items {
            let expected = item.value >= low && item.value < high && item.active == active;
            prop_assert_eq!(validator.is_valid(item, &spec), expected);
        }
    }

    /// Validation succeeds iff every search group has a matching member.
    #[test]
    fn group_law(
        items in items_strategy(),
        a in "[a-c]",
        b in "[a-c]",
        c in "[a-c]",
    ) {
        let spec = Specification::<Item>::builder()
            .search("name", &format!("{a}%"), 1)
            .unwrap()
            .or_search("name", &format!("%{b}"))
            .unwrap()
            .search("name", &format!("%{c}%"), 2)
            .unwrap()
            .build();

        for item in &items {
            let group1 = item.name.starts_with(a.as_str()) || item.name.ends_with(b.as_str());
            let group2 = item.name.contains(c.as_str());
            prop_assert_eq!(spec.is_satisfied_by(item), group1 && group2);
        }
    }

    /// Evaluating in memory keeps exactly the validated items.
    #[test]
    fn evaluate_agrees_with_validator(
        items in items_strategy(),
        threshold in -50i64..50,
    ) {
        let spec = Specification::<Item>::builder()
            .filter("value", Op::Gt, threshold)
            .search("name", "%a%", 1)
            .unwrap()
            .build();

        let found = spec.evaluate(&items).unwrap();
        let expected: Vec<&Item> = items.iter().filter(|i| spec.is_satisfied_by(i)).collect();
        prop_assert_eq!(found, expected);
    }

    /// Records equal on the primary key are ordered by the tie-break key.
    #[test]
    fn then_by_chain_law(items in items_strategy()) {
        let spec = Specification::<Item>::builder()
            .order_by_desc("rank")
            .then_by("value")
            .build();
        let found = spec.evaluate(&items).unwrap();

        for pair in found.windows(2) {
            prop_assert!(pair[0].rank >= pair[1].rank);
            if pair[0].rank == pair[1].rank {
                prop_assert!(pair[0].value <= pair[1].value);
            }
        }
    }

    /// Ordering is stable: full ties keep source order.
    #[test]
    fn ordering_is_stable(items in items_strategy()) {
        let spec = Specification::<Item>::builder().order_by("rank").build();
        let positions: Vec<usize> = spec
            .evaluate(&items)
            .unwrap()
            .iter()
            .map(|found| items.iter().position(|i| std::ptr::eq(i, *found)).unwrap())
            .collect();

        for pair in positions.windows(2) {
            let (a, b) = (&items[pair[0]], &items[pair[1]]);
            if a.rank == b.rank {
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }

    /// Skip then take is a window over the ordered result.
    #[test]
    fn paging_is_a_window(
        items in items_strategy(),
        skip in 0usize..50,
        take in 0usize..50,
    ) {
        let ordered = Specification::<Item>::builder().order_by("value").build();
        let paged = Specification::<Item>::builder()
            .order_by("value")
            .skip(skip)
            .take(take)
            .build();

        let all = ordered.evaluate(&items).unwrap();
        let page = paged.evaluate(&items).unwrap();
        let expected: Vec<&Item> = all.into_iter().skip(skip).take(take).collect();
        prop_assert_eq!(page, expected);
    }

    /// The chain produces the same plan every time.
    #[test]
    fn evaluation_is_deterministic(
        threshold in -50i64..50,
        skip in 0usize..10,
        take in 1usize..10,
    ) {
        let spec = Specification::<Item>::builder()
            .filter("value", Op::Lte, threshold)
            .order_by("name")
            .then_by_desc("value")
            .skip(skip)
            .take(take)
            .build();
        let chain = SpecificationEvaluator::<Item, Query<Item>>::new();

        let first = chain.evaluate(Query::new(), &spec).unwrap().plan();
        let second = chain.evaluate(Query::new(), &spec).unwrap().plan();
        prop_assert_eq!(first, second);
    }

    /// Count from the criteria-only chain never depends on paging.
    #[test]
    fn criteria_count_ignores_paging(
        items in items_strategy(),
        take in 0usize..5,
    ) {
        let spec = Specification::<Item>::builder()
            .filter_eq("active", true)
            .order_by("value")
            .take(take)
            .build();
        let chain = SpecificationEvaluator::<Item, Query<Item>>::new();
        let count = chain.evaluate_criteria(Query::new(), &spec).unwrap().count(&items);

        prop_assert_eq!(count, items.iter().filter(|i| i.active).count());
    }
}
