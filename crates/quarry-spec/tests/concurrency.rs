//! One built specification shared by many threads.

use std::sync::Arc;
use std::thread;

use quarry_spec::{
    Number, Op, Query, Record, Specification, SpecificationEvaluator, SpecificationValidator, Value,
};

#[derive(Debug, Clone, PartialEq)]
struct Crate {
    id: i64,
    name: String,
    stars: i64,
}

impl Record for Crate {
    fn field_value(&self, field: &str) -> Value<'_> {
        match field {
            "id" => Value::Number(Number::I64(self.id)),
            "name" => Value::String(&self.name),
            "stars" => Value::Number(Number::I64(self.stars)),
            _ => Value::None,
        }
    }
}

fn rows() -> Vec<Crate> {
    (1..=200)
        .map(|id| Crate {
            id,
            name: format!("crate-{}", id % 7),
            stars: (id * 37) % 101,
        })
        .collect()
}

fn shared_spec() -> Specification<Crate> {
    Specification::<Crate>::builder()
        .filter("stars", Op::Gte, 20i64)
        .filter_by("odd", |c: &Crate| c.id % 2 == 1)
        .search("name", "%crate-3%", 1)
        .unwrap()
        .or_search("name", "%crate-5%")
        .unwrap()
        .order_by_desc("stars")
        .then_by("id")
        .skip(2)
        .take(15)
        .build()
}

fn ids(found: &[&Crate]) -> Vec<i64> {
    found.iter().map(|c| c.id).collect()
}

#[test]
fn shared_specification_gives_identical_results_across_threads() {
    let rows = rows();
    let spec = shared_spec();
    let expected = ids(&spec.evaluate(&rows).unwrap());
    assert!(!expected.is_empty());

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    (0..50)
                        .map(|_| ids(&spec.evaluate(&rows).unwrap()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            for found in handle.join().unwrap() {
                assert_eq!(found, expected);
            }
        }
    });
}

#[test]
fn shared_evaluator_and_validator_agree_across_threads() {
    let rows = rows();
    let spec = Arc::new(shared_spec());
    let evaluator = Arc::new(SpecificationEvaluator::<Crate, Query<Crate>>::new());
    let validator = Arc::new(SpecificationValidator::<Crate>::new());

    let valid: Vec<bool> = rows.iter().map(|c| spec.is_satisfied_by(c)).collect();
    let criteria = evaluator
        .evaluate_criteria(Query::new(), &spec)
        .unwrap()
        .count(&rows);
    assert_eq!(valid.iter().filter(|v| **v).count(), criteria);

    thread::scope(|scope| {
        for _ in 0..8 {
            let (spec, evaluator, validator) = (spec.clone(), evaluator.clone(), validator.clone());
            let (rows, valid) = (&rows, &valid);
            scope.spawn(move || {
                for (row, expected) in rows.iter().zip(valid) {
                    assert_eq!(validator.is_valid(row, &spec), *expected);
                }
                let count = evaluator
                    .evaluate_criteria(Query::new(), &spec)
                    .unwrap()
                    .count(rows);
                assert_eq!(count, criteria);
            });
        }
    });
}
