//! Property tests for repository reads and staged writes.

use proptest::prelude::*;
use quarry::spec::{Op, Specification};
use quarry::{Entity, GeneratedId, InMemoryRepository, ReadRepository, Record, Repository};

#[derive(Debug, Clone, Record)]
struct Row {
    #[record(Number, readonly)]
    id: u32,
    #[record(Number)]
    score: i64,
}

impl Entity for Row {
    const TYPE_KEY: &'static str = "row";
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }
}

impl GeneratedId for Row {}

fn repo_with(scores: &[i64]) -> InMemoryRepository<Row> {
    let repo = InMemoryRepository::new();
    let rows = scores
        .iter()
        .enumerate()
        .map(|(i, &score)| Row { id: i as u32, score })
        .collect();
    repo.add_range(rows).unwrap();
    repo
}

proptest! {
    #[test]
    fn count_matches_unpaged_list(
        scores in prop::collection::vec(-50i64..50, 0..40),
        threshold in -50i64..50,
    ) {
        let repo = repo_with(&scores);
        let spec = Specification::<Row>::builder()
            .filter(Row::SCORE, Op::Gte, threshold)
            .build();
        let expected = scores.iter().filter(|&&s| s >= threshold).count();
        prop_assert_eq!(repo.count(&spec).unwrap(), expected);
        prop_assert_eq!(repo.list(&spec).unwrap().len(), expected);
        prop_assert_eq!(repo.any(&spec).unwrap(), expected > 0);
    }

    #[test]
    fn commit_is_all_or_none(
        existing in 0usize..10,
        inserts in prop::collection::vec(0u32..20, 0..10),
    ) {
        let repo = repo_with(&vec![0; existing]);
        let mut uow = repo.unit_of_work();
        for &id in &inserts {
            uow.insert(Row { id, score: 1 });
        }

        let mut seen: Vec<u32> = (0..existing as u32).collect();
        let mut clashes = false;
        for &id in &inserts {
            if seen.contains(&id) {
                clashes = true;
            }
            seen.push(id);
        }

        let result = uow.commit();
        if clashes {
            prop_assert!(result.is_err());
            prop_assert_eq!(repo.len(), existing);
        } else {
            prop_assert_eq!(result.unwrap().inserted, inserts.len());
            prop_assert_eq!(repo.len(), existing + inserts.len());
        }
    }
}
