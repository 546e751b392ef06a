//! Skip and take, with the limits a store enforces on top of them.

use tracing::{debug, warn};

use super::Evaluator;
use crate::error::{Result, SpecError};
use crate::queryable::Queryable;
use crate::specification::{ReturnType, Specification};

/// Applies `skip` then `take`.
///
/// Besides the declared values this evaluator enforces two limits:
///
/// - `max_take` caps every `take`, and supplies one when none is declared
/// - a single-result specification never takes more than one row
///
/// Paging without any ordering is nondeterministic on most stores. The
/// lenient default logs a warning; [`PagingEvaluator::strict`] rejects it
/// with [`SpecError::UnorderedPaging`]. Only declared paging is checked, a
/// take supplied by `max_take` or the single-result guard is not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PagingEvaluator {
    strict: bool,
    max_take: Option<usize>,
}

impl PagingEvaluator {
    /// Warns on unordered paging instead of failing.
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Rejects paging without ordering.
    pub fn strict() -> Self {
        Self {
            strict: true,
            max_take: None,
        }
    }

    /// Caps every take at `max_take`; `None` removes the cap.
    pub fn with_max_take(mut self, max_take: Option<usize>) -> Self {
        self.max_take = max_take;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn max_take(&self) -> Option<usize> {
        self.max_take
    }

    /// The take actually applied for `spec`.
    pub fn effective_take<T>(&self, spec: &Specification<T>) -> Option<usize> {
        let take = match (spec.take(), self.max_take) {
            (Some(take), Some(max)) => Some(take.min(max)),
            (None, max) => max,
            (take, None) => take,
        };
        match spec.return_type() {
            ReturnType::Single => Some(take.map_or(1, |t| t.min(1))),
            ReturnType::Collection => take,
        }
    }
}

impl<T, Q: Queryable<T>> Evaluator<T, Q> for PagingEvaluator {
    fn name(&self) -> &'static str {
        "paging"
    }

    fn application_order(&self) -> i32 {
        700
    }

    fn evaluate(&self, query: Q, spec: &Specification<T>) -> Result<Q> {
        if spec.is_paged() && !spec.has_ordering() {
            if self.strict {
                return Err(SpecError::UnorderedPaging);
            }
            warn!(
                skip = ?spec.skip(),
                take = ?spec.take(),
                "paging applied without ordering; result order depends on the store"
            );
        }

        let take = self.effective_take(spec);
        if take != spec.take() {
            if spec.return_type() == ReturnType::Single && spec.take().is_some_and(|t| t > 1) {
                warn!(declared = ?spec.take(), "single-result specification limited to one row");
            } else {
                debug!(declared = ?spec.take(), applied = ?take, "take clamped");
            }
        }

        let query = match spec.skip() {
            Some(skip) => query.skip(skip),
            None => query,
        };
        Ok(match take {
            Some(take) => query.take(take),
            None => query,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queryable::Query;

    #[derive(Debug)]
    struct Row;

    fn plan(paging: PagingEvaluator, spec: &Specification<Row>) -> Result<Vec<String>> {
        Ok(paging.evaluate(Query::new(), spec)?.plan())
    }

    #[test]
    fn skip_before_take() {
        let spec = Specification::<Row>::builder()
            .take(2)
            .skip(3)
            .order_by("id")
            .build();
        assert_eq!(
            plan(PagingEvaluator::default(), &spec).unwrap(),
            vec!["skip 3", "take 2"]
        );
    }

    #[test]
    fn unordered_paging_lenient_and_strict() {
        let spec = Specification::<Row>::builder().take(2).build();
        assert_eq!(
            plan(PagingEvaluator::lenient(), &spec).unwrap(),
            vec!["take 2"]
        );
        assert!(matches!(
            plan(PagingEvaluator::strict(), &spec),
            Err(SpecError::UnorderedPaging)
        ));
    }

    #[test]
    fn strict_ignores_unpaged_specs() {
        let spec = Specification::<Row>::builder().single().build();
        assert_eq!(
            plan(PagingEvaluator::strict(), &spec).unwrap(),
            vec!["take 1"]
        );
    }

    #[test]
    fn single_clamps_take() {
        let spec = Specification::<Row>::builder()
            .order_by("id")
            .take(10)
            .skip(4)
            .single()
            .build();
        assert_eq!(
            plan(PagingEvaluator::default(), &spec).unwrap(),
            vec!["skip 4", "take 1"]
        );

        let spec = Specification::<Row>::builder()
            .order_by("id")
            .take(0)
            .single()
            .build();
        assert_eq!(PagingEvaluator::default().effective_take(&spec), Some(0));
    }

    #[test]
    fn max_take_caps_and_supplies() {
        let paging = PagingEvaluator::lenient().with_max_take(Some(50));
        let unbounded = Specification::<Row>::new();
        assert_eq!(paging.effective_take(&unbounded), Some(50));

        let large = Specification::<Row>::builder().order_by("id").take(500).build();
        assert_eq!(paging.effective_take(&large), Some(50));

        let small = Specification::<Row>::builder().order_by("id").take(5).build();
        assert_eq!(paging.effective_take(&small), Some(5));
    }
}
