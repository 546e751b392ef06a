//! Terminal projections from `T` to `R`.

use std::fmt;
use std::sync::Arc;

/// A `select` or `select_many` transform.
pub enum Selector<T, R> {
    One(Arc<dyn Fn(&T) -> R + Send + Sync>),
    Many(Arc<dyn Fn(&T) -> Vec<R> + Send + Sync>),
}

impl<T, R> Selector<T, R> {
    pub fn one<F>(f: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        Selector::One(Arc::new(f))
    }

    pub fn many<F>(f: F) -> Self
    where
        F: Fn(&T) -> Vec<R> + Send + Sync + 'static,
    {
        Selector::Many(Arc::new(f))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Selector::One(_) => "select",
            Selector::Many(_) => "select_many",
        }
    }

    /// Projects `item`, appending the result(s) to `out`.
    pub fn project_into(&self, item: &T, out: &mut Vec<R>) {
        match self {
            Selector::One(f) => out.push(f(item)),
            Selector::Many(f) => out.extend(f(item)),
        }
    }

    /// Projects a sequence, flattening `select_many` results.
    pub fn project_all<'a, I>(&self, items: I) -> Vec<R>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut out = Vec::new();
        for item in items {
            self.project_into(item, &mut out);
        }
        out
    }
}

impl<T, R> Clone for Selector<T, R> {
    fn clone(&self) -> Self {
        match self {
            Selector::One(f) => Selector::One(Arc::clone(f)),
            Selector::Many(f) => Selector::Many(Arc::clone(f)),
        }
    }
}

impl<T, R> fmt::Debug for Selector<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}
