//! Singleton pivot search.

use super::strategy::{Pivot, PivotContext, PivotQuality, SearchStrategy};
use crate::numeric::Scalar;

/// Picks a row or column with a single remaining element.
///
/// Pivoting on a singleton creates no fill-in, so this always runs first.
#[derive(Debug, Default, Clone)]
pub struct SingletonSearch;

impl SingletonSearch {
    pub fn new() -> Self {
        Self
    }
}

impl<T: Scalar> SearchStrategy<T> for SingletonSearch {
    fn name(&self) -> &'static str {
        "singleton"
    }

    fn find_pivot(&mut self, context: &PivotContext<'_, T>) -> Option<Pivot> {
        let counts = context.counts;
        if counts.singletons() == 0 {
            return None;
        }

        for index in context.search_order() {
            if counts.product(index) != 0 {
                continue;
            }

            if let Some(diagonal) = context.matrix.diagonal(index) {
                if context.is_acceptable(diagonal) {
                    return Some(Pivot::new(diagonal, PivotQuality::Good));
                }
                continue;
            }

            // The singleton is off the diagonal, in column or row `index`
            if counts.column_count(index) == 0 {
                if let Some(candidate) = context.reduced_column(index).next() {
                    if context.is_acceptable(candidate) {
                        return Some(Pivot::new(candidate, PivotQuality::Good));
                    }
                }
            }
            if counts.row_count(index) == 0 {
                if let Some(candidate) = context.reduced_row(index).next() {
                    if context.is_acceptable(candidate) {
                        return Some(Pivot::new(candidate, PivotQuality::Good));
                    }
                }
            }
        }
        None
    }
}
