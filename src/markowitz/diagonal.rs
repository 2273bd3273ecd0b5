//! Careful diagonal pivot search.

use super::strategy::{Pivot, PivotContext, PivotQuality, SearchStrategy};
use crate::numeric::Scalar;
use crate::solver::DEFAULT_TIES_MULTIPLIER;

/// Tests every diagonal numerically before considering its product.
#[derive(Debug, Clone)]
pub struct DiagonalSearch {
    ties_multiplier: usize,
}

impl Default for DiagonalSearch {
    fn default() -> Self {
        Self::new(DEFAULT_TIES_MULTIPLIER)
    }
}

impl DiagonalSearch {
    pub fn new(ties_multiplier: usize) -> Self {
        Self { ties_multiplier }
    }
}

impl<T: Scalar> SearchStrategy<T> for DiagonalSearch {
    fn name(&self) -> &'static str {
        "diagonal"
    }

    fn find_pivot(&mut self, context: &PivotContext<'_, T>) -> Option<Pivot> {
        let mut chosen = None;
        let mut min_product = usize::MAX;
        let mut accepted_ratio = 0.0;
        let mut ties = 0usize;

        for index in context.search_order() {
            let product = context.counts.product(index);
            if product > min_product {
                continue;
            }
            let Some(diagonal) = context.matrix.diagonal(index) else {
                continue;
            };
            let magnitude = context.magnitude(diagonal);
            if magnitude <= context.absolute_threshold {
                continue;
            }
            let largest = context.largest_in_column_excluding(diagonal);
            if magnitude <= context.relative_threshold * largest {
                continue;
            }

            let ratio = largest / magnitude;
            if product < min_product {
                chosen = Some(diagonal);
                min_product = product;
                accepted_ratio = ratio;
                ties = 0;
            } else {
                ties += 1;
                if ratio < accepted_ratio {
                    chosen = Some(diagonal);
                    accepted_ratio = ratio;
                }
                if ties >= min_product.saturating_mul(self.ties_multiplier) {
                    return chosen.map(|element| Pivot::new(element, PivotQuality::Suboptimal));
                }
            }
        }

        chosen.map(|element| Pivot::new(element, PivotQuality::Good))
    }
}
