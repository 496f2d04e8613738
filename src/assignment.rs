//! How stock pieces were assigned to members.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// One stock piece supplying one member.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Insertion {
    /// Member index in the structure.
    pub member: usize,
    /// Stock index in the bank as it was before any cut of the plan.
    pub stock: usize,
    /// Length taken from the stock piece in mm.
    pub length: f64,
}

/// Stock-row × member-column table of assigned lengths.
///
/// A cell holds the length cut from stock `row` for member `column`, or zero.
/// Each column has at most one non-zero cell; a row may have several when
/// off-cuts are reused.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertionMatrix {
    cells: DMatrix<f64>,
}

impl InsertionMatrix {
    /// An empty assignment for `stock_count` pieces and `member_count` members.
    #[must_use]
    pub fn new(stock_count: usize, member_count: usize) -> Self {
        Self {
            cells: DMatrix::zeros(stock_count, member_count),
        }
    }

    /// Record every insertion; entries outside the table are ignored.
    #[must_use]
    pub fn from_insertions(
        stock_count: usize,
        member_count: usize,
        insertions: &[Insertion],
    ) -> Self {
        let mut matrix = Self::new(stock_count, member_count);
        for insertion in insertions {
            if insertion.stock < stock_count && insertion.member < member_count {
                matrix.cells[(insertion.stock, insertion.member)] = insertion.length;
            }
        }
        matrix
    }

    /// Number of stock rows.
    #[must_use]
    pub fn stock_count(&self) -> usize {
        self.cells.nrows()
    }

    /// Number of member columns.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.cells.ncols()
    }

    /// Length assigned from `stock` to `member`.
    #[must_use]
    pub fn get(&self, stock: usize, member: usize) -> f64 {
        self.cells
            .get((stock, member))
            .copied()
            .unwrap_or_default()
    }

    /// Stock row supplying `member`, if any.
    #[must_use]
    pub fn assigned_stock(&self, member: usize) -> Option<usize> {
        if member >= self.member_count() {
            return None;
        }
        self.cells
            .column(member)
            .iter()
            .position(|length| *length > 0.0)
    }

    /// Number of members supplied from stock.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        (0..self.member_count())
            .filter(|member| self.assigned_stock(*member).is_some())
            .count()
    }

    /// The underlying matrix.
    #[must_use]
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_lengths_by_stock_and_member() {
        let insertions = [
            Insertion {
                member: 2,
                stock: 0,
                length: 1_000.0,
            },
            Insertion {
                member: 0,
                stock: 0,
                length: 400.0,
            },
        ];
        let matrix = InsertionMatrix::from_insertions(2, 3, &insertions);
        assert_eq!(matrix.get(0, 2), 1_000.0);
        assert_eq!(matrix.assigned_stock(0), Some(0));
        assert_eq!(matrix.assigned_stock(1), None);
        assert_eq!(matrix.assigned_stock(9), None);
        assert_eq!(matrix.assigned_count(), 2);
    }
}
