//! Assignment of stock pieces to members.
//!
//! Rows are members and columns are stock pieces. Prices come from a
//! [`Pricing`] implementation and may depend on how much of a piece earlier
//! decisions already committed. `f64::INFINITY` marks a pairing that must not
//! be chosen.

pub mod bnb;
pub mod greedy;
pub mod pricing;
pub mod result;
pub mod stats;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Cost of every pairing of a row with a column.
pub trait Pricing {
    /// Number of rows to decide.
    fn rows(&self) -> usize;

    /// Number of columns on offer.
    fn columns(&self) -> usize;

    /// Cost of giving `column` to `row` once `committed` of the column has
    /// been taken by earlier decisions; `f64::INFINITY` when not allowed.
    fn price(&self, row: usize, column: usize, committed: f64) -> f64;

    /// Amount of a column that `row` consumes.
    fn demand(&self, _row: usize) -> f64 {
        1.0
    }

    /// Cost of deciding `row` without any column.
    fn fallback(&self, _row: usize) -> f64 {
        0.0
    }
}

/// What to do with one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decision {
    /// The row being decided.
    pub row: usize,
    /// The column supplying it, `None` for the fallback.
    pub column: Option<usize>,
}

impl Decision {
    /// Supply `row` from `column`.
    #[must_use]
    pub const fn reuse(row: usize, column: usize) -> Self {
        Self {
            row,
            column: Some(column),
        }
    }

    /// Decide `row` at its fallback cost.
    #[must_use]
    pub const fn fabricate(row: usize) -> Self {
        Self { row, column: None }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.column {
            Some(column) => write!(f, "row {} <- column {}", self.row, column),
            None => write!(f, "row {} <- new", self.row),
        }
    }
}

/// A sequence of decisions and its total cost.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Decisions in the order they were taken.
    pub decisions: Vec<Decision>,
    /// Sum of the decision costs.
    pub cost: f64,
}

impl Assignment {
    /// Whether every one of `rows` rows is decided.
    #[must_use]
    pub fn covers(&self, rows: usize) -> bool {
        let mut decided = vec![false; rows];
        for decision in &self.decisions {
            if let Some(flag) = decided.get_mut(decision.row) {
                *flag = true;
            }
        }
        decided.into_iter().all(|flag| flag)
    }

    /// Column chosen for `row`, if any.
    #[must_use]
    pub fn column_of(&self, row: usize) -> Option<usize> {
        self.decisions
            .iter()
            .find(|decision| decision.row == row)
            .and_then(|decision| decision.column)
    }

    /// `(row, column)` pairs that use a column, in decision order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.decisions
            .iter()
            .filter_map(|decision| decision.column.map(|column| (decision.row, column)))
    }
}

/// Dense row × column cost table; consumed or forbidden cells hold `+∞`.
#[derive(Clone, Debug, PartialEq)]
pub struct CostMatrix {
    cells: DMatrix<f64>,
}

impl CostMatrix {
    /// A matrix with every cell forbidden.
    #[must_use]
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            cells: DMatrix::from_element(rows, columns, f64::INFINITY),
        }
    }

    /// Build from a cell function.
    pub fn from_fn(rows: usize, columns: usize, f: impl FnMut(usize, usize) -> f64) -> Self {
        Self {
            cells: DMatrix::from_fn(rows, columns, f),
        }
    }

    /// Build from values listed row by row.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not hold `rows * columns` entries.
    #[must_use]
    pub fn from_row_slice(rows: usize, columns: usize, values: &[f64]) -> Self {
        Self {
            cells: DMatrix::from_row_slice(rows, columns, values),
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    /// Number of columns.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.cells.ncols()
    }

    /// Value of a cell; out-of-range cells read as `+∞`.
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.cells
            .get((row, column))
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    /// Overwrite a cell; out-of-range writes are ignored.
    pub fn set(&mut self, row: usize, column: usize, value: f64) {
        if let Some(cell) = self.cells.get_mut((row, column)) {
            *cell = value;
        }
    }

    /// Forbid every cell of `row`.
    pub fn consume_row(&mut self, row: usize) {
        if row < self.rows() {
            self.cells.row_mut(row).fill(f64::INFINITY);
        }
    }

    /// Smallest finite value of `row`.
    #[must_use]
    pub fn row_min(&self, row: usize) -> Option<f64> {
        if row >= self.rows() {
            return None;
        }
        self.cells
            .row(row)
            .iter()
            .copied()
            .filter(|value| value.is_finite())
            .min_by(f64::total_cmp)
    }

    /// Subtract the smallest finite value of `row` from its finite cells and
    /// return it. An all-forbidden row is left alone.
    pub fn reduce_row(&mut self, row: usize) -> Option<f64> {
        let min = self.row_min(row)?;
        for value in self.cells.row_mut(row).iter_mut() {
            if value.is_finite() {
                *value -= min;
            }
        }
        Some(min)
    }

    /// Columns of `row` that may still be chosen.
    pub fn finite_columns(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        (0..self.columns()).filter(move |column| self.get(row, *column).is_finite())
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

    const INF: f64 = f64::INFINITY;

    #[test]
    fn reducing_a_row_leaves_a_zero_minimum() {
        let mut matrix = CostMatrix::from_row_slice(2, 3, &[4.0, INF, 7.0, INF, INF, INF]);
        assert_eq!(matrix.reduce_row(0), Some(4.0));
        assert_eq!(matrix.row_min(0), Some(0.0));
        assert_eq!(matrix.get(0, 2), 3.0);
        assert!(matrix.get(0, 1).is_infinite());

        assert_eq!(matrix.reduce_row(1), None);
        assert_eq!(matrix.finite_columns(1).count(), 0);
    }

    #[test]
    fn consumed_rows_and_out_of_range_cells_are_forbidden() {
        let mut matrix = CostMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        matrix.consume_row(0);
        assert_eq!(matrix.row_min(0), None);
        assert!(matrix.get(5, 5).is_infinite());
        matrix.set(5, 5, 1.0);
        assert_eq!(matrix.rows(), 1);
    }

    #[test]
    fn assignment_reports_coverage_and_pairs() {
        let assignment = Assignment {
            decisions: vec![Decision::reuse(1, 0), Decision::fabricate(0)],
            cost: 3.0,
        };
        assert!(assignment.covers(2));
        assert!(!assignment.covers(3));
        assert_eq!(assignment.column_of(1), Some(0));
        assert_eq!(assignment.column_of(0), None);
        assert_eq!(assignment.pairs().collect::<Vec<_>>(), vec![(1, 0)]);
        assert_eq!(Decision::fabricate(4).to_string(), "row 4 <- new");
    }
}
