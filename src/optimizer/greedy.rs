//! Rank-and-lock heuristic.
//!
//! Each pass takes the cell with the largest saving over the row's fallback,
//! locks that row and prices the chosen column again for the rows still open.
//! Ties go to the lowest row, then the lowest column.

use super::{Assignment, CostMatrix, Decision, Pricing};

/// Decide every row greedily.
///
/// # Examples
/// ```
/// use trussreuse::optimizer::{greedy, pricing::MatrixPricing, CostMatrix};
///
/// let costs = CostMatrix::from_row_slice(2, 2, &[3.0, 1.0, 2.0, 5.0]);
/// let assignment = greedy::solve(&MatrixPricing::new(costs));
/// assert_eq!(assignment.cost, 3.0);
/// ```
pub fn solve<P: Pricing + ?Sized>(pricing: &P) -> Assignment {
    complete(pricing, &[])
}

/// Decide the rows `prefix` leaves open, keeping `prefix` as taken.
///
/// The prefix is replayed in order so that later prices see the length it
/// committed. Rows left without any finite cell fall back.
pub fn complete<P: Pricing + ?Sized>(pricing: &P, prefix: &[Decision]) -> Assignment {
    let rows = pricing.rows();
    let columns = pricing.columns();
    let mut committed = vec![0.0; columns];
    let mut decided = vec![false; rows];
    let mut decisions = Vec::with_capacity(rows);
    let mut cost = 0.0;

    for decision in prefix {
        if decision.row >= rows || decided[decision.row] {
            continue;
        }
        decided[decision.row] = true;
        match decision.column {
            Some(column) if column < columns => {
                cost += pricing.price(decision.row, column, committed[column]);
                committed[column] += pricing.demand(decision.row);
            }
            _ => cost += pricing.fallback(decision.row),
        }
        decisions.push(*decision);
    }

    let fallbacks: Vec<f64> = (0..rows).map(|row| pricing.fallback(row)).collect();
    let mut matrix = CostMatrix::from_fn(rows, columns, |row, column| {
        if decided[row] {
            f64::INFINITY
        } else {
            pricing.price(row, column, committed[column])
        }
    });

    while let Some((row, column, price)) = best_cell(&matrix, &fallbacks) {
        cost += price;
        decided[row] = true;
        decisions.push(Decision::reuse(row, column));
        matrix.consume_row(row);
        committed[column] += pricing.demand(row);
        for other in (0..rows).filter(|other| !decided[*other]) {
            matrix.set(other, column, pricing.price(other, column, committed[column]));
        }
    }

    for row in (0..rows).filter(|row| !decided[*row]) {
        cost += fallbacks[row];
        decisions.push(Decision::fabricate(row));
    }
    log::debug!(
        "greedy decided {rows} rows, {} from columns, cost {cost:.3}",
        decisions.iter().filter(|d| d.column.is_some()).count()
    );

    Assignment { decisions, cost }
}

fn best_cell(matrix: &CostMatrix, fallbacks: &[f64]) -> Option<(usize, usize, f64)> {
    let mut best: Option<(usize, usize, f64, f64)> = None;
    for row in 0..matrix.rows() {
        for column in matrix.finite_columns(row) {
            let price = matrix.get(row, column);
            let saving = fallbacks[row] - price;
            if best.map_or(true, |(_, _, _, top)| saving > top) {
                best = Some((row, column, price, saving));
            }
        }
    }
    best.map(|(row, column, price, _)| (row, column, price))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::pricing::MatrixPricing;

    const INF: f64 = f64::INFINITY;

    fn pricing(rows: usize, columns: usize, values: &[f64]) -> MatrixPricing {
        MatrixPricing::new(CostMatrix::from_row_slice(rows, columns, values))
    }

    #[test]
    fn picks_cheapest_cells_first() {
        let assignment = solve(&pricing(2, 2, &[1.0, 2.0, 1.0, 100.0]));
        assert_eq!(
            assignment.decisions,
            vec![Decision::reuse(0, 0), Decision::reuse(1, 1)]
        );
        assert_eq!(assignment.cost, 101.0);
    }

    #[test]
    fn ties_prefer_lowest_row_then_column() {
        let assignment = solve(&pricing(2, 2, &[0.0, 0.0, 0.0, 0.0]));
        assert_eq!(
            assignment.decisions,
            vec![Decision::reuse(0, 0), Decision::reuse(1, 1)]
        );
    }

    #[test]
    fn rows_without_columns_fall_back() {
        let assignment = solve(&pricing(2, 1, &[INF, 4.0]));
        assert_eq!(
            assignment.decisions,
            vec![Decision::reuse(1, 0), Decision::fabricate(0)]
        );
        assert!(assignment.covers(2));
        assert_eq!(assignment.cost, 4.0);
    }

    #[test]
    fn completion_keeps_the_prefix() {
        let costs = pricing(2, 2, &[5.0, 1.0, 2.0, 3.0]);
        let assignment = complete(&costs, &[Decision::reuse(0, 0)]);
        assert_eq!(
            assignment.decisions,
            vec![Decision::reuse(0, 0), Decision::reuse(1, 1)]
        );
        assert_eq!(assignment.cost, 8.0);
    }
}
