//! Best-first branch-and-bound over a reduced cost matrix.
//!
//! Rows are decided in order. Every node owns a copy of its parent's matrix in
//! which decided rows are consumed and each open row is reduced so that its
//! smallest finite entry is zero; the amounts taken off are the row offsets and
//! their sum is the node's lower bound. Choosing a column commits part of it,
//! after which the column is priced again for the rows still open.
//!
//! The search keeps only the best `beam_width` children of an expansion and is
//! capped in iterations and live nodes, so it returns a good assignment rather
//! than a proven optimum.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::result::{SearchOutcome, Termination};
use super::stats::SearchStatistics;
use super::{CostMatrix, Decision, Pricing};

/// Caps on the work a search may do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    /// Live nodes popped before giving up.
    pub max_iterations: usize,
    /// Live nodes held at once before giving up.
    pub max_live_nodes: usize,
    /// Children kept per expansion; zero behaves as one.
    pub beam_width: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            max_live_nodes: 1_000,
            beam_width: 1,
        }
    }
}

/// A partial assignment with its reduced matrix.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    /// Decisions taken so far, in row order.
    path: Vec<Decision>,
    /// Reduced prices of the open rows.
    matrix: CostMatrix,
    /// Amount taken off each row by reduction.
    offsets: Vec<f64>,
    /// Length already claimed from each column.
    committed: Vec<f64>,
    /// Rows not yet decided.
    open: Vec<bool>,
    /// Unreduced price of the decisions in `path`.
    cost_of_path: f64,
    /// Sum of `offsets` over the open rows.
    lower_bound: f64,
}

impl Node {
    /// The unbranched node: every row open, nothing committed.
    pub(crate) fn root<P: Pricing + ?Sized>(pricing: &P) -> Self {
        let rows = pricing.rows();
        let columns = pricing.columns();
        let mut node = Self {
            path: Vec::with_capacity(rows),
            matrix: CostMatrix::from_fn(rows, columns, |row, column| {
                pricing.price(row, column, 0.0)
            }),
            offsets: vec![0.0; rows],
            committed: vec![0.0; columns],
            open: vec![true; rows],
            cost_of_path: 0.0,
            lower_bound: 0.0,
        };
        node.reduce(pricing);
        node
    }

    /// A copy of `self` with `decision` applied.
    pub(crate) fn child<P: Pricing + ?Sized>(&self, pricing: &P, decision: Decision) -> Self {
        let mut child = self.clone();
        child.apply(pricing, decision);
        child
    }

    /// First row still open.
    pub(crate) fn next_row(&self) -> Option<usize> {
        self.open.iter().position(|open| *open)
    }

    /// Decisions available for the next open row. A row without any finite
    /// column has the single fallback decision.
    pub(crate) fn branches(&self) -> Vec<Decision> {
        let Some(row) = self.next_row() else {
            return Vec::new();
        };
        let branches: Vec<Decision> = self
            .matrix
            .finite_columns(row)
            .map(|column| Decision::reuse(row, column))
            .collect();
        if branches.is_empty() {
            vec![Decision::fabricate(row)]
        } else {
            branches
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.next_row().is_none()
    }

    /// `cost_of_path + lower_bound`.
    pub(crate) fn estimate(&self) -> f64 {
        self.cost_of_path + self.lower_bound
    }

    #[cfg(test)]
    pub(crate) fn matrix(&self) -> &CostMatrix {
        &self.matrix
    }

    pub(crate) fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    fn apply<P: Pricing + ?Sized>(&mut self, pricing: &P, decision: Decision) {
        let row = decision.row;
        let cost = match decision.column {
            Some(column) => self.matrix.get(row, column) + self.offsets[row],
            None => pricing.fallback(row),
        };
        self.cost_of_path += cost;
        self.matrix.consume_row(row);
        self.open[row] = false;

        if let Some(column) = decision.column {
            self.committed[column] += pricing.demand(row);
            let committed = self.committed[column];
            for other in 0..self.open.len() {
                if !self.open[other] {
                    continue;
                }
                let price = pricing.price(other, column, committed);
                let reduced = if price.is_finite() {
                    price - self.offsets[other]
                } else {
                    f64::INFINITY
                };
                self.matrix.set(other, column, reduced);
            }
        }

        self.path.push(decision);
        self.reduce(pricing);
    }

    fn reduce<P: Pricing + ?Sized>(&mut self, pricing: &P) {
        let mut bound = 0.0;
        for row in 0..self.open.len() {
            if !self.open[row] {
                continue;
            }
            match self.matrix.reduce_row(row) {
                Some(min) => {
                    self.offsets[row] += min;
                    bound += self.offsets[row];
                }
                None => bound += pricing.fallback(row),
            }
        }
        self.lower_bound = bound;
    }

    fn into_outcome(
        self,
        rows: usize,
        termination: Termination,
        statistics: SearchStatistics,
    ) -> SearchOutcome {
        SearchOutcome::new(
            self.path,
            self.cost_of_path,
            self.lower_bound,
            rows,
            termination,
            statistics,
        )
    }
}

/// Heap entry ordered so that the smallest estimate pops first, oldest first
/// among equals.
struct Live {
    /// `cost_of_path + lower_bound` of the node.
    estimate: f64,
    /// Insertion number.
    sequence: u64,
    node: Node,
}

impl PartialEq for Live {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Live {}

impl Ord for Live {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for Live {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The live set with insertion numbering.
struct LiveSet {
    heap: BinaryHeap<Live>,
    /// Next insertion number.
    sequence: u64,
}

impl LiveSet {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            sequence: 0,
        }
    }

    fn push(&mut self, node: Node) {
        self.heap.push(Live {
            estimate: node.estimate(),
            sequence: self.sequence,
            node,
        });
        self.sequence += 1;
    }

    fn pop(&mut self) -> Option<Node> {
        self.heap.pop().map(|live| live.node)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Branch-and-bound solver.
///
/// # Examples
/// ```
/// use trussreuse::optimizer::{bnb::BranchAndBound, pricing::MatrixPricing, CostMatrix};
///
/// let costs = CostMatrix::from_row_slice(2, 2, &[3.0, 1.0, 2.0, 5.0]);
/// let outcome = BranchAndBound::default().solve(&MatrixPricing::new(costs));
/// assert!(outcome.is_complete());
/// assert_eq!(outcome.cost_of_path(), 3.0);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct BranchAndBound {
    limits: SearchLimits,
}

impl BranchAndBound {
    /// A solver with the given caps.
    #[must_use]
    pub fn new(limits: SearchLimits) -> Self {
        Self { limits }
    }

    /// The caps in use.
    #[must_use]
    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    /// Search for a low-cost assignment of every row.
    pub fn solve<P: Pricing + ?Sized>(&self, pricing: &P) -> SearchOutcome {
        let start = Instant::now();
        let rows = pricing.rows();
        let mut statistics = SearchStatistics::default();

        let root = Node::root(pricing);
        statistics.set_root_lower_bound(root.lower_bound());
        log::debug!(
            "branch-and-bound over {rows}x{} matrix, root bound {:.3}",
            pricing.columns(),
            root.lower_bound()
        );
        if root.is_complete() {
            statistics.set_total_time(start.elapsed());
            return root.into_outcome(rows, Termination::Complete, statistics);
        }

        let mut live = LiveSet::new();
        for decision in root.branches() {
            live.push(root.child(pricing, decision));
            statistics.on_root_generated();
        }
        statistics.on_live_nodes(live.len());

        let beam_width = self.limits.beam_width.max(1);
        let mut best_leaf: Option<Node> = None;
        let mut termination = Termination::Complete;
        let mut iterations = 0;
        let mut finished: Option<Node> = None;
        if live.len() > self.limits.max_live_nodes {
            termination = Termination::LiveNodeLimit;
        }

        while termination == Termination::Complete {
            let Some(node) = live.pop() else {
                break;
            };
            if iterations >= self.limits.max_iterations {
                live.push(node);
                termination = Termination::IterationLimit;
                break;
            }
            iterations += 1;
            statistics.on_node_explored();

            if let Some(best) = &best_leaf {
                if node.estimate() >= best.cost_of_path && !node.is_complete() {
                    statistics.on_pruning_bound();
                    continue;
                }
            }
            if node.is_complete() {
                finished = Some(node);
                break;
            }

            let mut children: Vec<Node> = node
                .branches()
                .into_iter()
                .map(|decision| node.child(pricing, decision))
                .collect();
            let generated = children.len();
            children.sort_by(|a, b| a.estimate().total_cmp(&b.estimate()));
            children.truncate(beam_width);
            statistics.on_children_generated(generated, children.len());

            for child in children {
                if child.is_complete() {
                    statistics.on_leaf_found();
                    let improves = best_leaf
                        .as_ref()
                        .map_or(true, |best| child.cost_of_path < best.cost_of_path);
                    if improves {
                        best_leaf = Some(child.clone());
                    }
                }
                live.push(child);
            }
            statistics.on_live_nodes(live.len());

            if live.len() > self.limits.max_live_nodes {
                termination = Termination::LiveNodeLimit;
                break;
            }
        }

        let chosen = finished
            .or(best_leaf)
            .or_else(|| live.pop())
            .unwrap_or(root);
        statistics.set_total_time(start.elapsed());

        match termination {
            Termination::Complete => log::debug!(
                "branch-and-bound finished after {iterations} iterations at cost {:.3}",
                chosen.cost_of_path
            ),
            _ => log::warn!(
                "branch-and-bound stopped by {termination} after {iterations} iterations, {}/{rows} rows decided",
                chosen.path.len()
            ),
        }
        chosen.into_outcome(rows, termination, statistics)
    }
}
