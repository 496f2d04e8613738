//! What a search hands back.

use super::stats::SearchStatistics;
use super::{Assignment, Decision};

/// Why the search stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    /// A full-depth node was the best live node, or nothing was left to explore.
    Complete,
    /// The iteration cap was reached.
    IterationLimit,
    /// The live set outgrew its cap.
    LiveNodeLimit,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Complete => write!(f, "complete"),
            Termination::IterationLimit => write!(f, "iteration limit"),
            Termination::LiveNodeLimit => write!(f, "live-node limit"),
        }
    }
}

/// Result of a branch-and-bound run.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    /// Decisions of the returned node.
    path: Vec<Decision>,
    /// Price of those decisions.
    cost_of_path: f64,
    /// Remaining lower bound of the returned node.
    lower_bound: f64,
    /// Rows in the problem.
    rows: usize,
    termination: Termination,
    statistics: SearchStatistics,
}

impl SearchOutcome {
    pub(crate) fn new(
        path: Vec<Decision>,
        cost_of_path: f64,
        lower_bound: f64,
        rows: usize,
        termination: Termination,
        statistics: SearchStatistics,
    ) -> Self {
        Self {
            path,
            cost_of_path,
            lower_bound,
            rows,
            termination,
            statistics,
        }
    }

    /// Decisions of the returned node, in order.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &[Decision] {
        &self.path
    }

    /// Cost of the decisions taken.
    #[inline]
    #[must_use]
    pub fn cost_of_path(&self) -> f64 {
        self.cost_of_path
    }

    /// Bound on the cost of the rows still open; zero for a full path.
    #[inline]
    #[must_use]
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    /// Whether every row is decided.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.path.len() == self.rows
    }

    /// Why the search stopped.
    #[inline]
    #[must_use]
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Counters of the run.
    #[inline]
    #[must_use]
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// The path as an assignment.
    #[must_use]
    pub fn assignment(&self) -> Assignment {
        Assignment {
            decisions: self.path.clone(),
            cost: self.cost_of_path,
        }
    }
}

impl std::fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Search stopped ({}) with {}/{} rows decided at cost {:.3}",
            self.termination,
            self.path.len(),
            self.rows,
            self.cost_of_path
        )?;
        write!(f, "{}", self.statistics)
    }
}
