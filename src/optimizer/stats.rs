//! Search counters.

use std::time::Duration;

/// Counters collected by [`BranchAndBound`](super::bnb::BranchAndBound).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchStatistics {
    /// Live nodes popped and examined.
    pub nodes_explored: u64,
    /// Nodes created for the first row.
    pub roots_generated: u64,
    /// Nodes created by expansion, before narrowing.
    pub children_generated: u64,
    /// Children discarded by narrowing.
    pub children_discarded: u64,
    /// Nodes dropped because their estimate could not beat the best leaf.
    pub prunings_bound: u64,
    /// Full-depth nodes reached.
    pub leaves_found: u64,
    /// Largest live set seen.
    pub peak_live_nodes: usize,
    /// Wall time spent searching.
    pub time_total: Duration,
    /// Lower bound of the unbranched, reduced matrix.
    pub root_lower_bound: f64,
}

impl SearchStatistics {
    /// Count an examined node.
    #[inline]
    pub fn on_node_explored(&mut self) {
        self.nodes_explored = self.nodes_explored.saturating_add(1);
    }

    /// Count a root node.
    #[inline]
    pub fn on_root_generated(&mut self) {
        self.roots_generated = self.roots_generated.saturating_add(1);
    }

    /// Count `generated` children of which `kept` survived narrowing.
    #[inline]
    pub fn on_children_generated(&mut self, generated: usize, kept: usize) {
        self.children_generated = self.children_generated.saturating_add(generated as u64);
        self.children_discarded = self
            .children_discarded
            .saturating_add(generated.saturating_sub(kept) as u64);
    }

    /// Count a node dropped by the bound.
    #[inline]
    pub fn on_pruning_bound(&mut self) {
        self.prunings_bound = self.prunings_bound.saturating_add(1);
    }

    /// Count a full-depth node.
    #[inline]
    pub fn on_leaf_found(&mut self) {
        self.leaves_found = self.leaves_found.saturating_add(1);
    }

    /// Track the size of the live set.
    #[inline]
    pub fn on_live_nodes(&mut self, live: usize) {
        self.peak_live_nodes = self.peak_live_nodes.max(live);
    }

    /// Record the search duration.
    #[inline]
    pub fn set_total_time(&mut self, duration: Duration) {
        self.time_total = duration;
    }

    /// Record the bound of the unbranched matrix.
    #[inline]
    pub fn set_root_lower_bound(&mut self, bound: f64) {
        self.root_lower_bound = bound;
    }
}

impl std::fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Branch-and-bound statistics:")?;
        writeln!(f, "  Nodes explored:       {}", self.nodes_explored)?;
        writeln!(f, "  Roots generated:      {}", self.roots_generated)?;
        writeln!(f, "  Children generated:   {}", self.children_generated)?;
        writeln!(f, "  Children discarded:   {}", self.children_discarded)?;
        writeln!(f, "  Prunings (bound):     {}", self.prunings_bound)?;
        writeln!(f, "  Leaves found:         {}", self.leaves_found)?;
        writeln!(f, "  Peak live nodes:      {}", self.peak_live_nodes)?;
        writeln!(f, "  Root lower bound:     {:.3}", self.root_lower_bound)?;
        writeln!(f, "  Total time:           {:.2?}", self.time_total)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrowing_counts_discarded_children() {
        let mut stats = SearchStatistics::default();
        stats.on_children_generated(4, 1);
        stats.on_children_generated(1, 1);
        stats.on_live_nodes(3);
        stats.on_live_nodes(2);
        assert_eq!(stats.children_generated, 5);
        assert_eq!(stats.children_discarded, 3);
        assert_eq!(stats.peak_live_nodes, 3);
        assert!(stats.to_string().contains("Children discarded:   3"));
    }
}
