//! [`Pricing`] implementations.

use crate::assignment::Insertion;
use crate::bank::MaterialBank;
use crate::lca::{local_cost, new_emission, LcaFactors, Substitution};
use crate::structure::Structure;

use super::{CostMatrix, Decision, Pricing};

/// A fixed cost table in which each column serves one row.
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixPricing {
    costs: CostMatrix,
}

impl MatrixPricing {
    /// Price from `costs`; `+∞` cells are forbidden.
    #[must_use]
    pub fn new(costs: CostMatrix) -> Self {
        Self { costs }
    }

    /// The table.
    #[must_use]
    pub fn costs(&self) -> &CostMatrix {
        &self.costs
    }
}

impl Pricing for MatrixPricing {
    fn rows(&self) -> usize {
        self.costs.rows()
    }

    fn columns(&self) -> usize {
        self.costs.columns()
    }

    fn price(&self, row: usize, column: usize, committed: f64) -> f64 {
        if committed > 0.0 {
            f64::INFINITY
        } else {
            self.costs.get(row, column)
        }
    }
}

/// Carbon pricing of members (rows) against available stock (columns).
///
/// A cell is the emission of supplying the member from whatever length of the
/// piece is left. It is `+∞` when the bank ranks the piece infeasible for the
/// member, when what is left is too short or too weak, when reuse would not
/// beat fabricating new, and for any second use of a piece whose off-cuts are
/// not kept or whose remainder is below the minimum reusable length. The
/// fallback of a row is the emission of fabricating the member new.
#[derive(Debug)]
pub struct LcaPricing<'a> {
    /// Analysed structure; members are the rows.
    structure: &'a Structure,
    /// Bank before any cut.
    bank: &'a MaterialBank,
    factors: LcaFactors,
    /// Whether a piece may serve more than one member.
    keep_offcut: bool,
    /// Bank index of each column.
    stock: Vec<usize>,
    /// Row × column result of `find_feasible` on the full pieces.
    feasible: Vec<Vec<bool>>,
    /// Fallback of each row.
    new_emissions: Vec<f64>,
}

impl<'a> LcaPricing<'a> {
    /// Price `structure`'s members, using their current axial forces, against
    /// the available stock of `bank`.
    #[must_use]
    pub fn new(
        structure: &'a Structure,
        bank: &'a MaterialBank,
        factors: LcaFactors,
        keep_offcut: bool,
    ) -> Self {
        let stock: Vec<usize> = bank.available().map(|(index, _)| index).collect();
        let feasible = structure
            .members()
            .map(|member| {
                let ranked = bank.find_feasible(member, member.axial_force());
                stock.iter().map(|index| ranked.contains(index)).collect()
            })
            .collect();
        let new_emissions = structure
            .members()
            .map(|member| new_emission(member, &factors))
            .collect();
        Self {
            structure,
            bank,
            factors,
            keep_offcut,
            stock,
            feasible,
            new_emissions,
        }
    }

    /// Bank index behind `column`.
    #[must_use]
    pub fn stock_index(&self, column: usize) -> Option<usize> {
        self.stock.get(column).copied()
    }

    /// The full priced matrix before any commitment.
    #[must_use]
    pub fn cost_matrix(&self) -> CostMatrix {
        CostMatrix::from_fn(self.rows(), self.columns(), |row, column| {
            self.price(row, column, 0.0)
        })
    }

    /// Translate reuse decisions into cuts against the bank.
    #[must_use]
    pub fn insertions(&self, decisions: &[Decision]) -> Vec<Insertion> {
        decisions
            .iter()
            .filter_map(|decision| {
                let stock = self.stock_index(decision.column?)?;
                let member = self.structure.member(decision.row)?;
                Some(Insertion {
                    member: decision.row,
                    stock,
                    length: member.length(),
                })
            })
            .collect()
    }
}

impl Pricing for LcaPricing<'_> {
    fn rows(&self) -> usize {
        self.structure.member_count()
    }

    fn columns(&self) -> usize {
        self.stock.len()
    }

    fn price(&self, row: usize, column: usize, committed: f64) -> f64 {
        let gated = self
            .feasible
            .get(row)
            .and_then(|columns| columns.get(column))
            .copied()
            .unwrap_or(false);
        if !gated || (committed > 0.0 && !self.keep_offcut) {
            return f64::INFINITY;
        }
        let (Some(member), Some(candidate)) = (
            self.structure.member(row),
            self.stock_index(column)
                .and_then(|index| self.bank.candidate(index)),
        ) else {
            return f64::INFINITY;
        };
        let remaining = candidate.with_length(candidate.length - committed);
        if committed > 0.0 && remaining.length < remaining.min_reusable_length {
            return f64::INFINITY;
        }
        if !remaining.fits(member.length()) {
            return f64::INFINITY;
        }
        match local_cost(member, &remaining, member.axial_force(), &self.factors) {
            Substitution::Feasible {
                new_emission,
                reuse_emission,
            } if new_emission > reuse_emission => reuse_emission,
            _ => f64::INFINITY,
        }
    }

    fn demand(&self, row: usize) -> f64 {
        self.structure
            .member(row)
            .map_or(0.0, |member| member.length())
    }

    fn fallback(&self, row: usize) -> f64 {
        self.new_emissions.get(row).copied().unwrap_or_default()
    }
}
