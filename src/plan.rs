//! Analyse, assign stock, cut, and re-analyse.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::assignment::{Insertion, InsertionMatrix};
use crate::bank::MaterialBank;
use crate::errors::Error;
use crate::lca::{local_cost, sequence_cost, GlobalCost, LcaFactors};
use crate::loads::Loads;
use crate::optimizer::bnb::{BranchAndBound, SearchLimits};
use crate::optimizer::greedy;
use crate::optimizer::pricing::LcaPricing;
use crate::optimizer::result::SearchOutcome;
use crate::optimizer::Assignment;
use crate::structure::{MassSummary, Structure};

/// How the assignment is searched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Rank-and-lock heuristic only.
    Greedy,
    /// Branch-and-bound, completed greedily if stopped early.
    BranchAndBound,
    /// Run both and keep the lower emission; branch-and-bound wins ties.
    #[default]
    Best,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Greedy => write!(f, "greedy"),
            Strategy::BranchAndBound => write!(f, "branch-and-bound"),
            Strategy::Best => write!(f, "best of both"),
        }
    }
}

/// Planner configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
    /// Search strategy.
    pub strategy: Strategy,
    /// Caps for branch-and-bound.
    pub limits: SearchLimits,
    /// Emission factors.
    pub factors: LcaFactors,
    /// Keep off-cuts in the bank and offer them to later members.
    pub keep_offcuts: bool,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            limits: SearchLimits::default(),
            factors: LcaFactors::default(),
            keep_offcuts: true,
        }
    }
}

/// Result of [`Planner::plan`].
#[derive(Clone, Debug)]
pub struct Plan {
    /// Cuts applied to the bank, in the order they were made. Stock indices
    /// refer to the bank as it was before planning.
    pub insertions: Vec<Insertion>,
    /// The same cuts as a stock × member table.
    pub insertion_matrix: InsertionMatrix,
    /// Members left for new fabrication.
    pub unassigned: Vec<usize>,
    /// Emission of the plan against the all-new baseline.
    pub cost: GlobalCost,
    /// Masses of the re-analysed structure.
    pub masses: MassSummary,
    /// Strategy whose assignment was applied.
    pub strategy: Strategy,
    /// Branch-and-bound run, when one took place.
    pub search: Option<SearchOutcome>,
    /// Members whose utilisation exceeds one after re-analysis.
    pub overloaded: Vec<usize>,
}

/// Runs the whole reuse workflow on a structure and a bank.
#[derive(Clone, Copy, Debug, Default)]
pub struct Planner {
    settings: PlanSettings,
}

impl Planner {
    /// A planner with `settings`.
    #[must_use]
    pub fn new(settings: PlanSettings) -> Self {
        Self { settings }
    }

    /// The configuration in use.
    #[must_use]
    pub fn settings(&self) -> &PlanSettings {
        &self.settings
    }

    /// Assign stock to `structure` and commit the cuts to `bank`.
    ///
    /// The structure is analysed under `loads`, members are priced against the
    /// available stock, the configured strategy picks an assignment, the cuts
    /// are made on a copy of the bank that then replaces it, and the structure
    /// is analysed again with the stock profiles in place.
    ///
    /// # Errors
    ///
    /// Analysis failures of either run and configuration errors are returned
    /// as [`Error`]. Members no stock can serve are not errors; they are listed
    /// in [`Plan::unassigned`].
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use trussreuse::{
    ///     point, Dimension, Loads, MaterialBank, MemberSpec, Planner, SectionTable, Structure,
    ///     TransportDistances,
    /// };
    ///
    /// let sections = Arc::new(SectionTable::builtin());
    /// let ends = [point(0.0, 0.0, 0.0), point(1_000.0, 0.0, 0.0)];
    /// let mut structure = Structure::new(
    ///     &[MemberSpec::new(ends[0], ends[1], "IPE200")],
    ///     &ends,
    ///     Arc::clone(&sections),
    ///     Dimension::Spatial,
    /// )?;
    /// let mut bank = MaterialBank::from_commands(
    ///     sections,
    ///     300.0,
    ///     &["1xIPE200x1500"],
    ///     TransportDistances::default(),
    /// )?;
    ///
    /// let plan = Planner::default().plan(&mut structure, &mut bank, &Loads::none())?;
    /// assert!(plan.unassigned.is_empty());
    /// assert_eq!(bank.len(), 2);
    /// # Ok::<(), trussreuse::Error>(())
    /// ```
    pub fn plan(
        &self,
        structure: &mut Structure,
        bank: &mut MaterialBank,
        loads: &Loads,
    ) -> Result<Plan, Error> {
        let settings = &self.settings;
        structure.evaluate(loads)?;

        let snapshot = bank.clone();
        let chosen = {
            let pricing =
                LcaPricing::new(structure, &snapshot, settings.factors, settings.keep_offcuts);
            self.choose(structure, &snapshot, &pricing)?
        };
        let Chosen {
            strategy,
            cuts: Cuts { applied, bank: working },
            search,
        } = chosen;

        let insertion_matrix =
            InsertionMatrix::from_insertions(snapshot.len(), structure.member_count(), &applied);
        let cost = sequence_cost(structure, &snapshot, &applied, &settings.factors);
        *bank = working;

        for insertion in &applied {
            let profile = snapshot
                .get(insertion.stock)
                .map(|element| element.profile().to_owned())
                .unwrap_or_default();
            structure.supply_from_stock(insertion.member, &profile)?;
        }
        structure.evaluate(loads)?;

        let overloaded: Vec<usize> = structure
            .members()
            .enumerate()
            .filter(|(_, member)| {
                member.stress_utilization() > 1.0 || member.buckling_utilization() > 1.0
            })
            .map(|(index, _)| index)
            .collect();
        for member in &overloaded {
            log::warn!("member {member} exceeds its capacity after re-analysis");
        }
        let unassigned: Vec<usize> = (0..structure.member_count())
            .filter(|member| insertion_matrix.assigned_stock(*member).is_none())
            .collect();
        let masses = structure.mass_summary(settings.factors.density);

        log::info!(
            "{strategy} plan reuses {} of {} members, {:.1} kgCO2e against {:.1} all new",
            applied.len(),
            structure.member_count(),
            cost.emission,
            cost.baseline
        );

        Ok(Plan {
            insertions: applied,
            insertion_matrix,
            unassigned,
            cost,
            masses,
            strategy,
            search,
            overloaded,
        })
    }

    fn choose(
        &self,
        structure: &Structure,
        bank: &MaterialBank,
        pricing: &LcaPricing<'_>,
    ) -> Result<Chosen, Error> {
        let settings = &self.settings;
        let run_search = || {
            let outcome = BranchAndBound::new(settings.limits).solve(pricing);
            let assignment = if outcome.is_complete() {
                outcome.assignment()
            } else {
                log::info!("completing the partial search path greedily");
                greedy::complete(pricing, outcome.path())
            };
            (assignment, outcome)
        };

        match settings.strategy {
            Strategy::Greedy => Ok(Chosen {
                strategy: Strategy::Greedy,
                cuts: self.cut(structure, bank, pricing, &greedy::solve(pricing))?,
                search: None,
            }),
            Strategy::BranchAndBound => {
                let (assignment, outcome) = run_search();
                Ok(Chosen {
                    strategy: Strategy::BranchAndBound,
                    cuts: self.cut(structure, bank, pricing, &assignment)?,
                    search: Some(outcome),
                })
            }
            Strategy::Best => {
                let (searched, outcome) = run_search();
                let searched = self.cut(structure, bank, pricing, &searched)?;
                let ranked = self.cut(structure, bank, pricing, &greedy::solve(pricing))?;
                let emission = |cuts: &Cuts| {
                    sequence_cost(structure, bank, &cuts.applied, &settings.factors).emission
                };
                let (strategy, cuts) = if emission(&ranked) < emission(&searched) {
                    (Strategy::Greedy, ranked)
                } else {
                    (Strategy::BranchAndBound, searched)
                };
                Ok(Chosen {
                    strategy,
                    cuts,
                    search: Some(outcome),
                })
            }
        }
    }

    /// Make the cuts of `assignment` on a copy of `bank`, in the order the
    /// assignment committed them.
    fn cut(
        &self,
        structure: &Structure,
        bank: &MaterialBank,
        pricing: &LcaPricing<'_>,
        assignment: &Assignment,
    ) -> Result<Cuts, Error> {
        let keep_offcuts = self.settings.keep_offcuts;
        let insertions = pricing.insertions(&assignment.decisions);
        let mut working = bank.clone();
        let mut applied = Vec::with_capacity(insertions.len());
        let mut remainders: HashMap<usize, usize> = HashMap::new();
        for insertion in insertions {
            let current = remainders
                .get(&insertion.stock)
                .copied()
                .unwrap_or(insertion.stock);
            if !self.can_cut(structure, &working, current, insertion) {
                log::warn!(
                    "stock {} can no longer supply member {}; fabricating new",
                    insertion.stock,
                    insertion.member
                );
                continue;
            }
            let outcome = working.cut(current, insertion.length, keep_offcuts)?;
            match outcome.offcut {
                Some(offcut) => remainders.insert(insertion.stock, offcut),
                None => remainders.remove(&insertion.stock),
            };
            applied.push(insertion);
        }
        Ok(Cuts {
            applied,
            bank: working,
        })
    }

    fn can_cut(
        &self,
        structure: &Structure,
        bank: &MaterialBank,
        index: usize,
        insertion: Insertion,
    ) -> bool {
        let (Some(element), Some(candidate), Some(member)) = (
            bank.get(index),
            bank.candidate(index),
            structure.member(insertion.member),
        ) else {
            return false;
        };
        let fresh = index == insertion.stock;
        !element.in_use()
            && (fresh || element.reusable(bank.min_reusable_length()))
            && candidate.fits(insertion.length)
            && local_cost(member, &candidate, member.axial_force(), &self.settings.factors)
                .is_feasible()
    }
}

/// Cuts made on a working copy of the bank.
struct Cuts {
    /// Insertions that were cut, in cutting order.
    applied: Vec<Insertion>,
    /// The bank after the cuts.
    bank: MaterialBank,
}

/// The assignment a strategy settled on.
struct Chosen {
    /// Strategy whose assignment won.
    strategy: Strategy,
    /// Its cuts.
    cuts: Cuts,
    /// Branch-and-bound run, if any.
    search: Option<SearchOutcome>,
}
