//! Embodied-carbon objective.
//!
//! Emissions are in kgCO₂e. A member fabricated new costs its mass times the
//! production factor plus transport to site. A member cut from stock costs
//! reprocessing of the used length, disposal of any unusable off-cut, and
//! transport of the piece, the member and the waste. Everything here is a pure
//! function of its arguments.

use serde::{Deserialize, Serialize};

use crate::assignment::{Insertion, InsertionMatrix};
use crate::bank::{Candidate, MaterialBank};
use crate::member::{buckling_utilization, stress_utilization, Member};
use crate::structure::Structure;

/// Emission factors of the life-cycle model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LcaFactors {
    /// Steel density in kg/mm³.
    pub density: f64,
    /// Production of new steel sections, kgCO₂e/kg.
    pub new_material: f64,
    /// Reconditioning and refabrication of reused steel, kgCO₂e/kg.
    pub reuse_processing: f64,
    /// Handling of waste off-cuts, kgCO₂e/kg.
    pub waste: f64,
    /// Road transport, kgCO₂e/(kg·km).
    pub transport: f64,
    /// Distance a new member travels from the mill to site, km.
    pub new_transport_distance: f64,
}

impl Default for LcaFactors {
    fn default() -> Self {
        Self {
            density: crate::loads::STEEL_DENSITY,
            new_material: 0.957,
            reuse_processing: 0.287,
            waste: 0.110,
            transport: 1.1e-4,
            new_transport_distance: 100.0,
        }
    }
}

/// Why a piece cannot replace a member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Infeasibility {
    /// The piece is shorter than the member.
    TooShort,
    /// The force would yield the piece.
    Overstressed,
    /// The force would buckle the piece.
    Buckling,
}

/// Outcome of pricing one member against one piece.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Substitution {
    /// The piece can supply the member.
    Feasible {
        /// Emission of fabricating the member new.
        new_emission: f64,
        /// Emission of supplying it from the piece.
        reuse_emission: f64,
    },
    /// The piece cannot supply the member and must not be ranked.
    Infeasible(Infeasibility),
}

impl Substitution {
    /// Emission saved by reusing, `None` when infeasible.
    #[must_use]
    pub fn saving(&self) -> Option<f64> {
        match self {
            Substitution::Feasible {
                new_emission,
                reuse_emission,
            } => Some(new_emission - reuse_emission),
            Substitution::Infeasible(_) => None,
        }
    }

    /// Emission of the reuse route, `None` when infeasible.
    #[must_use]
    pub fn reuse_emission(&self) -> Option<f64> {
        match self {
            Substitution::Feasible { reuse_emission, .. } => Some(*reuse_emission),
            Substitution::Infeasible(_) => None,
        }
    }

    /// Whether the piece can supply the member.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        matches!(self, Substitution::Feasible { .. })
    }
}

/// Emission of fabricating `member` new in its design profile.
#[must_use]
pub fn new_emission(member: &Member, factors: &LcaFactors) -> f64 {
    let mass = member.design_section().area * member.length() * factors.density;
    mass * (factors.new_material + factors.new_transport_distance * factors.transport)
}

/// Price supplying `member`, loaded by `axial_force`, from `candidate`.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use trussreuse::{
///     local_cost, point, Dimension, LcaFactors, MaterialBank, MemberSpec, SectionTable,
///     Structure, TransportDistances,
/// };
///
/// let sections = Arc::new(SectionTable::builtin());
/// let ends = [point(0.0, 0.0, 0.0), point(1_000.0, 0.0, 0.0)];
/// let structure = Structure::new(
///     &[MemberSpec::new(ends[0], ends[1], "IPE200")],
///     &ends,
///     Arc::clone(&sections),
///     Dimension::Spatial,
/// )?;
/// let bank = MaterialBank::from_commands(sections, 300.0, &["1xIPE200x500"], TransportDistances::default())?;
///
/// let member = structure.member(0).expect("one member");
/// let candidate = bank.candidate(0).expect("one piece");
/// assert!(!local_cost(member, &candidate, 0.0, &LcaFactors::default()).is_feasible());
/// # Ok::<(), trussreuse::Error>(())
/// ```
#[must_use]
pub fn local_cost(
    member: &Member,
    candidate: &Candidate,
    axial_force: f64,
    factors: &LcaFactors,
) -> Substitution {
    let length = member.length();
    let offcut = candidate.length - length;
    if offcut < 0.0 {
        return Substitution::Infeasible(Infeasibility::TooShort);
    }
    if stress_utilization(axial_force, &candidate.section, member.material()) >= 1.0 {
        return Substitution::Infeasible(Infeasibility::Overstressed);
    }
    if buckling_utilization(axial_force, length, &candidate.section, member.material()) >= 1.0 {
        return Substitution::Infeasible(Infeasibility::Buckling);
    }

    let unit_mass = candidate.section.area * factors.density;
    let used = unit_mass * length;
    let piece = unit_mass * candidate.length;
    let waste = if offcut < candidate.min_reusable_length {
        unit_mass * offcut
    } else {
        0.0
    };
    let distances = candidate.distances;
    let transport = factors.transport
        * (piece * distances.fabrication + used * distances.building + waste * distances.recycling);
    let reuse_emission = used * factors.reuse_processing + waste * factors.waste + transport;

    Substitution::Feasible {
        new_emission: new_emission(member, factors),
        reuse_emission,
    }
}

/// Emission of a whole assignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalCost {
    /// Emission of the structure as assigned.
    pub emission: f64,
    /// Emission if every member were fabricated new.
    pub baseline: f64,
    /// Members supplied from stock.
    pub reused_members: usize,
}

impl GlobalCost {
    /// Emission avoided relative to the all-new baseline.
    #[must_use]
    pub fn saving(&self) -> f64 {
        self.baseline - self.emission
    }
}

/// Sum the objective over an insertion matrix.
///
/// `bank` must be the bank the matrix rows refer to, before any of the
/// assignment's cuts were applied. Members are priced in index order, as
/// [`sequence_cost`] does for an explicit order.
#[must_use]
pub fn global_cost(
    structure: &Structure,
    bank: &MaterialBank,
    insertion: &InsertionMatrix,
    factors: &LcaFactors,
) -> GlobalCost {
    let ordered: Vec<Insertion> = (0..structure.member_count())
        .filter_map(|member| {
            let stock = insertion.assigned_stock(member)?;
            Some(Insertion {
                member,
                stock,
                length: insertion.get(stock, member),
            })
        })
        .collect();
    sequence_cost(structure, bank, &ordered, factors)
}

/// Sum the objective over cuts made in the order given.
///
/// A piece supplying several members offers each one the length left by the
/// cuts before it, and a remainder shorter than the minimum reusable length is
/// not offered at all. Members without a cut, with an infeasible cut, or named
/// twice after their first cut count as new.
#[must_use]
pub fn sequence_cost(
    structure: &Structure,
    bank: &MaterialBank,
    insertions: &[Insertion],
    factors: &LcaFactors,
) -> GlobalCost {
    let new: Vec<f64> = structure
        .members()
        .map(|member| new_emission(member, factors))
        .collect();
    let baseline: f64 = new.iter().sum();
    let mut cost = GlobalCost {
        emission: baseline,
        baseline,
        reused_members: 0,
    };
    let mut committed = vec![0.0; bank.len()];
    let mut supplied = vec![false; new.len()];

    for &Insertion { member: index, stock, .. } in insertions {
        let (Some(member), Some(candidate)) = (structure.member(index), bank.candidate(stock))
        else {
            log::warn!("cut of stock {stock} for member {index} is out of range; ignored");
            continue;
        };
        if supplied[index] {
            continue;
        }
        let remaining = candidate.with_length(candidate.length - committed[stock]);
        if committed[stock] > 0.0 && remaining.length < remaining.min_reusable_length {
            log::warn!("member {index} cannot use the off-cut of stock {stock}; priced as new");
            continue;
        }
        match local_cost(member, &remaining, member.axial_force(), factors) {
            Substitution::Feasible {
                new_emission,
                reuse_emission,
            } => {
                committed[stock] += member.length();
                supplied[index] = true;
                cost.emission += reuse_emission - new_emission;
                cost.reused_members += 1;
            }
            Substitution::Infeasible(reason) => {
                log::warn!("member {index} cannot use stock {stock} ({reason:?}); priced as new");
            }
        }
    }
    cost
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_relative_eq;

    use super::*;
    use crate::bank::TransportDistances;
    use crate::geometry::point;
    use crate::member::{Dimension, MemberSpec};
    use crate::sections::SectionTable;

    fn fixture(commands: &[&str]) -> (Structure, MaterialBank) {
        let sections = Arc::new(SectionTable::builtin());
        let ends = [point(0.0, 0.0, 0.0), point(1_000.0, 0.0, 0.0)];
        let structure = Structure::new(
            &[MemberSpec::new(ends[0], ends[1], "IPE200")],
            &ends,
            Arc::clone(&sections),
            Dimension::Spatial,
        )
        .expect("single bar");
        let bank = MaterialBank::from_commands(
            sections,
            300.0,
            commands,
            TransportDistances::new(50.0, 20.0, 10.0),
        )
        .expect("valid stock");
        (structure, bank)
    }

    #[test]
    fn reusing_a_matching_piece_saves_carbon() {
        let (structure, bank) = fixture(&["1xIPE200x1500"]);
        let member = structure.member(0).expect("member exists");
        let candidate = bank.candidate(0).expect("piece exists");
        let factors = LcaFactors::default();
        let cost = local_cost(member, &candidate, 0.0, &factors);

        let used = 2848.0 * 1_000.0 * factors.density;
        let piece = 2848.0 * 1_500.0 * factors.density;
        let expected_reuse = used * factors.reuse_processing
            + factors.transport * (piece * 50.0 + used * 20.0);
        assert_relative_eq!(
            cost.reuse_emission().expect("feasible"),
            expected_reuse,
            max_relative = 1.0e-12
        );
        assert!(cost.saving().expect("feasible") > 0.0);
    }

    #[test]
    fn short_offcut_is_charged_as_waste() {
        let (structure, bank) = fixture(&["1xIPE200x1200", "1xIPE200x1400"]);
        let member = structure.member(0).expect("member exists");
        let factors = LcaFactors {
            transport: 0.0,
            ..LcaFactors::default()
        };
        let wasteful = local_cost(member, &bank.candidate(0).expect("piece"), 0.0, &factors);
        let clean = local_cost(member, &bank.candidate(1).expect("piece"), 0.0, &factors);
        let waste = 2848.0 * 200.0 * factors.density * factors.waste;
        assert_relative_eq!(
            wasteful.reuse_emission().expect("feasible")
                - clean.reuse_emission().expect("feasible"),
            waste,
            max_relative = 1.0e-9
        );
    }

    #[test]
    fn infeasible_pairings_are_marked() {
        let (structure, bank) = fixture(&["1xIPE200x800", "1xIPE80x2000"]);
        let member = structure.member(0).expect("member exists");
        let factors = LcaFactors::default();
        assert_eq!(
            local_cost(member, &bank.candidate(0).expect("piece"), 0.0, &factors),
            Substitution::Infeasible(Infeasibility::TooShort)
        );
        assert_eq!(
            local_cost(member, &bank.candidate(1).expect("piece"), 300_000.0, &factors),
            Substitution::Infeasible(Infeasibility::Overstressed)
        );
        assert_eq!(
            local_cost(member, &bank.candidate(1).expect("piece"), -200_000.0, &factors),
            Substitution::Infeasible(Infeasibility::Buckling)
        );
    }

    #[test]
    fn global_cost_counts_unassigned_members_as_new() {
        let (structure, bank) = fixture(&["1xIPE200x1500"]);
        let factors = LcaFactors::default();
        let empty = InsertionMatrix::new(bank.len(), 1);
        let all_new = global_cost(&structure, &bank, &empty, &factors);
        assert_relative_eq!(all_new.emission, all_new.baseline);
        assert_eq!(all_new.reused_members, 0);

        let assigned = InsertionMatrix::from_insertions(
            bank.len(),
            1,
            &[Insertion {
                member: 0,
                stock: 0,
                length: 1_000.0,
            }],
        );
        let reused = global_cost(&structure, &bank, &assigned, &factors);
        assert_eq!(reused.reused_members, 1);
        assert!(reused.saving() > 0.0);
    }

    #[test]
    fn remainder_below_minimum_is_priced_as_new() {
        let sections = Arc::new(SectionTable::builtin());
        let long = [point(0.0, 0.0, 0.0), point(1_000.0, 0.0, 0.0)];
        let short = [point(0.0, 0.0, 500.0), point(249.0, 0.0, 500.0)];
        let structure = Structure::new(
            &[
                MemberSpec::new(long[0], long[1], "IPE140"),
                MemberSpec::new(short[0], short[1], "HEA200"),
            ],
            &[long[0], long[1], short[0], short[1]],
            Arc::clone(&sections),
            Dimension::Spatial,
        )
        .expect("two supported bars");
        let bank = MaterialBank::from_commands(
            sections,
            300.0,
            &["1xIPE200x1250"],
            TransportDistances::new(50.0, 20.0, 10.0),
        )
        .expect("valid stock");
        let factors = LcaFactors::default();
        let long_cut = Insertion {
            member: 0,
            stock: 0,
            length: 1_000.0,
        };
        let short_cut = Insertion {
            member: 1,
            stock: 0,
            length: 249.0,
        };

        // Long member first leaves 250 mm, too short to offer again.
        let by_index = global_cost(
            &structure,
            &bank,
            &InsertionMatrix::from_insertions(1, 2, &[long_cut, short_cut]),
            &factors,
        );
        assert_eq!(by_index.reused_members, 1);
        assert_eq!(
            sequence_cost(&structure, &bank, &[long_cut, short_cut], &factors),
            by_index
        );

        // Short member first leaves 1001 mm for the long one.
        let short_first = sequence_cost(&structure, &bank, &[short_cut, long_cut], &factors);
        assert_eq!(short_first.reused_members, 2);
        assert!(short_first.emission < by_index.emission);
    }
}
