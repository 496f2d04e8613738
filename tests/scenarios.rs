use std::sync::Arc;

use approx::assert_relative_eq;
use trussreuse::optimizer::{greedy, pricing::MatrixPricing};
use trussreuse::{
    point, BranchAndBound, CostMatrix, Dimension, Loads, MaterialBank, MemberSpec, Planner,
    SectionTable, Structure, Termination, TransportDistances,
};

fn single_bar(sections: &Arc<SectionTable>) -> Structure {
    let ends = [point(0.0, 0.0, 0.0), point(1_000.0, 0.0, 0.0)];
    Structure::new(
        &[MemberSpec::new(ends[0], ends[1], "IPE200")],
        &ends,
        Arc::clone(sections),
        Dimension::Spatial,
    )
    .expect("single bar is well formed")
}

fn bank(sections: &Arc<SectionTable>, commands: &[&str]) -> MaterialBank {
    MaterialBank::from_commands(
        Arc::clone(sections),
        300.0,
        commands,
        TransportDistances::new(50.0, 20.0, 10.0),
    )
    .expect("stock commands are valid")
}

#[test]
fn unloaded_bar_has_zero_force_and_displacement() {
    let sections = Arc::new(SectionTable::builtin());
    let mut structure = single_bar(&sections);
    structure
        .evaluate(&Loads::none())
        .expect("analysis succeeds");

    assert_eq!(structure.axial_forces(), vec![0.0]);
    assert!(structure
        .displacements()
        .expect("displacements available")
        .iter()
        .all(|value| *value == 0.0));
}

#[test]
fn longer_stock_is_cut_into_used_piece_and_offcut() {
    let sections = Arc::new(SectionTable::builtin());
    let mut structure = single_bar(&sections);
    structure
        .evaluate(&Loads::none())
        .expect("analysis succeeds");
    let mut stock = bank(&sections, &["1xIPE200x1500"]);

    let member = structure.member(0).expect("member 0 exists");
    assert_eq!(stock.find_feasible(member, member.axial_force()), vec![0]);

    let outcome = stock
        .cut(0, member.length(), true)
        .expect("fresh piece can be cut");
    assert_eq!(stock.len(), 2);
    let used = stock.get(outcome.used).expect("used piece present");
    let offcut = stock
        .get(outcome.offcut.expect("remainder is kept"))
        .expect("off-cut present");
    assert_relative_eq!(used.length(), 1_000.0);
    assert!(used.in_use());
    assert_relative_eq!(offcut.length(), 500.0);
    assert!(!offcut.in_use());
}

#[test]
fn planner_cuts_the_stock_for_the_bar() {
    let sections = Arc::new(SectionTable::builtin());
    let mut structure = single_bar(&sections);
    let mut stock = bank(&sections, &["1xIPE200x1500"]);

    let plan = Planner::default()
        .plan(&mut structure, &mut stock, &Loads::none())
        .expect("planning succeeds");

    assert_eq!(stock.len(), 2);
    assert_relative_eq!(plan.insertion_matrix.get(0, 0), 1_000.0);
    assert!(plan.unassigned.is_empty());
    assert!(structure.member(0).expect("member 0").is_from_stock());
    assert_relative_eq!(plan.masses.reused, plan.masses.total);
}

#[test]
fn short_stock_leaves_the_member_for_new_fabrication() {
    let sections = Arc::new(SectionTable::builtin());
    let mut structure = single_bar(&sections);
    structure
        .evaluate(&Loads::none())
        .expect("analysis succeeds");
    let mut stock = bank(&sections, &["1xIPE200x800"]);

    let member = structure.member(0).expect("member 0 exists");
    assert!(stock.find_feasible(member, member.axial_force()).is_empty());

    let plan = Planner::default()
        .plan(&mut structure, &mut stock, &Loads::none())
        .expect("planning succeeds");
    assert_eq!(plan.unassigned, vec![0]);
    assert!(plan.insertions.is_empty());
    assert_eq!(stock.len(), 1);
    assert!(!stock.get(0).expect("piece present").in_use());
    assert!(!structure.member(0).expect("member 0").is_from_stock());
}

#[test]
fn dominant_zero_cost_assignment_is_found_by_both_strategies() {
    let costs = CostMatrix::from_row_slice(
        3,
        3,
        &[4.0, 0.0, 7.0, 0.0, 6.0, 5.0, 9.0, 8.0, 0.0],
    );
    let pricing = MatrixPricing::new(costs);

    let outcome = BranchAndBound::default().solve(&pricing);
    assert_eq!(outcome.termination(), Termination::Complete);
    assert!(outcome.is_complete());
    assert_eq!(outcome.cost_of_path(), 0.0);

    let ranked = greedy::solve(&pricing);
    assert_eq!(ranked.cost, 0.0);

    let mut searched: Vec<(usize, usize)> = outcome.assignment().pairs().collect();
    let mut chosen: Vec<(usize, usize)> = ranked.pairs().collect();
    searched.sort_unstable();
    chosen.sort_unstable();
    assert_eq!(searched, vec![(0, 1), (1, 0), (2, 2)]);
    assert_eq!(searched, chosen);
}
