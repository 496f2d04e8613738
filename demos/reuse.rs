use std::sync::Arc;

use trussreuse::{
    point, Dimension, LineLoad, Loads, MaterialBank, MemberSpec, PlanSettings, Planner,
    SectionTable, Strategy, Structure, TransportDistances,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sections = Arc::new(SectionTable::builtin());

    // Three-bay Pratt girder in the XZ plane
    let bottom = |i: u32| point(2_000.0 * f64::from(i), 0.0, 0.0);
    let top = |i: u32| point(2_000.0 * f64::from(i), 0.0, 1_500.0);
    let mut members = Vec::new();
    for i in 0..3 {
        members.push(MemberSpec::new(bottom(i), bottom(i + 1), "IPE200"));
        members.push(MemberSpec::new(top(i), top(i + 1), "IPE220"));
        members.push(MemberSpec::new(bottom(i + 1), top(i + 1), "HEA100"));
        let diagonal = if i < 2 {
            MemberSpec::new(bottom(i), top(i + 1), "HEA120")
        } else {
            MemberSpec::new(top(i), bottom(i + 1), "HEA120")
        };
        members.push(diagonal);
    }
    members.push(MemberSpec::new(bottom(0), top(0), "HEA100"));

    let mut structure = Structure::new(
        &members,
        &[bottom(0), bottom(3)],
        Arc::clone(&sections),
        Dimension::Planar,
    )?;

    // Salvaged stock from a demolished hall
    let mut bank = MaterialBank::from_commands(
        sections,
        300.0,
        &["4xIPE220x4500", "3xHEA120x2600", "2xHEA140x3200", "2xIPE200x2100"],
        TransportDistances::new(80.0, 25.0, 40.0),
    )?;

    let top_chords = vec![1, 5, 9];
    let loads = Loads::none()
        .with_line_load(LineLoad::downward(12.0, top_chords))
        .with_self_weight(true);

    let planner = Planner::new(PlanSettings {
        strategy: Strategy::Best,
        ..PlanSettings::default()
    });
    let plan = planner.plan(&mut structure, &mut bank, &loads)?;

    for insertion in &plan.insertions {
        let member = structure.member(insertion.member).ok_or("member missing")?;
        println!(
            "member {:>2} ({} -> {}) cut from stock {:>2}",
            insertion.member,
            member.design_profile(),
            member.profile(),
            insertion.stock
        );
    }
    println!("new fabrication: {:?}", plan.unassigned);
    println!(
        "{:.1} kgCO2e instead of {:.1} ({} strategy)",
        plan.cost.emission, plan.cost.baseline, plan.strategy
    );

    Ok(())
}
