use std::sync::Arc;

use trussreuse::{point, Dimension, Loads, MemberSpec, SectionTable, Structure};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A tripod: three pinned feet and a loaded apex
    let apex = point(0.0, 0.0, 2_000.0);
    let feet = [
        point(1_500.0, 0.0, 0.0),
        point(-750.0, 1_300.0, 0.0),
        point(-750.0, -1_300.0, 0.0),
    ];
    let members: Vec<MemberSpec> = feet
        .iter()
        .map(|foot| MemberSpec::new(*foot, apex, "HEA100"))
        .collect();

    let mut structure = Structure::new(
        &members,
        &feet,
        Arc::new(SectionTable::builtin()),
        Dimension::Spatial,
    )?;

    // 40 kN downward at the apex plus self-weight
    structure.evaluate(&Loads::nodal(vec![0.0, 0.0, -40_000.0]).with_self_weight(true))?;

    if let Some(displacement) = structure.free_joint_displacement(0) {
        println!("apex uz = {:.4} mm", displacement.z);
    }
    for (index, member) in structure.members().enumerate() {
        println!(
            "member {index}: N = {:+.1} N, yield {:.3}, buckling {:.3}",
            member.axial_force(),
            member.stress_utilization(),
            member.buckling_utilization()
        );
    }

    Ok(())
}
