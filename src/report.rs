use std::fmt::Write;

use trussreuse::{MaterialBank, Plan, Structure};

/// Render a textual summary of a reuse plan.
///
/// Forces are in N, lengths in mm, masses in kg and emissions in kgCO₂e.
#[must_use]
pub fn render_plan(structure: &Structure, bank: &MaterialBank, plan: &Plan) -> String {
    let mut output = String::new();

    writeln!(
        &mut output,
        "Reuse plan ({}): {} of {} members from stock",
        plan.strategy,
        plan.insertions.len(),
        structure.member_count()
    )
    .expect("writing to string cannot fail");

    output.push_str("\nMembers\n");
    writeln!(
        &mut output,
        "  {:>3}  {:>9}  {:<8} {:<8} {:>12}  {:>6}  {:>6}",
        "#", "L [mm]", "design", "supplied", "N [N]", "util", "buckl"
    )
    .expect("writing to string cannot fail");
    for (index, member) in structure.members().enumerate() {
        let source = if member.is_from_stock() { "*" } else { " " };
        writeln!(
            &mut output,
            "  {:>3}  {:>9.1}  {:<8} {:<8}{source}{:>+12.1}  {:>6.3}  {:>6.3}",
            index,
            member.length(),
            member.design_profile(),
            member.profile(),
            member.axial_force(),
            member.stress_utilization(),
            member.buckling_utilization()
        )
        .expect("writing to string cannot fail");
    }

    if !plan.insertions.is_empty() {
        output.push_str("\nCuts\n");
        for insertion in &plan.insertions {
            writeln!(
                &mut output,
                "  member {:>3} <- stock {:>3}  ({:.1} mm)",
                insertion.member, insertion.stock, insertion.length
            )
            .expect("writing to string cannot fail");
        }
    }
    if !plan.overloaded.is_empty() {
        writeln!(
            &mut output,
            "\nOverloaded after re-analysis: {:?}",
            plan.overloaded
        )
        .expect("writing to string cannot fail");
    }

    writeln!(
        &mut output,
        "\nEmission: {:.2} kgCO2e (all new {:.2}, saved {:.2})",
        plan.cost.emission,
        plan.cost.baseline,
        plan.cost.saving()
    )
    .expect("writing to string cannot fail");
    writeln!(
        &mut output,
        "Mass: {:.2} kg total, {:.2} kg new, {:.2} kg reused",
        plan.masses.total, plan.masses.new, plan.masses.reused
    )
    .expect("writing to string cannot fail");
    writeln!(
        &mut output,
        "Bank: {} pieces, {} available, {} waste off-cuts",
        bank.len(),
        bank.available().count(),
        bank.waste().count()
    )
    .expect("writing to string cannot fail");

    if let Some(search) = &plan.search {
        output.push('\n');
        write!(&mut output, "{search}").expect("writing to string cannot fail");
    }

    output
}
