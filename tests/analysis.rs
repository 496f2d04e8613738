#![warn(clippy::pedantic)]

use std::f64::consts::{PI, SQRT_2};
use std::sync::Arc;

use approx::assert_relative_eq;
use trussreuse::{
    point, AnalysisError, Dimension, LineLoad, Loads, MemberSpec, Point, SectionTable, Structure,
};

const IPE200_AREA: f64 = 2848.0;
const STEEL_MODULUS: f64 = 210_000.0;

fn sections() -> Arc<SectionTable> {
    Arc::new(SectionTable::builtin())
}

/// Three pinned base joints on a circle of radius 1000 mm and a free apex
/// 1000 mm above its centre.
fn tetrahedron() -> (Structure, Point) {
    let apex = point(0.0, 0.0, 1_000.0);
    let base: Vec<Point> = (0..3)
        .map(|k| {
            let angle = 2.0 * PI * f64::from(k) / 3.0;
            point(1_000.0 * angle.cos(), 1_000.0 * angle.sin(), 0.0)
        })
        .collect();
    let members: Vec<MemberSpec> = base
        .iter()
        .map(|joint| MemberSpec::new(*joint, apex, "IPE200"))
        .collect();
    let structure = Structure::new(&members, &base, sections(), Dimension::Spatial)
        .expect("tetrahedron is well formed");
    (structure, apex)
}

#[test]
fn unloaded_bar_between_supports_has_no_response() {
    let ends = [point(0.0, 0.0, 0.0), point(1_000.0, 0.0, 0.0)];
    let mut structure = Structure::new(
        &[MemberSpec::new(ends[0], ends[1], "IPE200")],
        &ends,
        sections(),
        Dimension::Spatial,
    )
    .expect("single bar is well formed");

    structure
        .evaluate(&Loads::none())
        .expect("a structure without free joints solves");

    let member = structure.member(0).expect("member 0 exists");
    assert_relative_eq!(member.length(), 1_000.0);
    assert_relative_eq!(member.section().area, IPE200_AREA);
    assert_eq!(member.axial_force(), 0.0);
    let displacements = structure
        .displacements()
        .expect("displacements are available after a solve");
    assert!(displacements.iter().all(|value| *value == 0.0));
}

#[test]
fn tetrahedron_matches_closed_form_solution() {
    let (mut structure, apex) = tetrahedron();
    assert_eq!(structure.free_joint_count(), 1);
    assert_eq!(structure.free_joints(), vec![apex]);
    let load = 30_000.0;

    structure
        .evaluate(&Loads::nodal(vec![0.0, 0.0, -load]))
        .expect("tetrahedron analysis succeeds");

    let length = SQRT_2 * 1_000.0;
    let expected_force = -load * length / (3.0 * 1_000.0);
    for member in structure.members() {
        assert_relative_eq!(member.length(), length, max_relative = 1.0e-12);
        assert_relative_eq!(member.axial_force(), expected_force, max_relative = 1.0e-3);
    }

    let ea = STEEL_MODULUS * IPE200_AREA;
    let expected_sag = 3.0 * expected_force * expected_force * length / (ea * load);
    let displacement = structure
        .free_joint_displacement(0)
        .expect("apex displacement available");
    assert!(displacement.x.abs() < 1.0e-9);
    assert!(displacement.y.abs() < 1.0e-9);
    assert_relative_eq!(displacement.z, -expected_sag, max_relative = 1.0e-9);
}

#[test]
fn stiffness_matrix_is_symmetric_and_sized_by_free_dofs() {
    let (mut structure, _) = tetrahedron();
    structure
        .evaluate(&Loads::nodal(vec![1_000.0, 0.0, 0.0]))
        .expect("tetrahedron analysis succeeds");

    let stiffness = structure
        .stiffness_matrix()
        .expect("stiffness available after a solve");
    assert_eq!(stiffness.shape(), (3, 3));
    assert_relative_eq!(stiffness.clone(), stiffness.transpose(), epsilon = 1.0e-6);
    assert_eq!(
        structure.load_vector().expect("load vector available").len(),
        3
    );
}

#[test]
fn planar_arch_under_line_load() {
    let left = point(0.0, 0.0, 0.0);
    let apex = point(1_000.0, 0.0, 1_000.0);
    let right = point(2_000.0, 0.0, 0.0);
    let mut structure = Structure::new(
        &[
            MemberSpec::new(left, apex, "IPE200"),
            MemberSpec::new(apex, right, "IPE200"),
        ],
        &[left, right],
        sections(),
        Dimension::Planar,
    )
    .expect("arch is well formed");
    assert_eq!(structure.dof_count(), 2);

    let intensity = 5.0;
    structure
        .evaluate(&Loads::none().with_line_load(LineLoad::downward(intensity, vec![0, 1])))
        .expect("arch analysis succeeds");

    // Half of each member's load reaches the apex.
    let apex_load = intensity * SQRT_2 * 1_000.0;
    let expected = -apex_load / SQRT_2;
    for member in structure.members() {
        assert_relative_eq!(member.axial_force(), expected, max_relative = 1.0e-6);
        assert!(member.buckling_utilization() > 0.0);
    }
}

#[test]
fn repeated_solves_are_identical() {
    let (mut structure, _) = tetrahedron();
    let loads = Loads::nodal(vec![2_000.0, -1_500.0, -20_000.0]).with_self_weight(true);

    structure.evaluate(&loads).expect("first solve succeeds");
    let displacements = structure
        .displacements()
        .expect("displacements available")
        .clone();
    let forces = structure.axial_forces();

    structure.evaluate(&loads).expect("second solve succeeds");
    assert_eq!(
        structure.displacements().expect("displacements available"),
        &displacements
    );
    assert_eq!(structure.axial_forces(), forces);
}

#[test]
fn mechanism_is_reported_as_singular() {
    let a = point(0.0, 0.0, 0.0);
    let b = point(1_000.0, 0.0, 0.0);
    let tip = point(2_000.0, 0.0, 0.0);
    let mut structure = Structure::new(
        &[
            MemberSpec::new(a, b, "IPE200"),
            MemberSpec::new(b, tip, "IPE200"),
        ],
        &[a, b],
        sections(),
        Dimension::Spatial,
    )
    .expect("geometry is well formed");

    let result = structure.evaluate(&Loads::nodal(vec![0.0, 0.0, -1_000.0]));
    assert_eq!(result, Err(AnalysisError::SingularStiffness));
    assert!(!structure.is_evaluated());
}
