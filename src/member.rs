//! Bar elements: geometry, section, material and their local stiffness.

use std::f64::consts::PI;

use nalgebra::{DMatrix, Vector3};
use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::sections::SectionProperties;

/// Number of translational degrees of freedom carried by each free joint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Plane truss in the global XZ plane (X and Z translations).
    Planar,
    /// Space truss (X, Y and Z translations).
    #[default]
    Spatial,
}

impl Dimension {
    /// Degrees of freedom per free joint.
    #[must_use]
    pub const fn dofs_per_node(self) -> usize {
        match self {
            Dimension::Planar => 2,
            Dimension::Spatial => 3,
        }
    }

    /// Project a global vector onto the components this dimension solves for.
    #[must_use]
    pub fn components(self, vector: &Vector3<f64>) -> Vec<f64> {
        match self {
            Dimension::Planar => vec![vector.x, vector.z],
            Dimension::Spatial => vec![vector.x, vector.y, vector.z],
        }
    }
}

/// Linear elastic material of a member in MPa.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Young's modulus in MPa.
    pub elastic_modulus: f64,
    /// Yield stress in MPa.
    pub yield_strength: f64,
}

impl Material {
    /// Structural steel S355.
    #[must_use]
    pub const fn steel() -> Self {
        Self {
            elastic_modulus: 210_000.0,
            yield_strength: 355.0,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::steel()
    }
}

/// Input description of one member before it is placed in a structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberSpec {
    /// First end point.
    pub start: Point,
    /// Second end point.
    pub end: Point,
    /// Profile name looked up in the section table.
    pub profile: String,
    /// Material; structural steel unless given.
    #[serde(default)]
    pub material: Material,
}

impl MemberSpec {
    /// Describe a steel member between two points.
    #[must_use]
    pub fn new(start: Point, end: Point, profile: impl Into<String>) -> Self {
        Self {
            start,
            end,
            profile: profile.into(),
            material: Material::steel(),
        }
    }

    /// Replace the material.
    #[must_use]
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }
}

/// A bar of the structure.
///
/// The endpoints never change. What changes is the supplying element: either
/// a new bar of the design profile or a piece cut from stock, which may have a
/// different section.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    /// First endpoint in mm.
    start: Point,
    /// Second endpoint in mm.
    end: Point,
    /// Profile the member was designed with.
    design_profile: String,
    /// Section of the design profile.
    design_section: SectionProperties,
    /// Profile currently supplying the member.
    profile: String,
    /// Section of the supplying profile.
    section: SectionProperties,
    /// Steel grade.
    material: Material,
    /// Whether the supplying piece comes from the bank.
    is_from_stock: bool,
    /// Retracked axial force in N, negative in compression.
    axial_force: f64,
    /// Yield utilisation under the last analysis.
    stress_utilization: f64,
    /// Euler buckling utilisation under the last analysis.
    buckling_utilization: f64,
}

impl Member {
    pub(crate) fn new(spec: &MemberSpec, section: SectionProperties) -> Self {
        Self {
            start: spec.start,
            end: spec.end,
            design_profile: spec.profile.clone(),
            design_section: section,
            profile: spec.profile.clone(),
            section,
            material: spec.material,
            is_from_stock: false,
            axial_force: 0.0,
            stress_utilization: 0.0,
            buckling_utilization: 0.0,
        }
    }

    /// First end point.
    #[must_use]
    pub fn start(&self) -> Point {
        self.start
    }

    /// Second end point.
    #[must_use]
    pub fn end(&self) -> Point {
        self.end
    }

    /// Undeformed length in mm.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Unit vector from start to end.
    #[must_use]
    pub fn direction(&self) -> Vector3<f64> {
        (self.end.to_vector() - self.start.to_vector()) / self.length()
    }

    /// Profile the design asked for.
    #[must_use]
    pub fn design_profile(&self) -> &str {
        &self.design_profile
    }

    /// Section of a newly fabricated member.
    #[must_use]
    pub fn design_section(&self) -> &SectionProperties {
        &self.design_section
    }

    /// Profile of the element currently supplying the member.
    #[must_use]
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Section of the element currently supplying the member.
    #[must_use]
    pub fn section(&self) -> &SectionProperties {
        &self.section
    }

    /// Material of the member.
    #[must_use]
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Whether the member is supplied by a stock cut.
    #[must_use]
    pub fn is_from_stock(&self) -> bool {
        self.is_from_stock
    }

    /// Axial force from the last analysis in N, tension positive.
    #[must_use]
    pub fn axial_force(&self) -> f64 {
        self.axial_force
    }

    /// Axial stress from the last analysis in MPa.
    #[must_use]
    pub fn stress(&self) -> f64 {
        self.axial_force / self.section.area
    }

    /// Yield utilisation from the last analysis.
    #[must_use]
    pub fn stress_utilization(&self) -> f64 {
        self.stress_utilization
    }

    /// Euler buckling utilisation from the last analysis.
    #[must_use]
    pub fn buckling_utilization(&self) -> f64 {
        self.buckling_utilization
    }

    /// Mass of the supplying element in kg for a density in kg/mm³.
    #[must_use]
    pub fn mass(&self, density: f64) -> f64 {
        self.section.area * self.length() * density
    }

    pub(crate) fn supply_from_stock(&mut self, profile: &str, section: SectionProperties) {
        self.profile = profile.to_string();
        self.section = section;
        self.is_from_stock = true;
    }

    pub(crate) fn supply_new(&mut self) {
        self.profile.clone_from(&self.design_profile);
        self.section = self.design_section;
        self.is_from_stock = false;
    }

    pub(crate) fn record_force(&mut self, axial_force: f64) {
        self.axial_force = axial_force;
        self.stress_utilization = stress_utilization(axial_force, &self.section, &self.material);
        self.buckling_utilization =
            buckling_utilization(axial_force, self.length(), &self.section, &self.material);
    }

    pub(crate) fn clear_results(&mut self) {
        self.axial_force = 0.0;
        self.stress_utilization = 0.0;
        self.buckling_utilization = 0.0;
    }
}

/// Ratio of axial stress to yield stress.
///
/// # Examples
/// ```
/// use trussreuse::{stress_utilization, Material, SectionProperties};
///
/// let section = SectionProperties::new(1_000.0, 1.0e6, 1.0e6, 1.0e6);
/// let ratio = stress_utilization(-177_500.0, &section, &Material::steel());
/// assert!((ratio - 0.5).abs() < 1.0e-12);
/// ```
#[must_use]
pub fn stress_utilization(axial_force: f64, section: &SectionProperties, material: &Material) -> f64 {
    axial_force.abs() / (section.area * material.yield_strength)
}

/// Ratio of compressive force to the Euler critical load; zero in tension.
#[must_use]
pub fn buckling_utilization(
    axial_force: f64,
    length: f64,
    section: &SectionProperties,
    material: &Material,
) -> f64 {
    if axial_force >= 0.0 {
        return 0.0;
    }
    let critical = PI * PI * material.elastic_modulus * section.min_inertia() / (length * length);
    -axial_force / critical
}

/// Local stiffness of a bar in global directions.
///
/// The matrix is `EA/L · [ccᵀ, −ccᵀ; −ccᵀ, ccᵀ]` where `c` holds the direction
/// cosines retained by `dimension`, giving 4×4 for planar and 6×6 for spatial
/// bars. Rows and columns are ordered start-end, component by component.
#[must_use]
pub fn local_stiffness(member: &Member, dimension: Dimension) -> DMatrix<f64> {
    let length = member.length();
    let ea_over_l = member.material.elastic_modulus * member.section.area / length;
    let cosines = dimension.components(&member.direction());
    let n = cosines.len();
    DMatrix::from_fn(2 * n, 2 * n, |row, col| {
        let sign = if (row < n) == (col < n) { 1.0 } else { -1.0 };
        sign * ea_over_l * cosines[row % n] * cosines[col % n]
    })
}
