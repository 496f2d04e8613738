//! Direct stiffness analysis of pin-jointed bar structures.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector, Vector3};
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, ModelError};
use crate::geometry::{Displacement, Point, COINCIDENCE_TOLERANCE};
use crate::loads::{Loads, GRAVITY, STEEL_DENSITY};
use crate::member::{local_stiffness, Dimension, Member, MemberSpec};
use crate::sections::SectionTable;

/// Ratio between the smallest and largest LU pivot below which the stiffness
/// matrix is treated as singular.
const PIVOT_TOLERANCE: f64 = 1.0e-12;

/// Whether a joint carries unknown displacements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum JointKind {
    /// Free joint with its index into the free-joint catalogue.
    Free(usize),
    /// Pinned support without degrees of freedom.
    Support,
}

/// Internal representation of a truss joint.
#[derive(Clone, Debug)]
struct Joint {
    /// Position of the joint in millimetres.
    position: Point,
    /// Free or supported.
    kind: JointKind,
    /// Solved displacement of the joint.
    displacement: Displacement,
}

/// Matrices of the last successful analysis.
#[derive(Clone, Debug)]
struct Solution {
    /// Global stiffness over the free DOFs.
    stiffness: DMatrix<f64>,
    /// Load vector over the free DOFs.
    loads: DVector<f64>,
    /// Solved displacements over the free DOFs.
    displacements: DVector<f64>,
}

/// Mass of the structure split by supply route, in kg.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MassSummary {
    /// Mass of every member.
    pub total: f64,
    /// Mass of members fabricated new.
    pub new: f64,
    /// Mass of members cut from stock.
    pub reused: f64,
}

/// A pin-jointed truss ready for analysis.
///
/// Joints are created from member endpoints. An endpoint that coincides with a
/// support point becomes a support; every other endpoint becomes a free joint
/// and receives the next free index the first time it is referenced. Member
/// `i` is the `i`-th entry of the member list passed to `Structure::new`.
#[derive(Clone, Debug)]
pub struct Structure {
    /// Joints as nodes, members as edges.
    graph: Graph<Joint, Member>,
    /// Free joints in degree-of-freedom order.
    free_joints: Vec<NodeIndex>,
    /// Distinct support points supplied at construction.
    supports: Vec<Point>,
    /// Planar or spatial analysis.
    dimension: Dimension,
    /// Shared section catalogue.
    sections: Arc<SectionTable>,
    /// Results of the last analysis, cleared on every edit.
    solution: Option<Solution>,
}

impl Structure {
    /// Build a structure from member descriptions and support points.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] for an empty member list, fewer than two distinct
    /// supports, an unknown profile, a zero-length member, non-positive
    /// material values, or a member of a planar model that is not parallel to
    /// the XZ plane.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use trussreuse::{point, Dimension, MemberSpec, SectionTable, Structure};
    ///
    /// let sections = Arc::new(SectionTable::builtin());
    /// let members = [MemberSpec::new(point(0.0, 0.0, 0.0), point(1_000.0, 0.0, 0.0), "IPE200")];
    /// let supports = [point(0.0, 0.0, 0.0), point(1_000.0, 0.0, 0.0)];
    /// let structure = Structure::new(&members, &supports, sections, Dimension::Spatial)?;
    /// assert_eq!(structure.free_joint_count(), 0);
    /// # Ok::<(), trussreuse::ModelError>(())
    /// ```
    pub fn new(
        members: &[MemberSpec],
        supports: &[Point],
        sections: Arc<SectionTable>,
        dimension: Dimension,
    ) -> Result<Self, ModelError> {
        if members.is_empty() {
            return Err(ModelError::NoMembers);
        }
        let mut distinct: Vec<Point> = Vec::new();
        for support in supports {
            if !distinct.iter().any(|known| known.coincides(*support)) {
                distinct.push(*support);
            }
        }
        if distinct.len() < 2 {
            return Err(ModelError::InsufficientSupports {
                found: distinct.len(),
            });
        }

        let mut structure = Self {
            graph: Graph::new(),
            free_joints: Vec::new(),
            supports: distinct,
            dimension,
            sections,
            solution: None,
        };
        for (idx, spec) in members.iter().enumerate() {
            structure.validate_spec(idx, spec)?;
            let section = structure.sections.lookup(&spec.profile)?;
            let start = structure.joint_at(spec.start);
            let end = structure.joint_at(spec.end);
            structure.graph.add_edge(start, end, Member::new(spec, section));
        }
        log::debug!(
            "built {:?} structure: {} members, {} free joints, {} supports",
            dimension,
            structure.member_count(),
            structure.free_joint_count(),
            structure.supports.len()
        );
        Ok(structure)
    }

    /// Reject geometry and material that cannot be analysed.
    fn validate_spec(&self, idx: usize, spec: &MemberSpec) -> Result<(), ModelError> {
        if spec.start.distance(spec.end) <= COINCIDENCE_TOLERANCE {
            return Err(ModelError::ZeroLengthMember(idx));
        }
        if self.dimension == Dimension::Planar
            && (spec.start.y - spec.end.y).abs() > COINCIDENCE_TOLERANCE
        {
            return Err(ModelError::OutOfPlane(idx));
        }
        let material = spec.material;
        if material.elastic_modulus <= 0.0 {
            return Err(ModelError::InvalidMaterial {
                member: idx,
                reason: format!(
                    "elastic modulus must be positive (received {})",
                    material.elastic_modulus
                ),
            });
        }
        if material.yield_strength <= 0.0 {
            return Err(ModelError::InvalidMaterial {
                member: idx,
                reason: format!(
                    "yield strength must be positive (received {})",
                    material.yield_strength
                ),
            });
        }
        Ok(())
    }

    /// Find the joint at `position`, creating it on first reference.
    fn joint_at(&mut self, position: Point) -> NodeIndex {
        if let Some(existing) = self
            .graph
            .node_indices()
            .find(|node| self.graph[*node].position.coincides(position))
        {
            return existing;
        }
        let kind = if self.supports.iter().any(|support| support.coincides(position)) {
            JointKind::Support
        } else {
            JointKind::Free(self.free_joints.len())
        };
        let node = self.graph.add_node(Joint {
            position,
            kind,
            displacement: Displacement::default(),
        });
        if let JointKind::Free(_) = kind {
            self.free_joints.push(node);
        }
        node
    }

    /// Analysis dimension.
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Shared section catalogue.
    #[must_use]
    pub fn sections(&self) -> &Arc<SectionTable> {
        &self.sections
    }

    /// Number of members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of free joints.
    #[must_use]
    pub fn free_joint_count(&self) -> usize {
        self.free_joints.len()
    }

    /// Number of distinct supports.
    #[must_use]
    pub fn support_count(&self) -> usize {
        self.supports.len()
    }

    /// Size of the global stiffness matrix.
    #[must_use]
    pub fn dof_count(&self) -> usize {
        self.dimension.dofs_per_node() * self.free_joints.len()
    }

    /// Positions of the free joints in degree-of-freedom order.
    #[must_use]
    pub fn free_joints(&self) -> Vec<Point> {
        self.free_joints
            .iter()
            .map(|node| self.graph[*node].position)
            .collect()
    }

    /// Distinct support points.
    #[must_use]
    pub fn supports(&self) -> &[Point] {
        &self.supports
    }

    /// Member by index.
    #[must_use]
    pub fn member(&self, member: usize) -> Option<&Member> {
        self.graph.edge_weight(EdgeIndex::new(member))
    }

    /// All members in index order.
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.graph.edge_weights()
    }

    /// Whether results of a successful analysis are available.
    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.solution.is_some()
    }

    /// Global stiffness matrix of the last analysis.
    #[must_use]
    pub fn stiffness_matrix(&self) -> Option<&DMatrix<f64>> {
        self.solution.as_ref().map(|solution| &solution.stiffness)
    }

    /// Global load vector of the last analysis.
    #[must_use]
    pub fn load_vector(&self) -> Option<&DVector<f64>> {
        self.solution.as_ref().map(|solution| &solution.loads)
    }

    /// Displacement vector of the last analysis.
    #[must_use]
    pub fn displacements(&self) -> Option<&DVector<f64>> {
        self.solution.as_ref().map(|solution| &solution.displacements)
    }

    /// Displacement of the `index`-th free joint after analysis.
    #[must_use]
    pub fn free_joint_displacement(&self, index: usize) -> Option<Displacement> {
        self.solution.as_ref()?;
        self.free_joints
            .get(index)
            .map(|node| self.graph[*node].displacement)
    }

    /// Axial forces of all members in index order, tension positive.
    #[must_use]
    pub fn axial_forces(&self) -> Vec<f64> {
        self.members().map(Member::axial_force).collect()
    }

    /// Supply a member from a stock piece of `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownMember`] or [`ModelError::UnknownProfile`].
    pub fn supply_from_stock(&mut self, member: usize, profile: &str) -> Result<(), ModelError> {
        let section = self.sections.lookup(profile)?;
        let edge = self
            .graph
            .edge_weight_mut(EdgeIndex::new(member))
            .ok_or(ModelError::UnknownMember(member))?;
        edge.supply_from_stock(profile, section);
        self.invalidate();
        Ok(())
    }

    /// Return a member to new fabrication of its design profile.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownMember`] when `member` does not exist.
    pub fn supply_new(&mut self, member: usize) -> Result<(), ModelError> {
        let edge = self
            .graph
            .edge_weight_mut(EdgeIndex::new(member))
            .ok_or(ModelError::UnknownMember(member))?;
        edge.supply_new();
        self.invalidate();
        Ok(())
    }

    /// Mass split between new and reused members for a density in kg/mm³.
    #[must_use]
    pub fn mass_summary(&self, density: f64) -> MassSummary {
        self.members().fold(MassSummary::default(), |mut summary, member| {
            let mass = member.mass(density);
            summary.total += mass;
            if member.is_from_stock() {
                summary.reused += mass;
            } else {
                summary.new += mass;
            }
            summary
        })
    }

    /// Analyse the structure under `loads`.
    ///
    /// Every call assembles and solves from scratch, so repeated calls with the
    /// same inputs give identical results.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::SingularStiffness`] when the structure is a
    /// mechanism, and a load error when a line load is malformed. On error the
    /// previous results are discarded.
    pub fn evaluate(&mut self, loads: &Loads) -> Result<(), AnalysisError> {
        self.invalidate();
        let stiffness = self.build_stiffness_matrix();
        let load = self.build_load_vector(loads)?;
        let displacements = Self::solve_displacements(&stiffness, &load)?;
        self.store_joint_displacements(&displacements);
        self.update_member_forces();
        log::debug!(
            "solved {} degrees of freedom, max |N| = {:.1} N",
            displacements.len(),
            self.members()
                .map(|member| member.axial_force().abs())
                .fold(0.0, f64::max)
        );
        self.solution = Some(Solution {
            stiffness,
            loads: load,
            displacements,
        });
        Ok(())
    }

    /// Reset cached analysis results when the structure changes.
    fn invalidate(&mut self) {
        if self.solution.take().is_some() {
            for joint in self.graph.node_weights_mut() {
                joint.displacement = Displacement::default();
            }
            for member in self.graph.edge_weights_mut() {
                member.clear_results();
            }
        }
    }

    /// Global degree-of-freedom indices of a joint, if it is free.
    fn joint_dofs(&self, node: NodeIndex) -> Option<std::ops::Range<usize>> {
        match self.graph[node].kind {
            JointKind::Free(idx) => {
                let per_node = self.dimension.dofs_per_node();
                Some(idx * per_node..(idx + 1) * per_node)
            }
            JointKind::Support => None,
        }
    }

    /// Assemble the global stiffness matrix over the free degrees of freedom.
    fn build_stiffness_matrix(&self) -> DMatrix<f64> {
        let dof = self.dof_count();
        let per_node = self.dimension.dofs_per_node();
        let mut matrix = DMatrix::zeros(dof, dof);
        for edge in self.graph.edge_indices() {
            let Some((start, end)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            let local = local_stiffness(&self.graph[edge], self.dimension);
            // Local row `i` maps to the global index of the owning end, or to
            // nothing when that end is a support.
            let dof_map: Vec<Option<usize>> = [start, end]
                .into_iter()
                .flat_map(|node| match self.joint_dofs(node) {
                    Some(range) => range.map(Some).collect::<Vec<_>>(),
                    None => vec![None; per_node],
                })
                .collect();

            for (row_local, global_row) in dof_map.iter().enumerate() {
                let Some(global_row) = global_row else {
                    continue;
                };
                for (col_local, global_col) in dof_map.iter().enumerate() {
                    if let Some(global_col) = global_col {
                        matrix[(*global_row, *global_col)] += local[(row_local, col_local)];
                    }
                }
            }
        }
        matrix
    }

    /// Add `force` to the load vector at `node` if the joint is free.
    fn lump(&self, load: &mut DVector<f64>, node: NodeIndex, force: &Vector3<f64>) {
        if let Some(range) = self.joint_dofs(node) {
            for (dof, component) in range.zip(self.dimension.components(force)) {
                load[dof] += component;
            }
        }
    }

    /// Assemble the global load vector from nodal, line and self-weight loads.
    fn build_load_vector(&self, loads: &Loads) -> Result<DVector<f64>, AnalysisError> {
        let dof = self.dof_count();
        let mut load = DVector::zeros(dof);
        for (slot, value) in load.iter_mut().zip(&loads.nodal) {
            *slot = *value;
        }

        for line_load in &loads.line_loads {
            let direction = line_load
                .unit_direction()
                .ok_or(AnalysisError::ZeroLoadDirection)?;
            for &member in &line_load.members {
                let edge = EdgeIndex::new(member);
                let (Some(bar), Some((start, end))) =
                    (self.graph.edge_weight(edge), self.graph.edge_endpoints(edge))
                else {
                    return Err(AnalysisError::UnknownLoadedMember(member));
                };
                let length = line_load
                    .loaded_length(bar.length(), &bar.direction())
                    .ok_or(AnalysisError::ZeroLoadDirection)?;
                let half = direction * (line_load.value * length / 2.0);
                self.lump(&mut load, start, &half);
                self.lump(&mut load, end, &half);
            }
        }

        if loads.self_weight {
            for edge in self.graph.edge_indices() {
                let Some((start, end)) = self.graph.edge_endpoints(edge) else {
                    continue;
                };
                let weight = self.graph[edge].mass(STEEL_DENSITY) * GRAVITY;
                let half = Vector3::new(0.0, 0.0, -weight / 2.0);
                self.lump(&mut load, start, &half);
                self.lump(&mut load, end, &half);
            }
        }
        Ok(load)
    }

    /// Solve `K·r = R` with a dense LU factorisation.
    fn solve_displacements(
        stiffness: &DMatrix<f64>,
        load: &DVector<f64>,
    ) -> Result<DVector<f64>, AnalysisError> {
        if load.is_empty() {
            return Ok(DVector::zeros(0));
        }
        let lu = stiffness.clone().lu();
        let pivots = lu.u().diagonal();
        let largest = pivots.iter().fold(0.0_f64, |acc, pivot| acc.max(pivot.abs()));
        let smallest = pivots
            .iter()
            .fold(f64::INFINITY, |acc, pivot| acc.min(pivot.abs()));
        if largest == 0.0 || smallest / largest < PIVOT_TOLERANCE {
            return Err(AnalysisError::SingularStiffness);
        }
        let solution = lu.solve(load).ok_or(AnalysisError::SingularStiffness)?;
        if solution.iter().any(|value| !value.is_finite()) {
            return Err(AnalysisError::SingularStiffness);
        }
        Ok(solution)
    }

    /// Persist solved displacements on the free joints.
    fn store_joint_displacements(&mut self, displacements: &DVector<f64>) {
        let per_node = self.dimension.dofs_per_node();
        for (idx, node) in self.free_joints.iter().enumerate() {
            let base = idx * per_node;
            let displacement = match self.dimension {
                Dimension::Planar => {
                    Displacement::new(displacements[base], 0.0, displacements[base + 1])
                }
                Dimension::Spatial => Displacement::new(
                    displacements[base],
                    displacements[base + 1],
                    displacements[base + 2],
                ),
            };
            self.graph[*node].displacement = displacement;
        }
    }

    /// Retrack axial forces from the change in member length.
    fn update_member_forces(&mut self) {
        for edge in self.graph.edge_indices() {
            let Some((start, end)) = self.graph.edge_endpoints(edge) else {
                continue;
            };
            let start = &self.graph[start];
            let end = &self.graph[end];
            let deformed = start
                .position
                .displaced(start.displacement)
                .distance(end.position.displaced(end.displacement));
            let member = &mut self.graph[edge];
            let original = member.length();
            let axial_force = member.material().elastic_modulus * member.section().area
                * (deformed - original)
                / original;
            member.record_force(axial_force);
        }
    }
}
