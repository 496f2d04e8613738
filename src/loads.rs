//! Loading: nodal loads, line loads on members and self-weight.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Density of structural steel in kg/mm³.
pub const STEEL_DENSITY: f64 = 7.85e-6;

/// Gravitational acceleration in m/s², so that `kg · GRAVITY` is in newtons.
pub const GRAVITY: f64 = 9.81;

/// How a line load value is distributed over a member.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    /// Value per unit length of the member.
    #[default]
    AlongMember,
    /// Value per unit length of the member projected onto the plane normal to the
    /// given axis, e.g. `[0, 0, 1]` for snow measured on plan.
    Projected([f64; 3]),
}

/// Uniform load on a set of members, lumped half to each end joint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineLoad {
    /// Intensity in N/mm.
    pub value: f64,
    /// Direction the load acts in; normalised before use.
    pub direction: [f64; 3],
    /// Length measure the intensity refers to.
    #[serde(default)]
    pub distribution: Distribution,
    /// Indices of the loaded members.
    pub members: Vec<usize>,
}

impl LineLoad {
    /// Gravity-direction load on `members` measured along each member.
    #[must_use]
    pub fn downward(value: f64, members: Vec<usize>) -> Self {
        Self {
            value,
            direction: [0.0, 0.0, -1.0],
            distribution: Distribution::AlongMember,
            members,
        }
    }

    /// Effective length of a member with direction `axis_of_member` and length
    /// `length`, or `None` when a projection axis is the zero vector.
    pub(crate) fn loaded_length(&self, length: f64, axis_of_member: &Vector3<f64>) -> Option<f64> {
        match self.distribution {
            Distribution::AlongMember => Some(length),
            Distribution::Projected(axis) => {
                let axis = Vector3::from(axis);
                let norm = axis.norm();
                if norm == 0.0 {
                    return None;
                }
                let along = length * axis_of_member.dot(&axis) / norm;
                Some((length * length - along * along).max(0.0).sqrt())
            }
        }
    }

    /// Unit load direction, or `None` for a zero vector.
    pub(crate) fn unit_direction(&self) -> Option<Vector3<f64>> {
        let direction = Vector3::from(self.direction);
        let norm = direction.norm();
        (norm > 0.0).then(|| direction / norm)
    }
}

/// Everything that loads the structure for one analysis.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Loads {
    /// Flat list of nodal load components in N, `dofs_per_node` per free joint in
    /// free-joint order. Shorter lists are padded with zeros, longer ones are
    /// truncated.
    pub nodal: Vec<f64>,
    /// Distributed loads on members.
    pub line_loads: Vec<LineLoad>,
    /// Add the weight of every member, acting in −Z.
    pub self_weight: bool,
}

impl Loads {
    /// No load at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Nodal components only.
    #[must_use]
    pub fn nodal(components: Vec<f64>) -> Self {
        Self {
            nodal: components,
            ..Self::default()
        }
    }

    /// Add a line load.
    #[must_use]
    pub fn with_line_load(mut self, load: LineLoad) -> Self {
        self.line_loads.push(load);
        self
    }

    /// Toggle self-weight.
    #[must_use]
    pub fn with_self_weight(mut self, enabled: bool) -> Self {
        self.self_weight = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projected_length_of_inclined_member() {
        let load = LineLoad {
            value: 1.0,
            direction: [0.0, 0.0, -1.0],
            distribution: Distribution::Projected([0.0, 0.0, 2.0]),
            members: vec![0],
        };
        let axis = Vector3::new(3.0, 0.0, 4.0) / 5.0;
        let effective = load.loaded_length(5_000.0, &axis).expect("axis is non-zero");
        assert!((effective - 3_000.0).abs() < 1.0e-9);
    }

    #[test]
    fn zero_direction_is_rejected() {
        let load = LineLoad {
            value: 1.0,
            direction: [0.0, 0.0, 0.0],
            distribution: Distribution::AlongMember,
            members: vec![],
        };
        assert!(load.unit_direction().is_none());
    }

    #[test]
    fn deserializes_with_defaults() {
        let loads: Loads = serde_json::from_str(
            r#"{"line_loads":[{"value":2.0,"direction":[0,0,-1],"members":[1]}]}"#,
        )
        .expect("valid json");
        assert!(loads.nodal.is_empty());
        assert!(!loads.self_weight);
        assert_eq!(loads.line_loads[0].distribution, Distribution::AlongMember);
    }
}
