#![warn(clippy::all)]
#![warn(missing_docs)]

//! Truss analysis with reuse of salvaged steel.
//!
//! A [`Structure`] of pin-jointed bars is solved by the direct stiffness
//! method for axial forces. A [`MaterialBank`] of salvaged bars is then
//! matched against the members: every pairing is priced in embodied carbon
//! ([`lca`]), an [`optimizer`] picks which pieces to cut for which members, and
//! the [`Planner`] applies the cuts and analyses the structure again with the
//! reused profiles in place.
//!
//! Lengths are in millimetres, forces in newtons and stresses in megapascals.
//!
//! ```
//! use std::sync::Arc;
//! use trussreuse::{
//!     point, Dimension, LineLoad, Loads, MaterialBank, MemberSpec, Planner, SectionTable,
//!     Structure, TransportDistances,
//! };
//!
//! let sections = Arc::new(SectionTable::builtin());
//! let left = point(0.0, 0.0, 0.0);
//! let apex = point(1_000.0, 0.0, 1_000.0);
//! let right = point(2_000.0, 0.0, 0.0);
//! let mut structure = Structure::new(
//!     &[MemberSpec::new(left, apex, "IPE200"), MemberSpec::new(apex, right, "IPE200")],
//!     &[left, right],
//!     Arc::clone(&sections),
//!     Dimension::Planar,
//! )?;
//! let mut bank = MaterialBank::from_commands(
//!     sections,
//!     300.0,
//!     &["2xIPE200x1500"],
//!     TransportDistances::new(50.0, 20.0, 10.0),
//! )?;
//!
//! let loads = Loads::none().with_line_load(LineLoad::downward(5.0, vec![0, 1]));
//! let plan = Planner::default().plan(&mut structure, &mut bank, &loads)?;
//! assert!(plan.cost.emission < plan.cost.baseline);
//! # Ok::<(), trussreuse::Error>(())
//! ```

pub mod assignment;
pub mod bank;
pub mod errors;
pub mod geometry;
pub mod lca;
pub mod loads;
pub mod member;
pub mod optimizer;
pub mod plan;
pub mod sections;
pub mod structure;

pub use assignment::{Insertion, InsertionMatrix};
pub use bank::{Candidate, CutOutcome, MaterialBank, SortOrder, StockElement, TransportDistances};
pub use errors::{AnalysisError, BankError, Error, ModelError, SectionTableError};
pub use geometry::{point, Displacement, Point};
pub use lca::{
    global_cost, local_cost, new_emission, sequence_cost, GlobalCost, Infeasibility, LcaFactors,
    Substitution,
};
pub use loads::{Distribution, LineLoad, Loads, GRAVITY, STEEL_DENSITY};
pub use member::{
    buckling_utilization, local_stiffness, stress_utilization, Dimension, Material, Member,
    MemberSpec,
};
pub use optimizer::bnb::{BranchAndBound, SearchLimits};
pub use optimizer::result::{SearchOutcome, Termination};
pub use optimizer::stats::SearchStatistics;
pub use optimizer::{Assignment, CostMatrix, Decision, Pricing};
pub use plan::{Plan, PlanSettings, Planner, Strategy};
pub use sections::{SectionProperties, SectionTable};
pub use structure::{MassSummary, Structure};
