use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use trussreuse::{
    BankError, Dimension, Loads, MaterialBank, MemberSpec, PlanSettings, Point, SectionTable,
    SectionTableError, Structure, TransportDistances,
};

/// Failure to turn a scenario file into a model.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The file could not be read.
    #[error("could not read scenario {path:?}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid scenario.
    #[error("invalid scenario: {0}")]
    Parse(#[from] serde_json::Error),
    /// The section table could not be loaded.
    #[error(transparent)]
    Sections(#[from] SectionTableError),
    /// The structure is not well formed.
    #[error(transparent)]
    Model(#[from] trussreuse::ModelError),
    /// The stock list is not well formed.
    #[error(transparent)]
    Bank(#[from] BankError),
}

/// Stock on offer.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BankSpec {
    /// Commands of the form `<quantity>x<profile>x<length>`.
    pub stock: Vec<String>,
    /// Shortest off-cut still offered for reuse, mm.
    pub min_reusable_length: f64,
    /// Transport distances shared by every piece, km.
    pub distances: TransportDistances,
}

impl Default for BankSpec {
    fn default() -> Self {
        Self {
            stock: Vec::new(),
            min_reusable_length: MaterialBank::DEFAULT_MIN_REUSABLE_LENGTH,
            distances: TransportDistances::default(),
        }
    }
}

/// Everything a planning run needs, as read from JSON.
#[derive(Clone, Debug, Deserialize)]
pub struct Scenario {
    /// Planar (XZ) or spatial analysis.
    #[serde(default)]
    pub dimension: Dimension,
    /// Members in design profiles.
    pub members: Vec<MemberSpec>,
    /// Pinned joints.
    pub supports: Vec<Point>,
    /// Loading.
    #[serde(default)]
    pub loads: Loads,
    /// Salvaged stock.
    #[serde(default)]
    pub bank: BankSpec,
    /// Planner configuration.
    #[serde(default)]
    pub settings: PlanSettings,
    /// Section table file, relative to the scenario; the built-in table when absent.
    #[serde(default)]
    pub sections: Option<PathBuf>,
    /// Directory of the scenario file.
    #[serde(skip)]
    directory: PathBuf,
}

impl Scenario {
    /// Read a scenario from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scenario: Scenario = serde_json::from_str(&text)?;
        scenario.directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        log::debug!(
            "scenario {path:?}: {} members, {} supports, {} stock commands",
            scenario.members.len(),
            scenario.supports.len(),
            scenario.bank.stock.len()
        );
        Ok(scenario)
    }

    /// Build the structure and the bank over one shared section table.
    pub fn build(&self) -> Result<(Structure, MaterialBank), ScenarioError> {
        let sections = match &self.sections {
            Some(file) => SectionTable::from_path(self.directory.join(file))?,
            None => SectionTable::builtin(),
        };
        let sections = Arc::new(sections);
        let structure = Structure::new(
            &self.members,
            &self.supports,
            Arc::clone(&sections),
            self.dimension,
        )?;
        let bank = MaterialBank::from_commands(
            sections,
            self.bank.min_reusable_length,
            &self.bank.stock,
            self.bank.distances,
        )?;
        Ok((structure, bank))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "dimension": "planar",
        "members": [
            { "start": { "x": 0.0, "y": 0.0, "z": 0.0 }, "end": { "x": 1000.0, "y": 0.0, "z": 1000.0 }, "profile": "IPE200" },
            { "start": { "x": 1000.0, "y": 0.0, "z": 1000.0 }, "end": { "x": 2000.0, "y": 0.0, "z": 0.0 }, "profile": "IPE200" }
        ],
        "supports": [ { "x": 0.0, "y": 0.0, "z": 0.0 }, { "x": 2000.0, "y": 0.0, "z": 0.0 } ],
        "loads": { "nodal": [0.0, -10000.0] },
        "bank": { "stock": ["2xIPE200x1500"] },
        "settings": { "strategy": "greedy" }
    }"#;

    #[test]
    fn parses_and_builds_with_defaults() {
        let scenario: Scenario = serde_json::from_str(SCENARIO).expect("valid scenario");
        assert_eq!(scenario.dimension, Dimension::Planar);
        assert_eq!(scenario.bank.min_reusable_length, 300.0);
        assert_eq!(scenario.settings.strategy, trussreuse::Strategy::Greedy);
        assert!(scenario.settings.keep_offcuts);

        let (structure, bank) = scenario.build().expect("consistent scenario");
        assert_eq!(structure.member_count(), 2);
        assert_eq!(structure.dof_count(), 2);
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn sample_scenario_plans() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/portal.json");
        let scenario = Scenario::from_path(path).expect("sample scenario parses");
        assert_eq!(scenario.settings.limits.beam_width, 2);
        assert_eq!(scenario.settings.limits.max_live_nodes, 1_000);

        let (mut structure, mut bank) = scenario.build().expect("sample scenario builds");
        let plan = trussreuse::Planner::new(scenario.settings)
            .plan(&mut structure, &mut bank, &scenario.loads)
            .expect("sample scenario plans");
        assert!(plan.cost.emission <= plan.cost.baseline);
        assert_eq!(
            plan.insertions.len() + plan.unassigned.len(),
            structure.member_count()
        );
    }

    #[test]
    fn missing_file_is_reported() {
        let error = Scenario::from_path("/nonexistent/scenario.json").expect_err("no such file");
        assert!(matches!(error, ScenarioError::Io { .. }));
    }
}
