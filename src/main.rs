mod report;
mod scenario;

use report::render_plan;
use scenario::Scenario;
use std::error::Error;
use trussreuse::Planner;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: trussreuse <scenario.json>")?;

    // Geometry, supports, loads and stock all come from one JSON file.
    let scenario = Scenario::from_path(&path)?;
    let (mut structure, mut bank) = scenario.build()?;

    // Analyse, assign stock, cut the bank and analyse again.
    let plan = Planner::new(scenario.settings).plan(&mut structure, &mut bank, &scenario.loads)?;

    println!("{}", render_plan(&structure, &bank, &plan));
    Ok(())
}
