use anyhow::{Context, Result};
use std::path::PathBuf;

use voltcycle::experiment::RateExperiment;

use super::config::Config;
use super::output;
use super::RateSource;

/// Build a rate experiment and print its flat series
pub fn run(path: PathBuf, source: RateSource, config: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config.as_deref())?;
    let manager_config = config.ingest.apply(Default::default());

    let experiment = match source {
        RateSource::BiologicModule => RateExperiment::from_biologic_battery_module(&path, manager_config.units)
            .with_context(|| format!("Failed to read battery module {}", path.display()))?,
        RateSource::RateTable => RateExperiment::from_rate_table(&path)
            .with_context(|| format!("Failed to read rate table {}", path.display()))?,
        RateSource::GamryTree => {
            let (experiment, reports) = RateExperiment::from_gamry_folder_tree(&path, &manager_config)
                .with_context(|| format!("Failed to read folder tree {}", path.display()))?;
            for failure in reports.iter().flat_map(|r| r.failed.iter()) {
                eprintln!("{}", output::warning(&failure.to_string()));
            }
            experiment
        }
    };

    println!("{}", output::heading(&format!("Rate experiment: {}", path.display())));
    println!("{}", experiment);
    println!(
        "{:>5} {:>10} {:>12} {:>8} {:>8} {:>8} {:>8}",
        "cycle", "I [A]", "capacity", "CE", "EE", "VE", "ret."
    );
    let currents = experiment.current_steps();
    let retention = experiment.capacity_retention();
    for ((point, current), retention) in experiment.points().zip(currents).zip(retention) {
        println!(
            "{:>5} {:>10} {:>12} {} {} {} {}",
            point.number,
            current,
            output::value(point.capacity, 4),
            output::efficiency(point.coulomb_efficiency),
            output::efficiency(point.energy_efficiency),
            output::efficiency(point.voltage_efficiency),
            output::efficiency(retention),
        );
    }
    Ok(())
}
