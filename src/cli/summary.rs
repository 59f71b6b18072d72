use anyhow::{bail, Context, Result};
use log::info;

use voltcycle::cycles::CellCycling;
use voltcycle::manager::{FetchReport, FileManager};

use super::config::Config;
use super::output;
use super::InputArgs;

/// Fetch the inputs into one session and build the cycling sequence
pub fn load_cycling(input: &InputArgs) -> Result<CellCycling> {
    let config = Config::load(input.config.as_deref())?;
    let mut manager = FileManager::with_config(config.ingest.apply(Default::default()));

    let mut report = FetchReport::default();
    if let Some(folder) = &input.folder {
        report.merge(
            manager
                .fetch_from_folder(folder, &input.extension)
                .with_context(|| format!("Failed to fetch folder {}", folder.display()))?,
        );
    }
    if !input.paths.is_empty() {
        report.merge(manager.fetch(&input.paths));
    }
    if report.attempted() == 0 {
        bail!("No input files given (pass PATHS or --folder)");
    }

    for failure in &report.failed {
        eprintln!("{}", output::warning(&failure.to_string()));
    }
    if input.all_or_nothing {
        report = report.into_result()?;
    }
    info!("{} records from {} files", report.records, report.loaded.len());

    manager.into_cellcycling().context("Failed to build cycles")
}

/// Print a per-cycle table
pub fn run(input: InputArgs) -> Result<()> {
    let cycling = load_cycling(&input)?;
    let units = cycling
        .get(0)
        .and_then(|c| c.charge().or(c.discharge()))
        .map(|h| h.units())
        .unwrap_or_default();
    let retention = cycling.capacity_retention();

    println!("{}", output::heading("Cell Cycling Summary"));
    println!("{}", cycling);
    println!(
        "{:>5} {:>12} {:>12} {:>8} {:>8} {:>8} {:>8}",
        "cycle",
        format!("Qc [{}]", units.charge),
        format!("Qd [{}]", units.charge),
        "CE",
        "EE",
        "VE",
        "ret."
    );
    for (cycle, retention) in cycling.iter().zip(retention) {
        println!(
            "{:>5} {:>12} {:>12} {} {} {} {}",
            cycle.number(),
            output::value(cycle.capacity_charge(), 4),
            output::value(cycle.capacity_discharge(), 4),
            output::efficiency(cycle.coulomb_efficiency()),
            output::efficiency(cycle.energy_efficiency()),
            output::efficiency(cycle.voltage_efficiency()),
            output::efficiency(retention),
        );
    }
    Ok(())
}
