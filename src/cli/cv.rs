use anyhow::{Context, Result};
use std::path::PathBuf;

use voltcycle::voltammetry::CyclicVoltammetry;

use super::output;

/// Print the cycles and settings of a voltammogram
pub fn run(file: PathBuf) -> Result<()> {
    let cv = CyclicVoltammetry::from_file(&file)
        .with_context(|| format!("Failed to read voltammogram {}", file.display()))?;

    println!("{}", output::heading("Cyclic Voltammetry"));
    println!("File:            {}", cv.name);
    println!("Format:          {}", cv.format);
    println!("Scan rate:       {}", output::value(cv.settings.scan_rate, 3));
    println!("Initial E [V]:   {}", output::value(cv.settings.initial_voltage, 3));
    println!("Final E [V]:     {}", output::value(cv.settings.final_voltage, 3));
    println!("Cycles:          {}", cv.len());
    if let Some((low, high)) = cv.potential_window() {
        println!("Window [V]:      {:.3} .. {:.3}", low, high);
    }
    println!();
    for cycle in &cv {
        println!("  cycle {:>3}: {} points", cycle.number, cycle.voltage.len());
    }
    Ok(())
}
