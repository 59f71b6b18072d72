use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use super::summary::load_cycling;
use super::{ExportFormat, InputArgs};

/// Write the per-cycle summary of the inputs to `output`
pub fn run(input: InputArgs, output: PathBuf, format: ExportFormat) -> Result<()> {
    let cycling = load_cycling(&input)?;
    let summaries = cycling.summaries();

    let file = File::create(&output).with_context(|| format!("Failed to create {}", output.display()))?;
    match format {
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(BufWriter::new(file));
            for summary in &summaries {
                writer.serialize(summary).context("Failed to write CSV row")?;
            }
            writer.flush().context("Failed to flush CSV output")?;
        }
        ExportFormat::Json => {
            serde_json::to_writer_pretty(BufWriter::new(file), &summaries).context("Failed to write JSON")?;
        }
    }

    info!("Wrote {} cycles to {}", summaries.len(), output.display());
    Ok(())
}
