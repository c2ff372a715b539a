use crate::engine::Trade;
use crate::metrics::EquitySnapshot;
use anyhow::{Context, Result};
use csv::Writer;
use serde::Serialize;
use std::path::Path;

fn write_rows<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let mut writer =
        Writer::from_path(path).context(format!("Failed to create CSV file: {:?}", path))?;
    for row in rows {
        writer
            .serialize(row)
            .context(format!("Failed to write CSV row to {:?}", path))?;
    }
    writer.flush()?;
    Ok(())
}

//writes the trade log, one row per executed trade
pub fn write_trades_csv<P: AsRef<Path>>(trades: &[Trade], path: P) -> Result<()> {
    write_rows(trades, path.as_ref())
}

//writes the equity curve, one row per bar
pub fn write_equity_csv<P: AsRef<Path>>(curve: &[EquitySnapshot], path: P) -> Result<()> {
    write_rows(curve, path.as_ref())
}
