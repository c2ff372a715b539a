use crate::data::bar::Bar;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CsvRecord {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    #[serde(default)]
    symbol: Option<String>,
}

//accepts rfc3339 or "YYYY-MM-DD HH:MM:SS" (taken as utc)
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .with_context(|| format!("Unrecognised timestamp '{}'", raw))?;
    Ok(naive.and_utc())
}

//loads bars from a csv file, keeping only rows for `symbol` when given
//with a symbol filter, rows that carry no symbol are skipped
pub fn load_csv<P: AsRef<Path>>(path: P, symbol: Option<&str>) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let mut bars = Vec::new();

    for (index, result) in reader.deserialize().enumerate() {
        let record: CsvRecord =
            result.context(format!("Failed to parse CSV record at line {}", index + 2))?;

        if let Some(wanted) = symbol {
            if record.symbol.as_deref() != Some(wanted) {
                continue;
            }
        }

        let timestamp = parse_timestamp(&record.timestamp)
            .context(format!("Bad timestamp at line {}", index + 2))?;

        bars.push(Bar::new_unchecked(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    //sort by timestamp to ensure chronological order
    bars.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    bars.dedup_by(|a, b| a.timestamp == b.timestamp);

    tracing::debug!("Loaded {} bars from {:?}", bars.len(), path);

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_and_sorts_rows() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-01T02:00:00Z,3,3,3,3,10\n\
             2024-01-01T01:00:00Z,2,2,2,2,10\n\
             2024-01-01 00:00:00,1,1,1,1,10\n",
        );
        let bars = load_csv(file.path(), None).unwrap();
        assert_eq!(bars.len(), 3);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn filters_by_symbol() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume,symbol\n\
             2024-01-01T00:00:00Z,1,1,1,1,10,BTC/USDT\n\
             2024-01-01T00:00:00Z,9,9,9,9,10,ETH/USDT\n\
             2024-01-01T01:00:00Z,2,2,2,2,10,BTC/USDT\n",
        );
        let bars = load_csv(file.path(), Some("BTC/USDT")).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars.iter().all(|b| b.close < 5.0));
    }

    #[test]
    fn symbol_filter_skips_rows_without_a_symbol() {
        let file = write_csv(
            "timestamp,open,high,low,close,volume,symbol\n\
             2024-01-01T00:00:00Z,1,1,1,1,10,BTC/USDT\n\
             2024-01-01T01:00:00Z,7,7,7,7,10,\n\
             2024-01-01T02:00:00Z,2,2,2,2,10,BTC/USDT\n",
        );
        let bars = load_csv(file.path(), Some("BTC/USDT")).unwrap();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0]);

        let unfiltered = load_csv(file.path(), None).unwrap();
        assert_eq!(unfiltered.len(), 3);
    }

    #[test]
    fn reports_bad_timestamp() {
        let file = write_csv("timestamp,open,high,low,close,volume\nyesterday,1,1,1,1,1\n");
        assert!(load_csv(file.path(), None).is_err());
    }
}
