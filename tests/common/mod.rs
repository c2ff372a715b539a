use chrono::{Duration, TimeZone, Utc};
use signalbt::data::Bar;

//hourly bars starting 2024-01-01, high/low half a unit around each close
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            Bar::new_unchecked(
                start + Duration::hours(i as i64),
                c,
                c + 0.5,
                (c - 0.5).max(0.0),
                c,
                1000.0,
            )
        })
        .collect()
}
