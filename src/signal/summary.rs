use crate::data::Bar;
use crate::signal::Signal;
use chrono::{DateTime, Utc};
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};

//counts of actionable signals plus the most recent ones
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub total_bars: usize,
    pub buy_count: usize,
    pub sell_count: usize,

    //latest non-hold signals, oldest first
    pub recent: Vec<(DateTime<Utc>, Signal)>,
}

impl SignalSummary {
    pub fn from_signals(bars: &[Bar], signals: &[Signal], recent_n: usize) -> Self {
        let actions: Vec<(DateTime<Utc>, Signal)> = bars
            .iter()
            .zip(signals)
            .filter(|(_, s)| s.is_action())
            .map(|(b, s)| (b.timestamp, *s))
            .collect();

        let buy_count = actions.iter().filter(|(_, s)| *s == Signal::Buy).count();
        let sell_count = actions.len() - buy_count;
        let skip = actions.len().saturating_sub(recent_n);

        SignalSummary {
            total_bars: bars.len().min(signals.len()),
            buy_count,
            sell_count,
            recent: actions.into_iter().skip(skip).collect(),
        }
    }

    pub fn last_signal(&self) -> Option<Signal> {
        self.recent.last().map(|(_, s)| *s)
    }

    pub fn pretty_print_table(&self) {
        let mut table = Table::new();
        table.add_row(Row::new(vec![Cell::new("Timestamp"), Cell::new("Signal")]));

        for (timestamp, signal) in &self.recent {
            let label = match signal {
                Signal::Buy => "BUY",
                Signal::Sell => "SELL",
                Signal::Hold => "HOLD",
            };
            table.add_row(Row::new(vec![
                Cell::new(&timestamp.to_rfc3339()),
                Cell::new(label),
            ]));
        }

        println!(
            "{} bars, {} buy signals, {} sell signals",
            self.total_bars, self.buy_count, self.sell_count
        );
        table.printstd();
    }
}
