use crate::config::{PolicyConfig, PolicyType, RunConfig, StrategyParams, StrategyType};
use crate::data::Bar;
use crate::engine::BacktestEngine;
use crate::metrics::SummaryMetrics;
use crate::policy::build_policy;
use crate::signal::{build_generator, Signal, SignalGenerator};
use anyhow::{bail, Result};
use indexmap::IndexMap;
use prettytable::{Cell, Row, Table};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

//one row of a strategy x policy comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub strategy: StrategyType,
    pub policy: PolicyType,
    pub strategy_params: StrategyParams,
    pub policy_config: PolicyConfig,
    pub total_trades: usize,
    pub total_commission: f64,
    pub commission_rate: f64,
    pub total_return: f64,
    pub net_return: f64,
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
}

impl SweepEntry {
    fn from_metrics(
        strategy_params: &StrategyParams,
        policy_config: &PolicyConfig,
        m: &SummaryMetrics,
    ) -> Self {
        SweepEntry {
            strategy: strategy_params.strategy_type(),
            policy: policy_config.policy_type(),
            strategy_params: strategy_params.clone(),
            policy_config: policy_config.clone(),
            total_trades: m.total_trades,
            total_commission: m.total_commission,
            commission_rate: m.commission_rate,
            total_return: m.total_return,
            net_return: m.net_return(),
            win_rate: m.win_rate,
            max_drawdown: m.max_drawdown,
            sharpe_ratio: m.sharpe_ratio,
        }
    }
}

pub fn sweep_key(strategy: &str, policy: &str) -> String {
    format!("{}/{}", strategy, policy)
}

//plain names, or name plus parameter values where a type is swept more than once
fn run_labels<T>(
    items: &[T],
    name: fn(&T) -> &'static str,
    label: fn(&T) -> String,
) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let n = name(item);
            if items.iter().filter(|other| name(other) == n).count() > 1 {
                label(item)
            } else {
                n.to_string()
            }
        })
        .collect()
}

//runs every (strategy, policy) pair over the same bars in parallel
//each run gets its own engine state and its own policy instance
//results keep input order, keyed "strategy/policy"; a type swept with several
//parameter sets is keyed by its parameter values, eg "ma_cross(long_window=8,short_window=3)/all_in"
pub fn run_sweep(
    bars: &[Bar],
    strategies: &[StrategyParams],
    policies: &[PolicyConfig],
    config: RunConfig,
    annualization_factor: f64,
) -> Result<IndexMap<String, SweepEntry>> {
    //configuration errors surface before anything runs
    config.validate()?;
    let generators = strategies
        .iter()
        .map(build_generator)
        .collect::<Result<Vec<Box<dyn SignalGenerator>>, _>>()?;
    for policy in policies {
        build_policy(policy)?;
    }

    let strategy_labels = run_labels(
        strategies,
        |s: &StrategyParams| s.strategy_type().name(),
        StrategyParams::label,
    );
    let policy_labels = run_labels(
        policies,
        |p: &PolicyConfig| p.policy_type().name(),
        PolicyConfig::label,
    );

    let combos: Vec<(usize, usize)> = (0..strategies.len())
        .flat_map(|si| (0..policies.len()).map(move |pi| (si, pi)))
        .collect();
    let mut keys = IndexMap::with_capacity(combos.len());
    for &(si, pi) in &combos {
        let key = sweep_key(&strategy_labels[si], &policy_labels[pi]);
        if keys.insert(key.clone(), ()).is_some() {
            bail!("Duplicate sweep run '{}'", key);
        }
    }

    let signal_sets: Vec<Vec<Signal>> = generators.par_iter().map(|g| g.generate(bars)).collect();
    info!("Sweeping {} combinations over {} bars", combos.len(), bars.len());

    let engine = BacktestEngine::new(config);
    let rows = combos
        .par_iter()
        .map(|&(si, pi)| -> Result<SweepEntry> {
            let mut policy = build_policy(&policies[pi])?;
            let result = engine.run(bars, &signal_sets[si], policy.as_mut())?;
            let metrics = SummaryMetrics::from_run(&result, annualization_factor);
            Ok(SweepEntry::from_metrics(&strategies[si], &policies[pi], &metrics))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(keys.into_keys().zip(rows).collect())
}

//prints the sweep in a formatted table, in sweep order
pub fn pretty_print_sweep(results: &IndexMap<String, SweepEntry>) {
    let mut table = Table::new();
    table.add_row(Row::new(
        [
            "Run",
            "Trades",
            "Commission",
            "Comm. Rate",
            "Return",
            "Net Return",
            "Win Rate",
            "Max DD",
            "Sharpe",
        ]
        .iter()
        .map(|h| Cell::new(h))
        .collect(),
    ));

    for (key, e) in results {
        table.add_row(Row::new(vec![
            Cell::new(key),
            Cell::new(&e.total_trades.to_string()),
            Cell::new(&format!("${:.2}", e.total_commission)),
            Cell::new(&format!("{:.4}%", e.commission_rate * 100.0)),
            Cell::new(&format!("{:.2}%", e.total_return * 100.0)),
            Cell::new(&format!("{:.2}%", e.net_return * 100.0)),
            Cell::new(&format!("{:.2}%", e.win_rate * 100.0)),
            Cell::new(&format!("{:.2}%", e.max_drawdown * 100.0)),
            Cell::new(&format!("{:.3}", e.sharpe_ratio)),
        ]));
    }

    table.printstd();
}
