use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use signalbt::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "signalbt")]
#[command(about = "A signal-driven strategy backtesting engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DataArgs {
    //path to csv data file
    #[arg(long)]
    data: PathBuf,

    //only keep rows for this symbol
    #[arg(long)]
    symbol: Option<String>,

    //bar interval (eg 1m, 15m, 1h, 1d)
    #[arg(long, default_value = "1h")]
    interval: String,
}

#[derive(Args)]
struct AccountArgs {
    //initial capital
    #[arg(long, default_value = "10000")]
    initial_capital: f64,

    //proportional commission per trade (0.001 = 0.1%)
    #[arg(long, default_value = "0.001")]
    commission: f64,

    //smallest tradable quantity
    #[arg(long, default_value = "0.000001")]
    min_unit: f64,
}

impl AccountArgs {
    fn run_config(&self) -> RunConfig {
        RunConfig {
            initial_capital: self.initial_capital,
            commission_rate: self.commission,
            min_trade_unit: self.min_unit,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    //run a single backtest
    Run {
        //json configuration file, replaces all other options
        #[arg(long)]
        config: Option<PathBuf>,

        //path to csv data file (required without --config)
        #[arg(long)]
        data: Option<PathBuf>,

        #[arg(long)]
        symbol: Option<String>,

        #[arg(long, default_value = "1h")]
        interval: String,

        #[command(flatten)]
        account: AccountArgs,

        //strategy (ma_cross, rsi_signal, bollinger_breakout, macd_cross, momentum,
        //mean_reversion, breakout, turtle, kdj_signal, kama_cross)
        #[arg(long, default_value = "ma_cross")]
        strategy: String,

        //strategy parameter override, eg --set short_window=10
        #[arg(long = "set", value_name = "KEY=VALUE")]
        strategy_overrides: Vec<String>,

        //position policy (all_in, fixed_ratio, staged, pyramid)
        #[arg(long, default_value = "fixed_ratio")]
        policy: String,

        //policy parameter override, eg --policy-set ratio=0.5
        #[arg(long = "policy-set", value_name = "KEY=VALUE")]
        policy_overrides: Vec<String>,

        //output path for equity curve csv
        #[arg(long)]
        output_equity_csv: Option<PathBuf>,

        //output path for trades csv
        #[arg(long)]
        output_trades_csv: Option<PathBuf>,

        //write the resolved configuration as json
        #[arg(long)]
        save_config: Option<PathBuf>,
    },

    //compare strategies and policies over the same data
    Sweep {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        account: AccountArgs,

        //comma separated strategies, all when omitted
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<String>,

        //comma separated policies, all when omitted
        #[arg(long, value_delimiter = ',')]
        policies: Vec<String>,

        //write results as json
        #[arg(long)]
        output_json: Option<PathBuf>,
    },

    //show recent signals and the predicted next trigger prices
    Signals {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long, default_value = "ma_cross")]
        strategy: String,

        #[arg(long = "set", value_name = "KEY=VALUE")]
        strategy_overrides: Vec<String>,

        //number of recent signals to list
        #[arg(long, default_value = "10")]
        recent: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            data,
            symbol,
            interval,
            account,
            strategy,
            strategy_overrides,
            policy,
            policy_overrides,
            output_equity_csv,
            output_trades_csv,
            save_config,
        } => {
            let configuration = match config {
                Some(path) => BacktestConfiguration::from_json_file(&path)
                    .context(format!("Failed to read configuration {:?}", path))?,
                None => {
                    let Some(data_path) = data else {
                        bail!("--data is required unless --config is given");
                    };
                    BacktestConfiguration {
                        data_path,
                        symbol,
                        interval: BarInterval::parse(&interval)?,
                        run: account.run_config(),
                        strategy: strategy_params(&strategy, &strategy_overrides)?,
                        policy: policy_config(&policy, &policy_overrides)?,
                        output_equity_csv,
                        output_trades_csv,
                    }
                }
            };

            if let Some(path) = save_config {
                configuration.to_json_file(&path)?;
                println!("Configuration saved to {:?}", path);
            }

            run_backtest(&configuration)?;
        }
        Commands::Sweep {
            data,
            account,
            strategies,
            policies,
            output_json,
        } => {
            let strategies: Vec<StrategyParams> = if strategies.is_empty() {
                StrategyType::ALL
                    .into_iter()
                    .map(StrategyParams::default_for)
                    .collect()
            } else {
                strategies
                    .iter()
                    .map(|s| -> Result<StrategyParams> {
                        Ok(StrategyParams::default_for(StrategyType::parse(s)?))
                    })
                    .collect::<Result<Vec<_>>>()?
            };
            let policies: Vec<PolicyConfig> = if policies.is_empty() {
                PolicyType::ALL
                    .into_iter()
                    .map(PolicyConfig::default_for)
                    .collect()
            } else {
                policies
                    .iter()
                    .map(|p| -> Result<PolicyConfig> {
                        Ok(PolicyConfig::default_for(PolicyType::parse(p)?))
                    })
                    .collect::<Result<Vec<_>>>()?
            };

            let bars = load_bars(&data)?;
            let interval = BarInterval::parse(&data.interval)?;
            let results = run_sweep(
                &bars,
                &strategies,
                &policies,
                account.run_config(),
                interval.annualization_factor(),
            )?;

            println!("\nSweep Results ({} bars, {})", bars.len(), interval);
            println!("=============\n");
            pretty_print_sweep(&results);

            if let Some(path) = output_json {
                let json = serde_json::to_string_pretty(&results)?;
                std::fs::write(&path, json).context(format!("Failed to write {:?}", path))?;
                println!("\nSweep results saved to {:?}", path);
            }
        }
        Commands::Signals {
            data,
            strategy,
            strategy_overrides,
            recent,
        } => {
            let params = strategy_params(&strategy, &strategy_overrides)?;
            let generator = build_generator(&params)?;
            let bars = load_bars(&data)?;
            let signals = generator.generate(&bars);

            println!("\nSignals for {}", generator.name());
            println!("============\n");
            SignalSummary::from_signals(&bars, &signals, recent).pretty_print_table();
            print_prediction(&generator.predict(&bars));
        }
    }

    Ok(())
}

fn load_bars(args: &DataArgs) -> Result<Vec<Bar>> {
    let bars = load_csv(&args.data, args.symbol.as_deref())
        .context(format!("Failed to load data from {:?}", args.data))?;
    if bars.is_empty() {
        bail!("No bars found in {:?}", args.data);
    }
    Ok(bars)
}

fn run_backtest(configuration: &BacktestConfiguration) -> Result<()> {
    println!("Signal Backtesting Engine");
    println!("=========================\n");

    let data = DataArgs {
        data: configuration.data_path.clone(),
        symbol: configuration.symbol.clone(),
        interval: configuration.interval.to_string(),
    };
    let bars = load_bars(&data)?;
    println!("Loaded {} bars", bars.len());
    println!(
        "Date range: {} to {}\n",
        bars[0].timestamp,
        bars[bars.len() - 1].timestamp
    );

    let generator = build_generator(&configuration.strategy)?;
    let mut policy = build_policy(&configuration.policy)?;
    println!("Strategy: {}", generator.name());
    println!("Policy: {}", policy.name());
    println!(
        "Initial capital: ${:.2}",
        configuration.run.initial_capital
    );
    println!(
        "Commission: {:.4}%\n",
        configuration.run.commission_rate * 100.0
    );

    let signals = generator.generate(&bars);
    let engine = BacktestEngine::new(configuration.run);
    let result = engine.run(&bars, &signals, policy.as_mut())?;

    println!("Backtest Results");
    println!("================\n");
    let metrics =
        SummaryMetrics::from_run(&result, configuration.interval.annualization_factor());
    metrics.pretty_print_table();
    print_prediction(&generator.predict(&bars));

    if let Some(path) = &configuration.output_equity_csv {
        write_equity_csv(&result.equity_curve, path)?;
        println!("\nEquity curve saved to {:?}", path);
    }

    if let Some(path) = &configuration.output_trades_csv {
        write_trades_csv(&result.trades, path)?;
        println!("Trades saved to {:?}", path);
    }

    Ok(())
}

fn print_prediction(prediction: &Prediction) {
    println!();
    if let Some(price) = prediction.next_buy_price {
        println!("Next buy trigger: {:.4}", price);
    }
    if let Some(price) = prediction.next_sell_price {
        println!("Next sell trigger: {:.4}", price);
    }
    if let Some(message) = &prediction.message {
        println!("Prediction: {}", message);
    }
}

fn strategy_params(name: &str, overrides: &[String]) -> Result<StrategyParams> {
    let defaults = StrategyParams::default_for(StrategyType::parse(name)?);
    apply_overrides(&defaults, overrides)
}

fn policy_config(name: &str, overrides: &[String]) -> Result<PolicyConfig> {
    let defaults = PolicyConfig::default_for(PolicyType::parse(name)?);
    apply_overrides(&defaults, overrides)
}

//patches key=value pairs into the json form of a tagged parameter set
//values are read as json (numbers, arrays) and fall back to plain strings
fn apply_overrides<T: Serialize + DeserializeOwned>(base: &T, overrides: &[String]) -> Result<T> {
    let mut value = serde_json::to_value(base)?;
    let Some(fields) = value.as_object_mut() else {
        bail!("Parameters are not a key/value object");
    };

    for entry in overrides {
        let Some((key, raw)) = entry.split_once('=') else {
            bail!("Override '{}' is not of the form key=value", entry);
        };
        let key = key.trim();
        if !fields.contains_key(key) {
            let known: Vec<&String> = fields.keys().collect();
            bail!("Unknown parameter '{}', expected one of {:?}", key, known);
        }
        let parsed = serde_json::from_str(raw.trim())
            .unwrap_or_else(|_| serde_json::Value::String(raw.trim().to_string()));
        fields.insert(key.to_string(), parsed);
    }

    serde_json::from_value(value).context("Invalid parameter override")
}
