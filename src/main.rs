mod analyzer;
mod collector;
mod daterange;
mod error;
mod filter;
mod gains;
mod risk;
mod storage;
mod table;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::analyzer::{Analysis, Analyzer, AnalyzerKind, cumulative_averages, ratio_series};
use crate::collector::Collector;
use crate::daterange::{DateRange, Period};
use crate::filter::FilterSpec;
use crate::risk::{RiskCalculator, RiskKind};
use crate::storage::CandidatesFile;
use crate::table::SummaryRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Operation {
    /// Analyze every ticker in the list
    Analysis,
    /// Gate tickers through the attribute filter and collect candidates
    Lookup,
}

#[derive(Parser)]
#[command(
    name = "edge-screener",
    about = "Screens daily candles for recurring rising edge entries",
    version
)]
struct Args {
    /// File containing ticker symbols, one per line
    #[arg(short, long)]
    tickers: PathBuf,

    /// Operation mode
    #[arg(short, long, value_enum, default_value = "analysis")]
    operation: Operation,

    /// Analyzer kind: re, avg or ratio
    #[arg(short, long)]
    analyzer: String,

    /// Risk calculator kind: re or entry
    #[arg(short, long, default_value = "re")]
    risk: String,

    /// Wanted gain in percent
    #[arg(short, long)]
    gains: u32,

    /// Max waiting period, e.g. 3w, 20d, 2m, 3y
    #[arg(short, long)]
    period: String,

    /// Period multiple for sampling
    #[arg(short, long)]
    multiple: u32,

    /// Market data provider
    #[arg(long, default_value = "yahoo")]
    collector: String,

    /// Highest acceptable risk for lookup candidates, in percent
    #[arg(long, default_value_t = 50.0)]
    appetite: f64,

    /// JSON filter spec for lookup mode (defaults to the built-in gate)
    #[arg(long)]
    filter: Option<PathBuf>,

    /// Delay between ticker fetches, in milliseconds
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// Candidates output file for lookup mode
    #[arg(long, default_value = "candidates.txt")]
    candidates: PathBuf,
}

struct Pipeline {
    collector: Collector,
    analyzer_kind: AnalyzerKind,
    risk_kind: RiskKind,
    wanted_gain: f64,
    period_days: usize,
}

struct TickerReport {
    positive_entry_points: usize,
    risk: f64,
}

/// Fetch, analyze and score one ticker. Any error here is scoped to
/// the ticker and makes the batch loop skip it.
async fn analyze_ticker(pipeline: &Pipeline, ticker: &str) -> error::Result<TickerReport> {
    let candles = pipeline.collector.get_candle_data(ticker).await?;
    info!(ticker, days = candles.len(), "candles fetched");

    // Rising edge counters back both risk strategies.
    let mut rising = Analyzer::rising_edge(
        candles.clone(),
        pipeline.wanted_gain,
        pipeline.period_days,
    )?;
    rising.analyze()?;
    let entry_counts = rising.result()?.entry_points()?.to_vec();

    if pipeline.analyzer_kind == AnalyzerKind::RisingEdge {
        print_analysis(rising.result()?);
    } else {
        let mut display = Analyzer::new(
            pipeline.analyzer_kind,
            candles.clone(),
            pipeline.wanted_gain,
            pipeline.period_days,
        )?;
        display.analyze()?;
        print_analysis(display.result()?);
    }

    let risk = match pipeline.risk_kind {
        RiskKind::FailureFrequency => {
            RiskCalculator::FailureFrequency {
                entry_counts: &entry_counts,
            }
            .calculate(&pipeline.collector)
            .await?
        }
        RiskKind::PriceEntry => {
            let averages = cumulative_averages(&candles);
            let ratios = ratio_series(&candles, &averages.rolling_avg_price)?;
            RiskCalculator::PriceEntry {
                ticker,
                avg_price: averages.avg_price,
                entry_counts: &entry_counts,
                price_avg_ratios: &ratios,
            }
            .calculate(&pipeline.collector)
            .await?
        }
    };

    Ok(TickerReport {
        positive_entry_points: entry_counts.iter().filter(|&&count| count > 0).count(),
        risk,
    })
}

fn print_analysis(analysis: &Analysis) {
    match analysis {
        Analysis::EntryPoints(counts) => println!("Entry point counters: {counts:?}"),
        Analysis::Averages(averages) => println!(
            "Average price: {:.2}  average volume: {:.0}",
            averages.avg_price, averages.avg_volume
        ),
        Analysis::PriceRatio(ratios) => {
            if let Some(last) = ratios.last() {
                println!("Price to rolling average ratio (latest): {last:.4}");
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("edge_screener=info")),
        )
        .init();

    let args = Args::parse();
    if args.gains == 0 {
        bail!("--gains must be positive");
    }

    let period = Period::parse(&args.period)?;
    let range = DateRange::new(period, args.multiple);
    let analyzer_kind = AnalyzerKind::from_kind(&args.analyzer)?;
    let risk_kind = RiskKind::from_kind(&args.risk)?;
    let collector = Collector::new(&args.collector, range)?;

    let pipeline = Pipeline {
        collector,
        analyzer_kind,
        risk_kind,
        wanted_gain: f64::from(args.gains),
        period_days: period.days() as usize,
    };

    let tickers = storage::load_tickers(&args.tickers).await?;
    if tickers.is_empty() {
        bail!("no tickers in {:?}", args.tickers);
    }

    let lookup = args.operation == Operation::Lookup;
    let filter_spec = match (&args.filter, lookup) {
        (Some(path), true) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading filter spec {path:?}"))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing filter spec {path:?}"))?
        }
        _ => FilterSpec::lookup_default(),
    };
    let candidates = if lookup {
        Some(CandidatesFile::create(&args.candidates).await?)
    } else {
        None
    };

    println!(
        "Starting analysis using gains={}%, period={}, multiple={}",
        args.gains, args.period, args.multiple
    );
    println!("Sampling between {} and {}", range.start, range.end);

    let mut rows = Vec::new();
    for (i, ticker) in tickers.iter().enumerate() {
        if i > 0 && args.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.delay_ms)).await;
        }

        println!(
            "\n[ {ticker} from {} to {}, gains={}%, period={} ]",
            range.start, range.end, args.gains, args.period
        );

        if lookup {
            println!("Applying filter...");
            match pipeline.collector.get_quote(ticker).await {
                Ok(quote) if filter_spec.check(&quote) => println!("Filter passed"),
                Ok(_) => {
                    println!("Filter failed");
                    continue;
                }
                Err(e) => {
                    warn!(ticker = %ticker, error = %e, "quote fetch failed");
                    println!("Skipping {ticker}: {e}");
                    continue;
                }
            }
        }

        let report = match analyze_ticker(&pipeline, ticker).await {
            Ok(report) => report,
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "analysis failed");
                println!("Skipping {ticker}: {e}");
                continue;
            }
        };

        println!("Risk: {:.2}%", report.risk);

        let accepted = lookup && report.risk <= args.appetite;
        if accepted {
            if let Some(candidates) = &candidates {
                candidates.append(ticker).await?;
            }
            println!("{ticker} kept as candidate");
        }

        rows.push(SummaryRow {
            ticker: ticker.clone(),
            positive_entry_points: report.positive_entry_points,
            risk: report.risk,
            accepted,
        });
    }

    println!();
    table::print_summary(rows);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as Days, NaiveDate};

    use crate::collector::Candle;
    use crate::risk::{failure_frequency, price_entry_risk, weighted_win_ratio};

    fn series(days: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        days.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Candle {
                date: first + Days::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn rising_edge_output_feeds_failure_frequency() {
        let candles = series(&[
            (100.0, 106.0, 100.0, 106.0),
            (106.0, 106.0, 104.0, 104.0),
            (104.0, 105.0, 103.0, 104.0),
            (104.0, 110.0, 104.0, 110.0),
        ]);

        let mut analyzer = Analyzer::rising_edge(candles, 5.0, 3).unwrap();
        analyzer.analyze().unwrap();
        let counts = analyzer.result().unwrap().entry_points().unwrap();

        // Day 0 crosses close-over-open and intraday, day 3 likewise;
        // day 2's window picks up day 3's run.
        assert_eq!(counts, &[2, 0, 1, 2]);

        // One zero entry day out of four.
        let risk = failure_frequency(counts).unwrap();
        assert_eq!(risk, 25.0);
    }

    #[test]
    fn entry_risk_chains_over_the_average_analyses() {
        let candles = series(&[(90.0, 110.0, 90.0, 100.0), (95.0, 120.0, 80.0, 110.0)]);

        // Midpoints are 100 on both days, so the rolling average price
        // stays at 100 and the open ratios are 0.9 and 0.95.
        let averages = cumulative_averages(&candles);
        assert_eq!(averages.avg_price, 100.0);
        let ratios = ratio_series(&candles, &averages.rolling_avg_price).unwrap();
        assert_eq!(ratios, vec![0.9, 0.95]);

        // Only day 0 is a profitable entry, so the win band sits at 0.9.
        let win_ratio = weighted_win_ratio(&[2, 0], &ratios).unwrap();
        assert!((win_ratio - 0.9).abs() < 1e-9);

        // A current price of 95 against the 100 average lands halfway
        // between the win band and parity.
        let risk = price_entry_risk(95.0 / averages.avg_price, win_ratio);
        assert!((risk - 50.0).abs() < 1e-9);
    }

    #[test]
    fn display_analyzers_build_from_kind_names() {
        let candles = series(&[(100.0, 101.0, 99.0, 100.0), (100.0, 102.0, 98.0, 101.0)]);

        for kind in ["re", "avg", "ratio"] {
            let kind = AnalyzerKind::from_kind(kind).unwrap();
            let mut analyzer = Analyzer::new(kind, candles.clone(), 10.0, 5).unwrap();
            analyzer.analyze().unwrap();
            assert!(analyzer.result().is_ok());
        }
    }
}
