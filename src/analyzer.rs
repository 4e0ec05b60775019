//! Analysis strategies over a candle series.

use crate::collector::{Candle, validate_series};
use crate::error::{Result, ScreenError};
use crate::gains;

/// Cumulative price/volume baselines.
#[derive(Debug, Clone, PartialEq)]
pub struct Averages {
    pub avg_price: f64,
    pub avg_volume: f64,
    pub rolling_avg_price: Vec<f64>,
    pub rolling_avg_volume: Vec<f64>,
}

/// What an analyzer produced, by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    EntryPoints(Vec<u32>),
    Averages(Averages),
    PriceRatio(Vec<f64>),
}

impl Analysis {
    /// The counter series, when this is rising edge output.
    pub fn entry_points(&self) -> Result<&[u32]> {
        match self {
            Analysis::EntryPoints(counts) => Ok(counts),
            _ => Err(ScreenError::BadData(
                "analysis is not an entry point series".into(),
            )),
        }
    }
}

/// Running mean of the day midpoint `(high + low) / 2` and of volume.
/// Every prior day keeps contributing; this is not a fixed window.
pub fn cumulative_averages(candles: &[Candle]) -> Averages {
    let mut price_sum = 0.0;
    let mut volume_sum = 0.0;
    let mut rolling_avg_price = Vec::with_capacity(candles.len());
    let mut rolling_avg_volume = Vec::with_capacity(candles.len());

    for (i, c) in candles.iter().enumerate() {
        price_sum += (c.high + c.low) / 2.0;
        volume_sum += c.volume as f64;
        let n = (i + 1) as f64;
        rolling_avg_price.push(price_sum / n);
        rolling_avg_volume.push(volume_sum / n);
    }

    Averages {
        avg_price: rolling_avg_price.last().copied().unwrap_or_default(),
        avg_volume: rolling_avg_volume.last().copied().unwrap_or_default(),
        rolling_avg_price,
        rolling_avg_volume,
    }
}

/// Elementwise open-to-baseline ratio. The series must line up day for
/// day with the candles.
pub fn ratio_series(candles: &[Candle], baseline: &[f64]) -> Result<Vec<f64>> {
    if candles.len() != baseline.len() {
        return Err(ScreenError::BadData(format!(
            "baseline length {} does not match candle series length {}",
            baseline.len(),
            candles.len()
        )));
    }
    Ok(candles
        .iter()
        .zip(baseline)
        .map(|(c, b)| c.open / b)
        .collect())
}

/// Analyzer kinds accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerKind {
    RisingEdge,
    Average,
    RollingPriceRatio,
}

impl AnalyzerKind {
    pub fn from_kind(kind: &str) -> Result<Self> {
        match kind {
            "re" => Ok(AnalyzerKind::RisingEdge),
            "avg" => Ok(AnalyzerKind::Average),
            "ratio" => Ok(AnalyzerKind::RollingPriceRatio),
            other => Err(ScreenError::UnknownKind {
                family: "analyzer",
                name: other.to_string(),
            }),
        }
    }
}

enum Strategy {
    RisingEdge { wanted_gain: f64, period_days: usize },
    Average,
    RollingPriceRatio { baseline: Vec<f64> },
}

/// One analysis pass over a validated candle series. The result slot
/// stays empty until [`Analyzer::analyze`] runs; an all-zero counter
/// series is a real result, not an empty one.
pub struct Analyzer {
    strategy: Strategy,
    data: Vec<Candle>,
    result: Option<Analysis>,
}

impl Analyzer {
    /// Builds the analyzer for `kind`. The rolling price ratio kind
    /// derives its baseline from the cumulative average price.
    pub fn new(
        kind: AnalyzerKind,
        data: Vec<Candle>,
        wanted_gain: f64,
        period_days: usize,
    ) -> Result<Self> {
        match kind {
            AnalyzerKind::RisingEdge => Self::rising_edge(data, wanted_gain, period_days),
            AnalyzerKind::Average => Self::average(data),
            AnalyzerKind::RollingPriceRatio => {
                let baseline = cumulative_averages(&data).rolling_avg_price;
                Self::rolling_price_ratio(data, baseline)
            }
        }
    }

    /// Counts wanted-gain threshold crossings per entry day.
    pub fn rising_edge(data: Vec<Candle>, wanted_gain: f64, period_days: usize) -> Result<Self> {
        if wanted_gain <= 0.0 {
            return Err(ScreenError::BadData("wanted gain must be positive".into()));
        }
        if period_days == 0 {
            return Err(ScreenError::BadData(
                "period must cover at least one day".into(),
            ));
        }
        Self::with_strategy(
            data,
            Strategy::RisingEdge {
                wanted_gain,
                period_days,
            },
        )
    }

    /// Cumulative average price and volume.
    pub fn average(data: Vec<Candle>) -> Result<Self> {
        Self::with_strategy(data, Strategy::Average)
    }

    /// Per-day open price against an externally supplied baseline.
    pub fn rolling_price_ratio(data: Vec<Candle>, baseline: Vec<f64>) -> Result<Self> {
        if baseline.len() != data.len() {
            return Err(ScreenError::BadData(format!(
                "baseline length {} does not match candle series length {}",
                baseline.len(),
                data.len()
            )));
        }
        Self::with_strategy(data, Strategy::RollingPriceRatio { baseline })
    }

    fn with_strategy(data: Vec<Candle>, strategy: Strategy) -> Result<Self> {
        validate_series(&data)?;
        Ok(Self {
            strategy,
            data,
            result: None,
        })
    }

    /// Recomputes the result. Safe to call again on unchanged input.
    pub fn analyze(&mut self) -> Result<()> {
        let analysis = match &self.strategy {
            Strategy::RisingEdge {
                wanted_gain,
                period_days,
            } => {
                let day_gains = gains::close_over_open_gains(&self.data);
                let mut counts = gains::count_gains(&day_gains, *wanted_gain, *period_days);
                let intraday = gains::intraday_threshold_counts(&self.data, *wanted_gain);
                for (count, extra) in counts.iter_mut().zip(intraday) {
                    *count += extra;
                }
                Analysis::EntryPoints(counts)
            }
            Strategy::Average => Analysis::Averages(cumulative_averages(&self.data)),
            Strategy::RollingPriceRatio { baseline } => {
                Analysis::PriceRatio(ratio_series(&self.data, baseline)?)
            }
        };
        self.result = Some(analysis);
        Ok(())
    }

    /// The computed analysis. Errors until [`Analyzer::analyze`] ran.
    pub fn result(&self) -> Result<&Analysis> {
        self.result.as_ref().ok_or(ScreenError::NoResult)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(days: &[(f64, f64, f64, f64)]) -> Vec<Candle> {
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        days.iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| Candle {
                date: first + Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1_000 * (i as u64 + 1),
            })
            .collect()
    }

    fn flat_series(len: usize) -> Vec<Candle> {
        series(&vec![(100.0, 101.0, 99.0, 100.0); len])
    }

    #[test]
    fn constant_midpoint_gives_constant_rolling_average() {
        let averages = cumulative_averages(&flat_series(5));
        assert!(averages.rolling_avg_price.iter().all(|&p| p == 100.0));
        assert_eq!(averages.avg_price, 100.0);
    }

    #[test]
    fn rolling_average_is_cumulative_not_windowed() {
        let candles = series(&[(100.0, 150.0, 50.0, 120.0), (180.0, 250.0, 150.0, 200.0)]);
        // Midpoints 100 and 200; day 1 averages over both days.
        let averages = cumulative_averages(&candles);
        assert_eq!(averages.rolling_avg_price, vec![100.0, 150.0]);
        assert_eq!(averages.avg_price, 150.0);
        // Volumes 1000 and 2000.
        assert_eq!(averages.rolling_avg_volume, vec![1_000.0, 1_500.0]);
        assert_eq!(averages.avg_volume, 1_500.0);
    }

    #[test]
    fn ratio_series_requires_matching_lengths() {
        let candles = flat_series(3);
        assert!(matches!(
            ratio_series(&candles, &[100.0, 100.0]),
            Err(ScreenError::BadData(_))
        ));
    }

    #[test]
    fn ratio_series_of_own_opens_is_all_ones() {
        let candles = flat_series(4);
        let baseline: Vec<f64> = candles.iter().map(|c| c.open).collect();
        let ratios = ratio_series(&candles, &baseline).unwrap();
        assert!(ratios.iter().all(|&r| r == 1.0));
    }

    #[test]
    fn rising_edge_adds_intraday_crossings() {
        // Day 0 closes 12% up (one crossing) and also ran 24% open to
        // high intraday (two more). Days 1 and 2 are flat.
        let candles = series(&[
            (100.0, 124.0, 99.0, 112.0),
            (100.0, 101.0, 99.0, 100.0),
            (100.0, 101.0, 99.0, 100.0),
        ]);
        let mut analyzer = Analyzer::rising_edge(candles, 10.0, 2).unwrap();
        analyzer.analyze().unwrap();
        let result = analyzer.result().unwrap();
        assert_eq!(result.entry_points().unwrap(), &[3, 0, 0]);
    }

    #[test]
    fn analyze_is_idempotent() {
        let candles = series(&[
            (100.0, 115.0, 95.0, 111.0),
            (100.0, 108.0, 97.0, 106.0),
            (100.0, 101.0, 90.0, 93.0),
        ]);
        let mut analyzer = Analyzer::rising_edge(candles, 5.0, 3).unwrap();
        analyzer.analyze().unwrap();
        let first = analyzer.result().unwrap().clone();
        analyzer.analyze().unwrap();
        assert_eq!(*analyzer.result().unwrap(), first);
    }

    #[test]
    fn result_before_analyze_is_an_error() {
        let analyzer = Analyzer::average(flat_series(2)).unwrap();
        assert!(matches!(analyzer.result(), Err(ScreenError::NoResult)));
    }

    #[test]
    fn all_zero_counters_are_a_real_result() {
        // No day ever gains, so every counter is zero; the result must
        // still come back rather than read as missing.
        let mut analyzer = Analyzer::rising_edge(flat_series(4), 10.0, 2).unwrap();
        analyzer.analyze().unwrap();
        assert_eq!(
            analyzer.result().unwrap().entry_points().unwrap(),
            &[0, 0, 0, 0]
        );
    }

    #[test]
    fn invalid_series_fails_at_construction() {
        let mut candles = flat_series(3);
        candles[1].low = -1.0;
        assert!(matches!(
            Analyzer::average(candles),
            Err(ScreenError::BadData(_))
        ));
    }

    #[test]
    fn invalid_parameters_fail_at_construction() {
        assert!(Analyzer::rising_edge(flat_series(2), 0.0, 5).is_err());
        assert!(Analyzer::rising_edge(flat_series(2), 10.0, 0).is_err());
    }

    #[test]
    fn kind_names_dispatch() {
        assert_eq!(AnalyzerKind::from_kind("re").unwrap(), AnalyzerKind::RisingEdge);
        assert_eq!(AnalyzerKind::from_kind("avg").unwrap(), AnalyzerKind::Average);
        assert_eq!(
            AnalyzerKind::from_kind("ratio").unwrap(),
            AnalyzerKind::RollingPriceRatio
        );
        assert!(matches!(
            AnalyzerKind::from_kind("macd"),
            Err(ScreenError::UnknownKind { family: "analyzer", .. })
        ));
    }

    #[test]
    fn ratio_kind_derives_its_baseline() {
        // Flat series: open equals the midpoint, so every ratio is 1.
        let mut analyzer =
            Analyzer::new(AnalyzerKind::RollingPriceRatio, flat_series(3), 0.0, 0).unwrap();
        analyzer.analyze().unwrap();
        match analyzer.result().unwrap() {
            Analysis::PriceRatio(ratios) => assert!(ratios.iter().all(|&r| r == 1.0)),
            other => panic!("unexpected analysis: {other:?}"),
        }
    }
}
