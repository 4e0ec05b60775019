//! Market data collection over the provider HTTP API.

use chrono::{DateTime, Duration, NaiveDate};
use reqwest::Client;
use serde::Deserialize;

use crate::daterange::DateRange;
use crate::error::{Result, ScreenError};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; edge-screener/0.1)";

/// One trading day of OHLCV data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Point-in-time snapshot used by the attribute filter and the entry
/// risk check.
#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    #[serde(rename = "regularMarketPrice")]
    pub price: f64,
    #[serde(rename = "regularMarketVolume")]
    pub volume: u64,
    #[serde(rename = "marketCap")]
    pub market_cap: Option<u64>,
    #[serde(rename = "trailingAnnualDividendRate")]
    pub dividend_rate: Option<f64>,
}

/// Checks a candle series holds the shape the analyzers rely on:
/// non-empty, strictly ascending dates, positive prices with
/// `low <= open, close <= high`.
pub fn validate_series(candles: &[Candle]) -> Result<()> {
    if candles.is_empty() {
        return Err(ScreenError::BadData("empty candle series".into()));
    }
    for (i, c) in candles.iter().enumerate() {
        let consistent = c.low > 0.0
            && c.low <= c.open
            && c.low <= c.close
            && c.high >= c.open
            && c.high >= c.close;
        if !consistent {
            return Err(ScreenError::BadData(format!(
                "inconsistent candle at index {i} ({})",
                c.date
            )));
        }
        if i > 0 && candles[i - 1].date >= c.date {
            return Err(ScreenError::BadData(format!(
                "dates not ascending at index {i} ({})",
                c.date
            )));
        }
    }
    Ok(())
}

/// Market data source, selected by provider name.
pub enum Collector {
    Yahoo(YahooCollector),
}

impl Collector {
    pub fn new(kind: &str, range: DateRange) -> Result<Self> {
        match kind {
            "yahoo" => Ok(Collector::Yahoo(YahooCollector::new(range))),
            other => Err(ScreenError::UnknownKind {
                family: "collector",
                name: other.to_string(),
            }),
        }
    }

    /// Daily candles for the collector's date range, ascending by date.
    pub async fn get_candle_data(&self, ticker: &str) -> Result<Vec<Candle>> {
        match self {
            Collector::Yahoo(yahoo) => yahoo.get_candle_data(ticker).await,
        }
    }

    /// Current snapshot: price, volume, market cap, dividend rate.
    pub async fn get_quote(&self, ticker: &str) -> Result<Quote> {
        match self {
            Collector::Yahoo(yahoo) => yahoo.get_quote(ticker).await,
        }
    }

    /// Current market price.
    pub async fn get_price(&self, ticker: &str) -> Result<f64> {
        Ok(self.get_quote(ticker).await?.price)
    }
}

// --- Yahoo chart / quote API ---

#[derive(Deserialize)]
struct ChartEnvelope {
    chart: ChartOuter,
}

#[derive(Deserialize)]
struct ChartOuter {
    result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

// Individual days can be null on half-sessions or data gaps, so every
// column is a vector of options and bad rows are dropped as a unit.
#[derive(Deserialize)]
struct ChartQuote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteOuter,
}

#[derive(Deserialize)]
struct QuoteOuter {
    result: Vec<Quote>,
}

pub struct YahooCollector {
    client: Client,
    range: DateRange,
}

impl YahooCollector {
    fn new(range: DateRange) -> Self {
        Self {
            client: Client::new(),
            range,
        }
    }

    async fn get_candle_data(&self, ticker: &str) -> Result<Vec<Candle>> {
        let period1 = midnight_epoch(self.range.start);
        // The chart API treats period2 as exclusive.
        let period2 = midnight_epoch(self.range.end + Duration::days(1));

        let url = format!("{CHART_URL}/{ticker}");
        let response = self
            .client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await
            .map_err(|e| fetch_err(ticker, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(ticker, format!("status {status}")));
        }

        let envelope: ChartEnvelope = response
            .json()
            .await
            .map_err(|e| fetch_err(ticker, format!("bad chart payload: {e}")))?;

        let result = envelope
            .chart
            .result
            .and_then(|mut results| (!results.is_empty()).then(|| results.remove(0)))
            .ok_or_else(|| fetch_err(ticker, "empty chart result"))?;

        let candles = candles_from_chart(result);
        if candles.is_empty() {
            return Err(fetch_err(ticker, "no usable candles in response"));
        }
        Ok(candles)
    }

    async fn get_quote(&self, ticker: &str) -> Result<Quote> {
        let response = self
            .client
            .get(QUOTE_URL)
            .header("User-Agent", USER_AGENT)
            .query(&[("symbols", ticker)])
            .send()
            .await
            .map_err(|e| fetch_err(ticker, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(ticker, format!("status {status}")));
        }

        let envelope: QuoteEnvelope = response
            .json()
            .await
            .map_err(|e| fetch_err(ticker, format!("bad quote payload: {e}")))?;

        envelope
            .quote_response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| fetch_err(ticker, "no quote in response"))
    }
}

fn candles_from_chart(result: ChartResult) -> Vec<Candle> {
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Vec::new();
    };

    let mut candles = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let row = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
            quote.volume.get(i).copied().flatten(),
        );
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = row else {
            continue;
        };
        let Some(date) = DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };
        candles.push(Candle {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }
    candles
}

fn midnight_epoch(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn fetch_err(ticker: &str, reason: impl Into<String>) -> ScreenError {
    ScreenError::Fetch {
        ticker: ticker.to_string(),
        reason: reason.into(),
    }
}
