//! Risk reduction over analysis output.

use tracing::info;

use crate::collector::Collector;
use crate::error::{Result, ScreenError};

/// Risk strategy names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskKind {
    FailureFrequency,
    PriceEntry,
}

impl RiskKind {
    pub fn from_kind(kind: &str) -> Result<Self> {
        match kind {
            "re" => Ok(RiskKind::FailureFrequency),
            "entry" => Ok(RiskKind::PriceEntry),
            other => Err(ScreenError::UnknownKind {
                family: "risk calculator",
                name: other.to_string(),
            }),
        }
    }
}

/// One risk reduction over a ticker's analysis output. The entry
/// variant looks the current price up through the collector.
pub enum RiskCalculator<'a> {
    FailureFrequency {
        entry_counts: &'a [u32],
    },
    PriceEntry {
        ticker: &'a str,
        avg_price: f64,
        entry_counts: &'a [u32],
        price_avg_ratios: &'a [f64],
    },
}

impl RiskCalculator<'_> {
    /// Reduces the inputs to a risk percentage in `[0, 100]`.
    pub async fn calculate(&self, collector: &Collector) -> Result<f64> {
        match self {
            RiskCalculator::FailureFrequency { entry_counts } => failure_frequency(entry_counts),
            RiskCalculator::PriceEntry {
                ticker,
                avg_price,
                entry_counts,
                price_avg_ratios,
            } => {
                let current_price = collector.get_price(ticker).await?;
                let current_ratio = current_price / avg_price;
                let win_ratio = weighted_win_ratio(entry_counts, price_avg_ratios)?;
                Ok(price_entry_risk(current_ratio, win_ratio))
            }
        }
    }
}

/// Share of entry days that never reached the wanted gain, in percent.
pub fn failure_frequency(entry_counts: &[u32]) -> Result<f64> {
    if entry_counts.is_empty() {
        return Err(ScreenError::DivideByZero("empty entry point series"));
    }
    let failed = entry_counts.iter().filter(|&&count| count == 0).count();
    let positive = entry_counts.len() - failed;
    info!(positive_entry_points = positive, "entry point tally");
    Ok(failed as f64 / entry_counts.len() as f64 * 100.0)
}

/// Mean price-to-average ratio across profitable entry days, weighted
/// by how often each day crossed the threshold.
pub fn weighted_win_ratio(entry_counts: &[u32], ratios: &[f64]) -> Result<f64> {
    if entry_counts.len() != ratios.len() {
        return Err(ScreenError::BadData(format!(
            "ratio series length {} does not match counter series length {}",
            ratios.len(),
            entry_counts.len()
        )));
    }

    let mut weight_sum = 0u64;
    let mut ratio_sum = 0.0;
    for (&count, &ratio) in entry_counts.iter().zip(ratios) {
        if count > 0 {
            weight_sum += u64::from(count);
            ratio_sum += f64::from(count) * ratio;
        }
    }

    if weight_sum == 0 {
        return Err(ScreenError::DivideByZero("no positive entry points"));
    }
    Ok(ratio_sum / weight_sum as f64)
}

/// Where the current price ratio sits between the historical profitable
/// entry band and parity. At or above parity the entry is written off;
/// at or below the historical band it is free.
pub fn price_entry_risk(current_ratio: f64, average_win_ratio: f64) -> f64 {
    if current_ratio >= 1.0 {
        100.0
    } else if current_ratio < average_win_ratio {
        0.0
    } else {
        (current_ratio - average_win_ratio) / (1.0 - average_win_ratio) * 100.0
    }
}
