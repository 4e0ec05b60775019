//! Gain arithmetic and the rolling threshold scan.

use crate::collector::Candle;

/// Signed percent change for a price ratio. Both branches are equal to
/// `(ratio - 1) * 100`; the split form is kept for numeric fidelity at
/// the branch point. Callers guarantee `ratio > 0`.
pub fn percent(ratio: f64) -> f64 {
    if ratio > 1.0 {
        (ratio * 100.0) - 100.0
    } else {
        -1.0 * (1.0 - ratio) * 100.0
    }
}

/// Close-over-open gain for each day, in percent.
pub fn close_over_open_gains(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| percent(c.close / c.open)).collect()
}

/// Threshold crossings achievable inside a single day.
///
/// Takes the better of the open-to-high and low-to-close runs; a day
/// whose best run spans several multiples of `wanted_gain` counts once
/// per multiple.
pub fn intraday_threshold_counts(candles: &[Candle], wanted_gain: f64) -> Vec<u32> {
    candles
        .iter()
        .map(|c| {
            let best = percent(c.high / c.open).max(percent(c.close / c.low));
            if best >= wanted_gain {
                (best / wanted_gain).floor() as u32
            } else {
                0
            }
        })
        .collect()
}

/// Rolling threshold counter.
///
/// `counts[j]` is how many times the entry window opening at day `j`
/// accumulated `wanted_gain`, counting contributions from days
/// `j..=j + period_days - 1` (capped at the end of the series). Gains
/// are applied in day order, so every still-open window sees each new
/// day exactly once. A crossing keeps the excess in the accumulator;
/// one outsized day can cross several times.
pub fn count_gains(gains: &[f64], wanted_gain: f64, period_days: usize) -> Vec<u32> {
    debug_assert!(wanted_gain > 0.0);
    debug_assert!(period_days >= 1);

    let n = gains.len();
    let mut acc = vec![0.0f64; n];
    let mut counts = vec![0u32; n];

    for i in 0..n {
        let lo = i.saturating_sub(period_days.saturating_sub(1));
        for j in lo..=i {
            acc[j] += gains[i];
            while acc[j] >= wanted_gain {
                counts[j] += 1;
                acc[j] -= wanted_gain;
            }
        }
    }

    counts
}
