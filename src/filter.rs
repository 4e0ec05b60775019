//! Declarative ticker attribute filter.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::collector::Quote;

/// Comparison operators accepted in a filter spec. Unknown operator
/// names fail at deserialization, not at evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl Comparator {
    fn check<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            Comparator::Eq => lhs == rhs,
            Comparator::Ne => lhs != rhs,
            Comparator::Gt => lhs > rhs,
            Comparator::Lt => lhs < rhs,
            Comparator::Gte => lhs >= rhs,
            Comparator::Lte => lhs <= rhs,
        }
    }
}

/// Predicate set evaluated against a ticker's quote snapshot. Every
/// listed predicate must pass.
///
/// ```json
/// { "dividend": false, "volume": { "gt": 3000000 } }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    /// Require dividend payments to exist (`true`) or be absent (`false`).
    pub dividend: Option<bool>,
    #[serde(default)]
    pub volume: BTreeMap<Comparator, u64>,
    #[serde(default)]
    pub marketcap: BTreeMap<Comparator, u64>,
}

impl FilterSpec {
    /// Built-in lookup gate: no dividend, volume above three million.
    pub fn lookup_default() -> Self {
        Self {
            dividend: Some(false),
            volume: BTreeMap::from([(Comparator::Gt, 3_000_000)]),
            marketcap: BTreeMap::new(),
        }
    }

    pub fn check(&self, quote: &Quote) -> bool {
        if let Some(wanted) = self.dividend {
            let has_dividend = quote.dividend_rate.is_some_and(|rate| rate > 0.0);
            if has_dividend != wanted {
                return false;
            }
        }

        for (comparator, value) in &self.volume {
            if !comparator.check(quote.volume, *value) {
                return false;
            }
        }

        for (comparator, value) in &self.marketcap {
            // A ticker without a reported market cap fails any cap predicate.
            let Some(cap) = quote.market_cap else {
                return false;
            };
            if !comparator.check(cap, *value) {
                return false;
            }
        }

        true
    }
}
