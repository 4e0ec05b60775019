use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScreenError>;

/// Errors raised by the screening pipeline.
///
/// `UnknownKind` and `BadPeriod` come out of run setup and abort the whole
/// batch; everything else is scoped to a single ticker and makes the batch
/// driver skip that ticker.
#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("unknown {family} kind: {name:?}")]
    UnknownKind { family: &'static str, name: String },

    #[error("bad input data: {0}")]
    BadData(String),

    #[error("no result computed yet")]
    NoResult,

    #[error("division by zero: {0}")]
    DivideByZero(&'static str),

    #[error("fetch failed for {ticker}: {reason}")]
    Fetch { ticker: String, reason: String },

    #[error("malformed period label: {0:?}")]
    BadPeriod(String),
}
