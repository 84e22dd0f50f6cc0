//! Alternative.me Crypto Fear & Greed Index
//!
//! Endpoint: `https://api.alternative.me/fng/?limit=N`. `data` is newest
//! first, one entry per day, with every number encoded as a string.

use crate::error::FetchError;
use crate::snapshot::{IndexSnapshot, Market, Rating};
use chrono::DateTime;
use serde::Deserialize;

pub const DEFAULT_URL: &str = "https://api.alternative.me/fng/";

/// Enough history to look back one month
pub const DEFAULT_LIMIT: u32 = 30;

const YESTERDAY: usize = 1;
const LAST_WEEK: usize = 7;
const LAST_MONTH: usize = 29;

#[derive(Debug, Deserialize)]
struct FngResponse {
    #[serde(default)]
    data: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    value: String,
    value_classification: Option<String>,
    timestamp: Option<String>,
}

fn malformed(reason: impl Into<String>) -> FetchError {
    FetchError::malformed(Market::Crypto, reason)
}

fn entry_score(entry: &Entry, index: usize) -> Result<u8, FetchError> {
    entry
        .value
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|v| *v <= 100)
        .ok_or_else(|| malformed(format!("data[{index}].value is not a 0-100 integer: {:?}", entry.value)))
}

/// Score `index` days back, or the current score when the history is shorter
fn historical(data: &[Entry], index: usize, current: u8) -> Result<u8, FetchError> {
    data.get(index)
        .map_or(Ok(current), |entry| entry_score(entry, index))
}

/// Map an Alternative.me response onto a snapshot
pub fn parse(body: &str) -> Result<IndexSnapshot, FetchError> {
    let response: FngResponse =
        serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    let current = response
        .data
        .first()
        .ok_or_else(|| malformed("empty data array"))?;

    let score = entry_score(current, 0)?;

    let raw_timestamp = current
        .timestamp
        .as_deref()
        .ok_or_else(|| malformed("missing timestamp"))?;
    let captured_at = raw_timestamp
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| malformed(format!("invalid timestamp {raw_timestamp:?}")))?;

    Ok(IndexSnapshot {
        market: Market::Crypto,
        score,
        rating: Rating::resolve(current.value_classification.as_deref(), score),
        previous_close: historical(&response.data, YESTERDAY, score)?,
        previous_week: historical(&response.data, LAST_WEEK, score)?,
        previous_month: historical(&response.data, LAST_MONTH, score)?,
        captured_at,
    })
}
