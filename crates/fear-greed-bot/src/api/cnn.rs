//! CNN Fear & Greed Index (US equities)
//!
//! Endpoint: `https://production.dataviz.cnn.io/index/fearandgreed/graphdata/`
//!
//! Only the `fear_and_greed` object of the graph payload is read; the chart
//! series next to it are ignored.

use crate::error::FetchError;
use crate::snapshot::{IndexSnapshot, Market, Rating, normalize_score};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const DEFAULT_URL: &str = "https://production.dataviz.cnn.io/index/fearandgreed/graphdata/";

#[derive(Debug, Deserialize)]
struct GraphData {
    fear_and_greed: Option<FearAndGreed>,
}

#[derive(Debug, Deserialize)]
struct FearAndGreed {
    score: Option<f64>,
    rating: Option<String>,
    timestamp: Option<String>,
    previous_close: Option<f64>,
    previous_1_week: Option<f64>,
    previous_1_month: Option<f64>,
}

fn malformed(reason: impl Into<String>) -> FetchError {
    FetchError::malformed(Market::Stock, reason)
}

/// Historical value, or the current score when the provider omitted it
fn historical(field: &str, raw: Option<f64>, current: u8) -> Result<u8, FetchError> {
    match raw {
        None => Ok(current),
        Some(value) => normalize_score(value)
            .ok_or_else(|| malformed(format!("{field} out of range: {value}"))),
    }
}

/// Map a CNN graph payload onto a snapshot
pub fn parse(body: &str) -> Result<IndexSnapshot, FetchError> {
    let data: GraphData =
        serde_json::from_str(body).map_err(|e| malformed(format!("invalid JSON: {e}")))?;
    let fg = data
        .fear_and_greed
        .ok_or_else(|| malformed("missing fear_and_greed object"))?;

    let raw_score = fg.score.ok_or_else(|| malformed("missing score"))?;
    let score =
        normalize_score(raw_score).ok_or_else(|| malformed(format!("score out of range: {raw_score}")))?;

    let timestamp = fg.timestamp.ok_or_else(|| malformed("missing timestamp"))?;
    let captured_at = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| malformed(format!("invalid timestamp {timestamp:?}: {e}")))?
        .with_timezone(&Utc);

    Ok(IndexSnapshot {
        market: Market::Stock,
        score,
        rating: Rating::resolve(fg.rating.as_deref(), score),
        previous_close: historical("previous_close", fg.previous_close, score)?,
        previous_week: historical("previous_1_week", fg.previous_1_week, score)?,
        previous_month: historical("previous_1_month", fg.previous_1_month, score)?,
        captured_at,
    })
}
