//! Index snapshot model shared by the fetchers and the formatter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Market whose sentiment index is being read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// US equities, CNN Fear & Greed Index
    Stock,
    /// Crypto, Alternative.me Fear & Greed Index
    Crypto,
}

impl Market {
    /// Short Chinese name used in user-facing text
    pub fn display_name(self) -> &'static str {
        match self {
            Market::Stock => "美股",
            Market::Crypto => "加密",
        }
    }

    /// Attribution line shown under a detailed report
    pub fn source_name(self) -> &'static str {
        match self {
            Market::Stock => "CNN Fear & Greed Index",
            Market::Crypto => "Alternative.me",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Stock => f.write_str("stock"),
            Market::Crypto => f.write_str("crypto"),
        }
    }
}

/// Five-tier qualitative label attached to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rating {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl Rating {
    pub const ALL: [Rating; 5] = [
        Rating::ExtremeFear,
        Rating::Fear,
        Rating::Neutral,
        Rating::Greed,
        Rating::ExtremeGreed,
    ];

    /// Band a score falls into: 0-25, 26-45, 46-55, 56-75, 76-100
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=25 => Rating::ExtremeFear,
            26..=45 => Rating::Fear,
            46..=55 => Rating::Neutral,
            56..=75 => Rating::Greed,
            _ => Rating::ExtremeGreed,
        }
    }

    /// Match a provider label, ignoring case, spaces, underscores and hyphens
    ///
    /// CNN sends `"extreme fear"`, Alternative.me sends `"Extreme Fear"`.
    pub fn from_label(label: &str) -> Option<Self> {
        fn key(label: &str) -> String {
            label
                .chars()
                .filter(|c| !matches!(c, ' ' | '_' | '-'))
                .flat_map(char::to_lowercase)
                .collect()
        }

        let wanted = key(label);
        Self::ALL.into_iter().find(|rating| key(rating.english()) == wanted)
    }

    /// Provider label if recognised, otherwise the score band
    pub fn resolve(label: Option<&str>, score: u8) -> Self {
        label
            .and_then(Self::from_label)
            .unwrap_or_else(|| Self::from_score(score))
    }

    pub fn english(self) -> &'static str {
        match self {
            Rating::ExtremeFear => "Extreme Fear",
            Rating::Fear => "Fear",
            Rating::Neutral => "Neutral",
            Rating::Greed => "Greed",
            Rating::ExtremeGreed => "Extreme Greed",
        }
    }

    pub fn chinese(self) -> &'static str {
        match self {
            Rating::ExtremeFear => "极度恐惧",
            Rating::Fear => "恐惧",
            Rating::Neutral => "中性",
            Rating::Greed => "贪婪",
            Rating::ExtremeGreed => "极度贪婪",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Rating::ExtremeFear => "😱",
            Rating::Fear => "😰",
            Rating::Neutral => "😐",
            Rating::Greed => "😃",
            Rating::ExtremeGreed => "🤑",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.english())
    }
}

/// One read of an index, built per fetch and dropped after formatting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub market: Market,
    /// Current score, 0-100
    pub score: u8,
    pub rating: Rating,
    pub previous_close: u8,
    pub previous_week: u8,
    pub previous_month: u8,
    pub captured_at: DateTime<Utc>,
}

impl IndexSnapshot {
    /// Change since the previous close
    pub fn close_delta(&self) -> i16 {
        delta(self.score, self.previous_close)
    }

    /// Change over the past week
    pub fn week_delta(&self) -> i16 {
        delta(self.score, self.previous_week)
    }

    /// Change over the past month
    pub fn month_delta(&self) -> i16 {
        delta(self.score, self.previous_month)
    }
}

fn delta(current: u8, previous: u8) -> i16 {
    i16::from(current) - i16::from(previous)
}

/// Round a provider score to an integer in 0-100.
///
/// Returns `None` for non-finite or out-of-range values.
pub fn normalize_score(raw: f64) -> Option<u8> {
    if !raw.is_finite() {
        return None;
    }
    let rounded = raw.round();
    if (0.0..=100.0).contains(&rounded) {
        Some(rounded as u8)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bands() {
        assert_eq!(Rating::from_score(0), Rating::ExtremeFear);
        assert_eq!(Rating::from_score(25), Rating::ExtremeFear);
        assert_eq!(Rating::from_score(26), Rating::Fear);
        assert_eq!(Rating::from_score(45), Rating::Fear);
        assert_eq!(Rating::from_score(50), Rating::Neutral);
        assert_eq!(Rating::from_score(56), Rating::Greed);
        assert_eq!(Rating::from_score(76), Rating::ExtremeGreed);
        assert_eq!(Rating::from_score(100), Rating::ExtremeGreed);
    }

    #[test]
    fn test_rating_labels_from_both_providers() {
        assert_eq!(Rating::from_label("extreme fear"), Some(Rating::ExtremeFear));
        assert_eq!(Rating::from_label("Extreme Fear"), Some(Rating::ExtremeFear));
        assert_eq!(Rating::from_label("EXTREME_GREED"), Some(Rating::ExtremeGreed));
        assert_eq!(Rating::from_label("neutral"), Some(Rating::Neutral));
        assert_eq!(Rating::from_label("panic"), None);

        for rating in Rating::ALL {
            assert_eq!(Rating::from_label(rating.english()), Some(rating));
        }
    }

    #[test]
    fn test_unknown_label_falls_back_to_score() {
        assert_eq!(Rating::resolve(Some("panic"), 80), Rating::ExtremeGreed);
        assert_eq!(Rating::resolve(None, 40), Rating::Fear);
        assert_eq!(Rating::resolve(Some("Greed"), 10), Rating::Greed);
    }

    #[test]
    fn test_normalize_score() {
        assert_eq!(normalize_score(25.4), Some(25));
        assert_eq!(normalize_score(99.6), Some(100));
        assert_eq!(normalize_score(0.0), Some(0));
        assert_eq!(normalize_score(100.4), Some(100));
        assert_eq!(normalize_score(100.6), None);
        assert_eq!(normalize_score(-1.0), None);
        assert_eq!(normalize_score(f64::NAN), None);
    }

    #[test]
    fn test_deltas() {
        let snapshot = IndexSnapshot {
            market: Market::Stock,
            score: 25,
            rating: Rating::Fear,
            previous_close: 30,
            previous_week: 25,
            previous_month: 10,
            captured_at: Utc::now(),
        };
        assert_eq!(snapshot.close_delta(), -5);
        assert_eq!(snapshot.week_delta(), 0);
        assert_eq!(snapshot.month_delta(), 15);
    }
}
