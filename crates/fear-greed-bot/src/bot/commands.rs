//! Command parsing for the fear & greed bot

use crate::error::{BotError, Result};
use crate::snapshot::Market;

/// Markets a query command asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Stock,
    Crypto,
    Both,
}

impl Query {
    /// Single market, or `None` for a combined query
    pub fn market(self) -> Option<Market> {
        match self {
            Query::Stock => Some(Market::Stock),
            Query::Crypto => Some(Market::Crypto),
            Query::Both => None,
        }
    }
}

/// Parsed command from user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Welcome text
    Start,
    /// Usage text
    Help,
    /// Fetch and report one or both markets
    Query(Query),
}

/// Every command the bot answers to
pub const COMMANDS: &[(&str, Command)] = &[
    ("start", Command::Start),
    ("help", Command::Help),
    ("stock", Command::Query(Query::Stock)),
    ("crypto", Command::Query(Query::Crypto)),
    ("both", Command::Query(Query::Both)),
    // Kept for users of the first release
    ("check", Command::Query(Query::Stock)),
];

impl Command {
    /// Parse a command from message text
    ///
    /// Only the first token counts; `/stock@my_bot` and `/STOCK now` both
    /// parse as `/stock`.
    pub fn parse(input: &str) -> Result<Self> {
        let token = input.split_whitespace().next().unwrap_or_default();

        let name = token
            .strip_prefix('/')
            .ok_or_else(|| BotError::Command(format!("not a command: {token:?}")))?;
        let name = name.split_once('@').map_or(name, |(name, _bot)| name);
        let name = name.to_lowercase();

        COMMANDS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, command)| *command)
            .ok_or(BotError::Command(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_command() {
        assert_eq!(Command::parse("/start").unwrap(), Command::Start);
        assert_eq!(Command::parse("/help").unwrap(), Command::Help);
        assert_eq!(Command::parse("/stock").unwrap(), Command::Query(Query::Stock));
        assert_eq!(Command::parse("/crypto").unwrap(), Command::Query(Query::Crypto));
        assert_eq!(Command::parse("/both").unwrap(), Command::Query(Query::Both));
        assert_eq!(Command::parse("/check").unwrap(), Command::Query(Query::Stock));
    }

    #[test]
    fn test_parse_bot_suffix_case_and_args() {
        assert_eq!(
            Command::parse("/stock@fear_greed_bot").unwrap(),
            Command::Query(Query::Stock)
        );
        assert_eq!(Command::parse("  /BOTH please").unwrap(), Command::Query(Query::Both));
    }

    #[test]
    fn test_parse_rejects_other_input() {
        assert!(Command::parse("").is_err());
        assert!(Command::parse("stock").is_err());
        assert!(Command::parse("/").is_err());
        assert!(matches!(
            Command::parse("/analyze AAPL"),
            Err(BotError::Command(name)) if name == "analyze"
        ));
    }

    #[test]
    fn test_query_market() {
        assert_eq!(Query::Stock.market(), Some(Market::Stock));
        assert_eq!(Query::Crypto.market(), Some(Market::Crypto));
        assert_eq!(Query::Both.market(), None);
    }
}
