use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticker symbol, trimmed and uppercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let normalized = value.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(DomainError::invalid("symbol cannot be empty"));
        }
        if normalized.chars().any(char::is_whitespace) {
            return Err(DomainError::invalid(format!(
                "symbol must not contain whitespace: {value}"
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

/// Descriptive metadata; never used in computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub symbol: Symbol,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub sector: Option<String>,
}

impl Instrument {
    pub fn bare(symbol: Symbol) -> Self {
        Self {
            symbol,
            name: None,
            exchange: None,
            sector: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Symbol;

    #[test]
    fn parse_trims_and_uppercases() {
        let symbol = Symbol::parse("  bbca ").expect("valid symbol");
        assert_eq!(symbol.as_str(), "BBCA");
    }

    #[test]
    fn parse_rejects_empty() {
        let err = Symbol::parse("   ").expect_err("empty symbol");
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn parse_rejects_inner_whitespace() {
        assert!(Symbol::parse("BB CA").is_err());
    }

    #[test]
    fn deserializes_through_normalization() {
        let symbol: Symbol = serde_json::from_str("\"msft\"").expect("deserialize");
        assert_eq!(symbol.to_string(), "MSFT");
    }
}
