use derive_more::{Deref, Display};
use patternscan::PatternRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_WATCHLIST: usize = 100;
const MAX_SYMBOL_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WatchlistError {
    #[error("symbol is empty")]
    EmptySymbol,
    #[error("invalid symbol {0:?}")]
    InvalidSymbol(String),
    #[error("{0} is already on the watchlist")]
    Duplicate(Symbol),
    #[error("watchlist is full ({0} symbols)")]
    Full(usize),
    #[error("{0} is not on the watchlist")]
    NotFound(Symbol),
}

/// Upper-cased ticker, eg. `BRK.B` or `^GSPC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Deref, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(raw: &str) -> Result<Self, WatchlistError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(WatchlistError::EmptySymbol);
        }
        let valid = s.len() <= MAX_SYMBOL_LEN
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
        if !valid {
            return Err(WatchlistError::InvalidSymbol(s.to_string()));
        }
        Ok(Symbol(s.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Ordered, duplicate-free list of watched symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist {
    symbols: Vec<Symbol>,
}

impl Watchlist {
    pub fn add(&mut self, raw: &str) -> Result<Symbol, WatchlistError> {
        let symbol = Symbol::parse(raw)?;
        if self.symbols.contains(&symbol) {
            return Err(WatchlistError::Duplicate(symbol));
        }
        if self.symbols.len() >= MAX_WATCHLIST {
            return Err(WatchlistError::Full(MAX_WATCHLIST));
        }
        self.symbols.push(symbol.clone());
        Ok(symbol)
    }

    pub fn remove(&mut self, raw: &str) -> Result<Symbol, WatchlistError> {
        let symbol = Symbol::parse(raw)?;
        match self.symbols.iter().position(|s| *s == symbol) {
            Some(idx) => Ok(self.symbols.remove(idx)),
            None => Err(WatchlistError::NotFound(symbol)),
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols
            .iter()
            .any(|s| s.as_str().eq_ignore_ascii_case(symbol.trim()))
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn watched<'a>(&self, patterns: &'a [PatternRecord]) -> Vec<&'a PatternRecord> {
        patterns.iter().filter(|p| self.contains(&p.symbol)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_normalizes_and_rejects_duplicates() {
        let mut wl = Watchlist::default();
        assert_eq!(wl.add(" aapl ").unwrap().as_str(), "AAPL");
        assert_eq!(
            wl.add("AAPL").unwrap_err(),
            WatchlistError::Duplicate(Symbol::parse("AAPL").unwrap())
        );
        wl.add("brk.b").unwrap();
        let names: Vec<&str> = wl.symbols().iter().map(Symbol::as_str).collect();
        assert_eq!(names, vec!["AAPL", "BRK.B"]);
    }

    #[test]
    fn rejects_bad_symbols() {
        let mut wl = Watchlist::default();
        assert_eq!(wl.add("   ").unwrap_err(), WatchlistError::EmptySymbol);
        assert!(matches!(wl.add("AA PL"), Err(WatchlistError::InvalidSymbol(_))));
        assert!(matches!(
            wl.add("WAYTOOLONGSYMBOL1"),
            Err(WatchlistError::InvalidSymbol(_))
        ));
        assert!(wl.is_empty());
    }

    #[test]
    fn remove_and_not_found() {
        let mut wl = Watchlist::default();
        wl.add("MSFT").unwrap();
        assert_eq!(wl.remove("msft").unwrap().as_str(), "MSFT");
        assert!(matches!(wl.remove("MSFT"), Err(WatchlistError::NotFound(_))));
    }

    #[test]
    fn capped_at_max() {
        let mut wl = Watchlist::default();
        for i in 0..MAX_WATCHLIST {
            wl.add(&format!("S{i}")).unwrap();
        }
        assert_eq!(wl.add("ONEMORE").unwrap_err(), WatchlistError::Full(MAX_WATCHLIST));
        assert_eq!(wl.len(), MAX_WATCHLIST);
    }

    #[test]
    fn serializes_as_plain_list() {
        let mut wl = Watchlist::default();
        wl.add("AAPL").unwrap();
        wl.add("NVDA").unwrap();
        assert_eq!(serde_json::to_string(&wl).unwrap(), r#"["AAPL","NVDA"]"#);
        let back: Watchlist = serde_json::from_str(r#"["AAPL","NVDA"]"#).unwrap();
        assert_eq!(back, wl);
    }
}
