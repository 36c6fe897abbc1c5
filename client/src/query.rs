use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Filter set sent to the scan endpoint as query parameters.
///
/// Unset scalars are left out of the query. List values are sent as repeated
/// `key=value` pairs in list order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternFilters {
    pub universe: Option<String>,
    pub confidence_min: Option<f64>,
    pub limit: Option<u32>,
    pub pattern_types: Vec<String>,
    pub symbols: Vec<String>,
    pub sector: Option<String>,
}

impl PatternFilters {
    pub fn with_universe(mut self, universe: impl Into<String>) -> Self {
        self.universe = Some(universe.into());
        self
    }

    pub fn with_confidence_min(mut self, confidence_min: f64) -> Self {
        self.confidence_min = Some(confidence_min);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_pattern_types<I, S>(mut self, pattern_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pattern_types = pattern_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// Flattened `(key, value)` pairs in wire order.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(universe) = &self.universe {
            pairs.push(("universe", universe.clone()));
        }
        if let Some(confidence_min) = self.confidence_min {
            pairs.push(("confidence_min", confidence_min.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        for pattern_type in &self.pattern_types {
            pairs.push(("pattern_types", pattern_type.clone()));
        }
        for symbol in &self.symbols {
            pairs.push(("symbols", symbol.clone()));
        }
        if let Some(sector) = &self.sector {
            pairs.push(("sector", sector.clone()));
        }
        pairs
    }

    /// Endpoint URL with the filters appended to any query it already has.
    pub fn to_url(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        let pairs = self.to_query_pairs();
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in &pairs {
                query.append_pair(key, value);
            }
        }
        url
    }

    /// Does a record satisfy the locally checkable part of the filters?
    ///
    /// `universe` and `sector` are resolved by the backend and are not
    /// checked here.
    pub fn matches(&self, record: &crate::PatternRecord) -> bool {
        if let Some(min) = self.confidence_min {
            if record.confidence < min {
                return false;
            }
        }
        if !self.symbols.is_empty()
            && !self
                .symbols
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&record.symbol))
        {
            return false;
        }
        if !self.pattern_types.is_empty() && !self.pattern_types.contains(&record.pattern) {
            return false;
        }
        true
    }
}
