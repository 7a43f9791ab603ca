//! CFTC contract code to price ticker mapping.

use indexmap::IndexMap;

/// Known CFTC contract codes and the Yahoo ticker of their front-month instrument.
///
/// Several codes can share a ticker (mini and standard contracts, futures and
/// combined listings).
static DEFAULT_TICKERS: &[(&str, &str)] = &[
    // crypto
    ("133741", "BTC-USD"), ("133742", "BTC-USD"),
    ("146021", "ETH-USD"), ("146022", "ETH-USD"),
    ("176740", "XRP-USD"), ("177741", "SOL-USD"),
    // currencies
    ("099741", "6E=F"), ("096742", "6B=F"), ("097741", "6J=F"),
    ("090741", "6C=F"), ("232741", "6A=F"), ("112741", "6N=F"),
    ("092741", "6S=F"), ("098662", "DX=F"), ("095741", "6M=F"), ("102741", "6L=F"),
    // energy
    ("067411", "CL=F"), ("023651", "NG=F"), ("022651", "HO=F"),
    ("111416", "RB=F"), ("06765T", "BZ=F"), ("067651", "CL=F"),
    // grains
    ("001602", "ZW=F"), ("001612", "KE=F"), ("002602", "ZC=F"),
    ("005602", "ZS=F"), ("005603", "ZS=F"), ("026603", "ZM=F"),
    ("007601", "ZL=F"), ("004603", "ZO=F"), ("039601", "ZR=F"),
    // metals
    ("088691", "GC=F"), ("088695", "GC=F"), ("084691", "SI=F"),
    ("084694", "SI=F"), ("085692", "HG=F"), ("085699", "HG=F"),
    ("076651", "PL=F"), ("075651", "PA=F"),
    // indices
    ("13874A", "ES=F"), ("13874+", "ES=F"), ("13874U", "ES=F"),
    ("209742", "NQ=F"), ("20974+", "NQ=F"), ("209747", "NQ=F"),
    ("239742", "RTY=F"), ("239747", "RTY=F"),
    ("124603", "YM=F"), ("12460+", "YM=F"), ("240741", "NKD=F"), ("1170E1", "^VIX"),
    // livestock
    ("057642", "LE=F"), ("061641", "GF=F"), ("054642", "HE=F"),
    // softs
    ("073732", "CC=F"), ("083731", "KC=F"), ("033661", "CT=F"),
    ("080732", "SB=F"), ("040701", "OJ=F"), ("058644", "LBS=F"),
    // rates
    ("043602", "ZN=F"), ("042601", "ZT=F"), ("044601", "ZF=F"),
    ("020601", "ZB=F"), ("043607", "TN=F"), ("020604", "UB=F"),
];

/// Lookup from market code to ticker.
#[derive(Debug, Clone)]
pub struct TickerMap {
    map: IndexMap<String, String>,
}

impl Default for TickerMap {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_TICKERS.iter().copied())
    }
}

impl TickerMap {
    /// Builds a map from `(code, ticker)` pairs; later pairs win.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            map: pairs
                .into_iter()
                .map(|(c, t)| (c.to_string(), t.to_string()))
                .collect(),
        }
    }

    pub fn ticker(&self, code: &str) -> Option<&str> {
        self.map.get(code).map(String::as_str)
    }

    pub fn has_ticker(&self, code: &str) -> bool {
        self.map.contains_key(code)
    }

    /// Groups the mapped codes by ticker, preserving first-seen ticker order.
    /// Unmapped codes are left out.
    pub fn group_by_ticker<'a>(
        &self,
        codes: impl IntoIterator<Item = &'a str>,
    ) -> IndexMap<String, Vec<String>> {
        let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
        for code in codes {
            if let Some(ticker) = self.ticker(code) {
                let entry = grouped.entry(ticker.to_string()).or_default();
                if !entry.iter().any(|c| c == code) {
                    entry.push(code.to_string());
                }
            }
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_tickers_are_grouped() {
        let map = TickerMap::default();
        let grouped = map.group_by_ticker(["088691", "088695", "099741", "999999", "088691"]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["GC=F"], vec!["088691", "088695"]);
        assert_eq!(grouped["6E=F"], vec!["099741"]);
    }

    #[test]
    fn unknown_code_has_no_ticker() {
        let map = TickerMap::default();
        assert!(!map.has_ticker("000000"));
        assert_eq!(map.ticker("13874A"), Some("ES=F"));
    }
}
