//! Keyword categorization of market names.
//!
//! Approximate by nature: the first category with a keyword contained in the
//! upper-cased market name wins.

struct Category {
    key: &'static str,
    display: &'static str,
    keywords: &'static [&'static str],
}

/// Fallback when no keyword matches.
pub const OTHER: (&str, &str) = ("other", "Other");

static CATEGORIES: &[Category] = &[
    Category {
        key: "currencies",
        display: "Currencies",
        keywords: &[
            "USD INDEX", "EURO FX", "BRITISH POUND", "JAPANESE YEN", "SWISS FRANC",
            "CANADIAN DOLLAR", "AUSTRALIAN DOLLAR", "NEW ZEALAND DOLLAR", "MEXICAN PESO",
            "BRAZILIAN REAL", "RUSSIAN RUBLE", "S. AFRICAN RAND", "RENMINBI",
        ],
    },
    Category {
        key: "crypto",
        display: "Crypto",
        keywords: &[
            "BITCOIN", "MICRO BITCOIN", "ETHER", "NANO BITCOIN", "NANO ETHER", "SHIB",
            "SOLANA", "XRP", "DOGECOIN", "LITECOIN", "POLKADOT", "CHAINLINK", "AVALANCHE",
            "CARDONA", "STELLAR", "HEDERA", "SUI", "BITCOIN CASH",
        ],
    },
    Category {
        key: "metals",
        display: "Metals",
        keywords: &["GOLD", "SILVER", "COPPER", "PLATINUM", "PALLADIUM", "ALUMINUM"],
    },
    Category {
        key: "energy",
        display: "Energy",
        keywords: &[
            "CRUDE OIL", "NATURAL GAS", "HEATING OIL", "RBOB GASOLINE", "BRENT CRUDE", "ETHANOL",
        ],
    },
    Category {
        key: "grains",
        display: "Grains",
        keywords: &[
            "WHEAT", "CORN", "SOYBEANS", "SOYBEAN OIL", "SOYBEAN MEAL", "OATS", "ROUGH RICE",
            "CANOLA",
        ],
    },
    Category {
        key: "softs",
        display: "Softs",
        keywords: &["COFFEE", "COCOA", "SUGAR", "COTTON", "ORANGE JUICE", "LUMBER"],
    },
    Category {
        key: "livestock",
        display: "Livestock",
        keywords: &["LIVE CATTLE", "FEEDER CATTLE", "LEAN HOGS"],
    },
    Category {
        key: "indices",
        display: "Indices",
        keywords: &[
            "S&P 500", "E-MINI S&P", "NASDAQ", "DOW JONES", "RUSSELL", "VIX", "NIKKEI", "MIDCAP",
        ],
    },
    Category {
        key: "rates",
        display: "Rates",
        keywords: &[
            "2-YEAR", "5-YEAR", "10-YEAR", "30-YEAR", "EURODOLLAR", "FED FUNDS", "TREASURY",
            "T-NOTE", "T-BOND", "ULTRA", "SOFR",
        ],
    },
];

/// Returns `(key, display)` for a market name.
pub fn categorize(name: &str) -> (&'static str, &'static str) {
    let upper = name.to_uppercase();
    CATEGORIES
        .iter()
        .find(|c| c.keywords.iter().any(|kw| upper.contains(kw)))
        .map(|c| (c.key, c.display))
        .unwrap_or(OTHER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_are_case_insensitive() {
        assert_eq!(categorize("Gold - Commodity Exchange Inc."), ("metals", "Metals"));
        assert_eq!(categorize("EURO FX - CHICAGO MERCANTILE EXCHANGE"), ("currencies", "Currencies"));
    }

    #[test]
    fn earlier_category_wins() {
        // Matches both crypto and metals; crypto is listed first.
        assert_eq!(categorize("BITCOIN GOLD INDEX"), ("crypto", "Crypto"));
        assert_eq!(categorize("CRUDE OIL, LIGHT SWEET"), ("energy", "Energy"));
    }

    #[test]
    fn unmatched_name_is_other() {
        assert_eq!(categorize("FROZEN CONCENTRATED WIDGETS"), OTHER);
        assert_eq!(categorize(""), OTHER);
    }
}
