// ============================================================================
// Module : symbol
// ============================================================================
// Traduction des symboles du dashboard vers la forme Yahoo Finance
//
// CONCEPT : Translation pure et idempotente
// - "EURUSD" (6 lettres, paire forex) → "EURUSD=X"
// - "BTCUSD" (la paire crypto du dashboard) → "BTC-USD"
// - Tout le reste passe tel quel
// - Retraduire une forme déjà provider ("EURUSD=X", "BTC-USD") ne
//   double-transforme rien : ces formes contiennent '=' ou '-' et ne sont
//   pas des codes de 6 lettres
// ============================================================================

/// Les symboles proposés par le dashboard : 28 paires forex + BTCUSD
pub const ALL_SYMBOLS: [&str; 29] = [
    "EURUSD", "GBPUSD", "USDJPY", "USDCHF",
    "AUDUSD", "USDCAD", "NZDUSD",
    "EURAUD", "EURCAD", "EURCHF", "EURGBP", "EURJPY", "EURNZD",
    "GBPAUD", "GBPCAD", "GBPCHF", "GBPJPY", "GBPNZD",
    "AUDCAD", "AUDCHF", "AUDJPY", "AUDNZD",
    "CADCHF", "CADJPY", "CHFJPY", "NZDCAD", "NZDCHF", "NZDJPY",
    "BTCUSD",
];

/// Traduit un symbole du dashboard vers le ticker Yahoo Finance
///
/// CONCEPT RUST : &str -> String
/// - Prend une référence (pas d'allocation pour tester)
/// - Retourne une String owned (la forme traduite)
///
/// # Exemples
/// ```
/// use lazychart::models::symbol::to_yahoo_symbol;
/// assert_eq!(to_yahoo_symbol("EURUSD"), "EURUSD=X");
/// assert_eq!(to_yahoo_symbol("BTCUSD"), "BTC-USD");
/// assert_eq!(to_yahoo_symbol("AAPL"), "AAPL");
/// ```
pub fn to_yahoo_symbol(symbol: &str) -> String {
    // La paire crypto est testée avant la règle des 6 lettres :
    // "BTCUSD" fait 6 lettres mais doit devenir "BTC-USD", pas "BTCUSD=X"
    if symbol == "BTCUSD" {
        return "BTC-USD".to_string();
    }

    // Paire forex : 6 lettres ASCII → forme composée "XXXYYY=X"
    if symbol.len() == 6 && symbol.chars().all(|c| c.is_ascii_alphabetic()) {
        return format!("{}{}=X", &symbol[..3], &symbol[3..]);
    }

    // Tout le reste passe tel quel (y compris les formes déjà traduites)
    symbol.to_string()
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forex_pair_translation() {
        assert_eq!(to_yahoo_symbol("EURUSD"), "EURUSD=X");
        assert_eq!(to_yahoo_symbol("AUDJPY"), "AUDJPY=X");
        assert_eq!(to_yahoo_symbol("GBPNZD"), "GBPNZD=X");
    }

    #[test]
    fn test_crypto_pair_translation() {
        // BTCUSD fait 6 lettres mais doit prendre la branche crypto
        assert_eq!(to_yahoo_symbol("BTCUSD"), "BTC-USD");
    }

    #[test]
    fn test_passthrough() {
        assert_eq!(to_yahoo_symbol("AAPL"), "AAPL");
        assert_eq!(to_yahoo_symbol("^GSPC"), "^GSPC");
    }

    #[test]
    fn test_translation_is_idempotent() {
        // Retraduire une forme déjà provider ne double-transforme pas
        for sym in ALL_SYMBOLS {
            let once = to_yahoo_symbol(sym);
            let twice = to_yahoo_symbol(&once);
            assert_eq!(once, twice, "double transformation pour {}", sym);
        }
    }

    #[test]
    fn test_translation_is_deterministic() {
        assert_eq!(to_yahoo_symbol("EURUSD"), to_yahoo_symbol("EURUSD"));
    }

    #[test]
    fn test_all_symbols_catalog() {
        assert_eq!(ALL_SYMBOLS.len(), 29);
        assert!(ALL_SYMBOLS.contains(&"EURUSD"));
        assert!(ALL_SYMBOLS.contains(&"BTCUSD"));
    }
}
