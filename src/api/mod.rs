// ============================================================================
// Module : api
// ============================================================================
// Ce module contient l'acquisition des données de marché : le client Yahoo
// Finance, la représentation tabulaire brute des réponses et la taxonomie
// d'erreurs typée du fetch
// ============================================================================

pub mod error; // Taxonomie d'erreurs du fetch (FetchError)
pub mod frame; // Réponse tabulaire brute + normalisation (RawFrame)
pub mod yahoo; // Client API Yahoo Finance

// Re-export des éléments principaux
pub use error::FetchError;
pub use frame::{ColumnKey, RawColumn, RawFrame};
pub use yahoo::{fetch_bars, YahooClient};
