// ============================================================================
// Erreurs : acquisition de données
// ============================================================================
// Taxonomie typée des échecs de fetch, pour que le caller puisse distinguer
// les cas sans inspecter des strings
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère l'implémentation de std::error::Error
// - #[error("...")] définit le message Display
// - #[from] génère la conversion automatique (pour l'opérateur ?)
// ============================================================================

use thiserror::Error;

use crate::models::Timeframe;

/// Erreurs de l'acquisition (fetch + normalisation)
#[derive(Debug, Error)]
pub enum FetchError {
    /// La requête HTTP elle-même a échoué (réseau, timeout, etc.)
    #[error("requête HTTP vers Yahoo Finance échouée: {0}")]
    Http(#[from] reqwest::Error),

    /// Le provider a retourné une erreur structurée (code + description)
    #[error("erreur API Yahoo Finance [{code}]: {description}")]
    Api { code: String, description: String },

    /// La fenêtre demandée dépasse la plage autorisée par le provider
    ///
    /// Déclenche exactement un retry avec la fenêtre conservatrice du
    /// timeframe (voir Timeframe::fallback_window_days). Un deuxième échec
    /// est terminal pour cet appel.
    #[error("fenêtre de {window_days} jours refusée par le provider pour {symbol}")]
    RangeExceeded { symbol: String, window_days: u32 },

    /// Le provider a répondu, mais sans aucune barre
    #[error("aucune donnée pour {symbol} avec le timeframe {timeframe:?}")]
    NoData { symbol: String, timeframe: Timeframe },

    /// Des colonnes obligatoires manquent après normalisation
    #[error("colonnes obligatoires manquantes: {missing:?}")]
    SchemaMismatch { missing: Vec<String> },
}

impl FetchError {
    /// Vérifie si l'erreur est une erreur de plage (candidate au retry)
    pub fn is_range_exceeded(&self) -> bool {
        matches!(self, FetchError::RangeExceeded { .. })
    }
}
