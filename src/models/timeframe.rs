// ============================================================================
// Enum : Timeframe
// ============================================================================
// Les trois intervalles d'échantillonnage du dashboard : M5, H1, D1
//
// CONCEPT : Interval vs fenêtre d'historique
// - Chaque timeframe mappe vers (a) le token d'intervalle Yahoo Finance
//   et (b) une fenêtre d'historique maximale tolérée par le provider
// - La fenêtre H1/D1 dépend aussi du nombre de barres demandées (buffer),
//   bornée pour ne jamais dépasser les plafonds Yahoo
//
// Limitations Yahoo Finance :
// - 5m : max ~60 jours d'historique intraday
// - 1h : max 730 jours
// - 1d : historique beaucoup plus long (on se limite à 5 ans)
// ============================================================================

use serde::{Deserialize, Serialize};

/// Intervalle d'échantillonnage d'une série de barres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 5 minutes
    M5,
    /// 1 heure
    H1,
    /// 1 jour (daily)
    D1,
}

impl Timeframe {
    /// Convertit le timeframe en token d'intervalle pour l'API Yahoo Finance
    ///
    /// CONCEPT RUST : &'static str
    /// - Retourne une string littérale (dans le binaire)
    /// - Pas d'allocation, très efficace
    pub fn to_yahoo_interval(&self) -> &'static str {
        match self {
            Timeframe::M5 => "5m",
            Timeframe::H1 => "1h",
            Timeframe::D1 => "1d",
        }
    }

    /// Retourne le label pour l'affichage et le nommage des artefacts
    ///
    /// Le fichier PNG s'appelle `{symbol}_{label}.png`
    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::M5 => "M5",
            Timeframe::H1 => "H1",
            Timeframe::D1 => "D1",
        }
    }

    /// Calcule la fenêtre d'historique (en jours) pour un nombre de barres
    ///
    /// Politique par timeframe :
    /// - M5 : fenêtre fixe de 60 jours (plafond intraday Yahoo)
    /// - H1 : clamp(barres × 1.5 jours, min 60, max 730)
    ///   Le multiplicateur donne du buffer : même avec des trous côté
    ///   provider (week-ends, marchés fermés) il reste assez de barres
    /// - D1 : clamp(barres × 2 jours, min 365, max 1825)
    pub fn window_days(&self, requested_bars: usize) -> u32 {
        match self {
            Timeframe::M5 => 60,
            Timeframe::H1 => {
                let days = (requested_bars as f64 * 1.5) as u32;
                days.clamp(60, 730)
            }
            Timeframe::D1 => {
                let days = (requested_bars * 2) as u32;
                days.clamp(365, 1825)
            }
        }
    }

    /// Fenêtre conservatrice pour le retry après une erreur de plage
    ///
    /// CONCEPT : Fallback asymétrique (préservé volontairement)
    /// - H1 : 365 jours, M5 : 30 jours
    /// - D1 : None — la politique daily reste déjà dans les limites du
    ///   provider, donc pas de branche de retry pour ce timeframe
    pub fn fallback_window_days(&self) -> Option<u32> {
        match self {
            Timeframe::M5 => Some(30),
            Timeframe::H1 => Some(365),
            Timeframe::D1 => None,
        }
    }

    /// Retourne les trois timeframes du dashboard (ordre d'affichage)
    pub fn all() -> [Timeframe; 3] {
        [Timeframe::M5, Timeframe::H1, Timeframe::D1]
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yahoo_interval_tokens() {
        assert_eq!(Timeframe::M5.to_yahoo_interval(), "5m");
        assert_eq!(Timeframe::H1.to_yahoo_interval(), "1h");
        assert_eq!(Timeframe::D1.to_yahoo_interval(), "1d");
    }

    #[test]
    fn test_m5_window_is_fixed() {
        // La fenêtre M5 ne dépend pas du nombre de barres demandées
        assert_eq!(Timeframe::M5.window_days(1), 60);
        assert_eq!(Timeframe::M5.window_days(100), 60);
        assert_eq!(Timeframe::M5.window_days(10_000), 60);
    }

    #[test]
    fn test_h1_window_clamp() {
        // 500 barres → 750 jours bruts, clampés au plafond de 730
        assert_eq!(Timeframe::H1.window_days(500), 730);

        // En dessous du minimum : clamp à 60
        assert_eq!(Timeframe::H1.window_days(10), 60);

        // Dans la plage : 200 × 1.5 = 300 jours
        assert_eq!(Timeframe::H1.window_days(200), 300);
    }

    #[test]
    fn test_d1_window_clamp() {
        // 100 × 2 = 200 → clamp au minimum 365
        assert_eq!(Timeframe::D1.window_days(100), 365);

        // 500 × 2 = 1000, dans la plage
        assert_eq!(Timeframe::D1.window_days(500), 1000);

        // 2000 × 2 = 4000 → clamp au maximum 1825 (5 ans)
        assert_eq!(Timeframe::D1.window_days(2000), 1825);
    }

    #[test]
    fn test_fallback_asymmetry() {
        assert_eq!(Timeframe::H1.fallback_window_days(), Some(365));
        assert_eq!(Timeframe::M5.fallback_window_days(), Some(30));
        // D1 n'a pas de branche de fallback, volontairement
        assert_eq!(Timeframe::D1.fallback_window_days(), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(Timeframe::M5.label(), "M5");
        assert_eq!(Timeframe::H1.label(), "H1");
        assert_eq!(Timeframe::D1.label(), "D1");
    }
}
