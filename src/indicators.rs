// ============================================================================
// Module : indicators
// ============================================================================
// Calcul des indicateurs techniques superposés au graphique :
// moyennes mobiles (tendance), RSI (momentum), support/résistance
//
// CONCEPTS RUST :
// 1. Vec<Option<f64>> : les premières valeurs d'un indicateur à fenêtre
//    glissante sont indéfinies (None), jamais un faux 0
// 2. Slices : les fonctions prennent &[f64], pas de copie
// 3. Itérateurs : fenêtres glissantes avec windows()
//
// IMPORTANT : les indicateurs se calculent toujours sur la série COMPLÈTE,
// même quand on n'affiche qu'une fenêtre de barres. La fenêtre visible ne
// fait que découper des colonnes déjà calculées (voir chart::figure), donc
// les premières barres affichées gardent des valeurs cohérentes avec le
// lookback long.
// ============================================================================

use serde::Serialize;

use crate::models::BarSeries;

/// Période de la moyenne mobile rapide
pub const MA_FAST_PERIOD: usize = 20;
/// Période de la moyenne mobile lente
pub const MA_SLOW_PERIOD: usize = 50;
/// Période du RSI
pub const RSI_PERIOD: usize = 14;
/// Période des niveaux support/résistance (rolling max/min)
pub const LEVEL_PERIOD: usize = 20;

/// Moyenne mobile simple (SMA)
///
/// Retourne un vecteur de même longueur que l'entrée :
/// - None pour les `period - 1` premières positions (fenêtre incomplète)
/// - Some(moyenne) ensuite
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    // CONCEPT : Somme glissante
    // - On entretient la somme de la fenêtre au lieu de la recalculer
    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(sum / period as f64);
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = Some(sum / period as f64);
    }
    out
}

/// Maximum glissant (résistance sur les highs)
pub fn rolling_max(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_extreme(values, period, f64::max)
}

/// Minimum glissant (support sur les lows)
pub fn rolling_min(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_extreme(values, period, f64::min)
}

/// Extrême glissant générique
///
/// CONCEPT RUST : Fonction d'ordre supérieur
/// - `pick` est f64::max ou f64::min, passée comme valeur
fn rolling_extreme(values: &[f64], period: usize, pick: fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let extreme = window.iter().copied().reduce(pick).unwrap();
        out[i] = Some(extreme);
    }
    out
}

/// RSI (Relative Strength Index), variante à moyenne glissante simple
///
/// Algorithme (période 14 par défaut) :
/// 1. delta par barre (le premier delta vaut 0, pas de barre précédente)
/// 2. gain = delta si positif sinon 0 ; loss = -delta si négatif sinon 0
/// 3. gain et loss lissés par moyenne glissante SIMPLE sur `period`
///    (pas exponentielle — choix assumé de la variante)
/// 4. rs = gain_moyen / loss_moyen, avec loss_moyen == 0 traité comme
///    rs = 0 (pas l'infini) pour éviter les artefacts de division
/// 5. rsi = 100 - 100 / (1 + rs)
///
/// Les `period - 1` premières valeurs sont indéfinies (None) : tout
/// consommateur doit les traiter comme "pas de signal", jamais comme 0.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    let mut gains = vec![0.0f64; n];
    let mut losses = vec![0.0f64; n];
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        if delta > 0.0 {
            gains[i] = delta;
        } else {
            losses[i] = -delta;
        }
    }

    let gain_mean = sma(&gains, period);
    let loss_mean = sma(&losses, period);

    gain_mean
        .into_iter()
        .zip(loss_mean)
        .map(|pair| match pair {
            (Some(g), Some(l)) => {
                // loss_moyen nul → rs = 0 (pas une division par zéro)
                let rs = if l == 0.0 { 0.0 } else { g / l };
                Some(100.0 - 100.0 / (1.0 + rs))
            }
            _ => None,
        })
        .collect()
}

/// Jeu complet d'indicateurs dérivés d'une série, éphémère, par rendu
///
/// Toutes les colonnes ont la longueur de la série complète
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSet {
    /// SMA 20 des closes (tendance rapide)
    pub ma_fast: Vec<Option<f64>>,
    /// SMA 50 des closes (tendance lente)
    pub ma_slow: Vec<Option<f64>>,
    /// RSI 14 des closes (momentum, borné [0, 100])
    pub rsi: Vec<Option<f64>>,
    /// Rolling max 20 des highs (résistance)
    pub resistance: Vec<Option<f64>>,
    /// Rolling min 20 des lows (support)
    pub support: Vec<Option<f64>>,
}

impl IndicatorSet {
    /// Calcule tous les indicateurs sur la série complète
    pub fn compute(series: &BarSeries) -> Self {
        let closes: Vec<f64> = series.bars.iter().map(|b| b.close).collect();
        let highs: Vec<f64> = series.bars.iter().map(|b| b.high).collect();
        let lows: Vec<f64> = series.bars.iter().map(|b| b.low).collect();

        Self {
            ma_fast: sma(&closes, MA_FAST_PERIOD),
            ma_slow: sma(&closes, MA_SLOW_PERIOD),
            rsi: rsi(&closes, RSI_PERIOD),
            resistance: rolling_max(&highs, LEVEL_PERIOD),
            support: rolling_min(&lows, LEVEL_PERIOD),
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
