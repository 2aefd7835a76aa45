// ============================================================================
// Structure : ChartFigure
// ============================================================================
// La figure à deux panneaux, sous forme de données pures, prête à être
// rasterisée par n'importe quel backend
//
// CONCEPT : Séparation construction / rasterisation
// - build() est pur : série + indicateurs → données de tracé (testable
//   sans toucher au disque ni à une bibliothèque graphique)
// - Les backends (plotters, rasterizer logiciel) consomment la même figure
//
// CONCEPT : Fenêtre visible
// - Les indicateurs sont calculés sur la série COMPLÈTE, puis la fenêtre
//   visible découpe les colonnes déjà calculées — les valeurs affichées
//   reflètent donc le lookback complet, pas un recalcul sur la tranche
// ============================================================================

use crate::chart::RenderError;
use crate::indicators::IndicatorSet;
use crate::models::{Bar, BarSeries};

/// Nombre minimal de barres pour produire un graphique exploitable
pub const MIN_BARS: usize = 5;

/// Figure à deux panneaux (prix + oscillateur), données pures
#[derive(Debug, Clone)]
pub struct ChartFigure {
    /// Symbole affiché dans le titre
    pub symbol: String,

    /// Label du timeframe ("M5", "H1", "D1"), utilisé dans le titre et
    /// le nom de l'artefact
    pub timeframe_label: String,

    /// Titre complet du graphique
    pub title: String,

    /// Les barres de la fenêtre visible (tranche finale de la série)
    pub bars: Vec<Bar>,

    /// SMA 20, découpée sur la fenêtre visible
    pub ma_fast: Vec<Option<f64>>,
    /// SMA 50, découpée sur la fenêtre visible
    pub ma_slow: Vec<Option<f64>>,
    /// Résistance (rolling max 20), découpée sur la fenêtre visible
    pub resistance: Vec<Option<f64>>,
    /// Support (rolling min 20), découpé sur la fenêtre visible
    pub support: Vec<Option<f64>>,
    /// RSI 14, découpé sur la fenêtre visible
    pub rsi: Vec<Option<f64>>,

    /// Prix actuel : close de la dernière barre de la série COMPLÈTE
    /// (pas de la fenêtre visible — c'est le niveau de référence marqué
    /// d'une ligne horizontale)
    pub current_price: f64,

    /// Label du prix actuel, déjà formaté (5 ou 2 décimales)
    pub current_price_label: String,
}

impl ChartFigure {
    /// Construit la figure à partir d'une série et d'une fenêtre visible
    ///
    /// # Arguments
    /// * `series` - La série complète (indicateurs calculés dessus)
    /// * `visible_bars` - Si Some(n) avec n < longueur, seules les n
    ///   dernières barres sont affichées ; sinon toute la série
    ///
    /// # Erreurs
    /// * `RenderError::InsufficientData` si la série a moins de 5 barres
    pub fn build(
        series: &BarSeries,
        symbol: &str,
        timeframe_label: &str,
        visible_bars: Option<usize>,
    ) -> Result<Self, RenderError> {
        // Garde : pas assez de points pour un graphique utile
        if series.len() < MIN_BARS {
            return Err(RenderError::InsufficientData {
                got: series.len(),
                min: MIN_BARS,
            });
        }

        // Indicateurs sur la série complète, TOUJOURS
        let indicators = IndicatorSet::compute(series);

        // Prix actuel : dernière barre de la série complète
        // Unwrap sûr : len >= MIN_BARS > 0
        let current_price = series.current_price().unwrap();

        // Fenêtre visible : tranche finale, ou tout
        // Une fenêtre de 0 vaut "pas de fenêtre" : toute la série
        let total = series.len();
        let window = match visible_bars {
            Some(n) if n > 0 && n < total => n,
            _ => total,
        };
        let start = total - window;

        let mut title = format!("{} Candlestick Chart ({})", symbol, timeframe_label);
        if window < total {
            title.push_str(&format!(" - Last {} Bars", window));
        }

        Ok(Self {
            symbol: symbol.to_string(),
            timeframe_label: timeframe_label.to_string(),
            title,
            bars: series.bars[start..].to_vec(),
            ma_fast: indicators.ma_fast[start..].to_vec(),
            ma_slow: indicators.ma_slow[start..].to_vec(),
            resistance: indicators.resistance[start..].to_vec(),
            support: indicators.support[start..].to_vec(),
            rsi: indicators.rsi[start..].to_vec(),
            current_price,
            current_price_label: format!("Current Price: {}", format_price(current_price)),
        })
    }

    /// Nombre de barres affichées
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Vrai si la fenêtre visible est vide (ne devrait pas arriver après build)
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Plage de prix du panneau supérieur (avec marge de 2%)
    ///
    /// Couvre les barres, les overlays ET la ligne de prix actuel, pour
    /// que rien ne sorte du cadre
    pub fn price_range(&self) -> (f64, f64) {
        let mut min = self.current_price;
        let mut max = self.current_price;

        for bar in &self.bars {
            min = min.min(bar.low);
            max = max.max(bar.high);
        }
        for column in [&self.ma_fast, &self.ma_slow, &self.resistance, &self.support] {
            for v in column.iter().flatten() {
                min = min.min(*v);
                max = max.max(*v);
            }
        }

        let margin = (max - min).abs().max(f64::EPSILON) * 0.02;
        (min - margin, max + margin)
    }
}

/// Formate un prix selon son échelle
///
/// CONCEPT : Format dynamique
/// - < 1000 : 5 décimales (paires forex autour de 1.0)
/// - >= 1000 : 2 décimales (échelle BTC)
pub fn format_price(price: f64) -> String {
    if price < 1000.0 {
        format!("{:.5}", price)
    } else {
        format!("{:.2}", price)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
