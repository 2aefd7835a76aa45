// ============================================================================
// Structure : Bar (Open, High, Low, Close, Volume)
// ============================================================================
// Représente une barre de prix normalisée (chandelle japonaise)
//
// CONCEPTS RUST :
// 1. DateTime<Utc> : type de chrono pour dates avec timezone UTC
// 2. f64 : floating point 64 bits pour les prix (précision suffisante)
// 3. Option<f64> : le volume est absent pour beaucoup de paires forex
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Timeframe;

/// Une barre de prix normalisée
///
/// L'invariant `low ≤ open,close ≤ high` est attendu du provider mais pas
/// vérifié ici : les données passent telles quelles (garbage-in, garbage-out).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Timestamp de la barre
    pub time: DateTime<Utc>,

    /// Prix d'ouverture (Open)
    pub open: f64,

    /// Prix le plus haut (High)
    pub high: f64,

    /// Prix le plus bas (Low)
    pub low: f64,

    /// Prix de clôture (Close)
    pub close: f64,

    /// Volume échangé
    /// CONCEPT RUST : Option<T>
    /// - Some(v) : le provider a fourni un volume
    /// - None : pas de volume (typique des paires forex)
    pub volume: Option<f64>,
}

impl Bar {
    /// Constructeur : crée une nouvelle barre
    pub fn new(
        time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<f64>,
    ) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Vérifie si la barre est haussière (bullish)
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Vérifie si la barre est baissière (bearish)
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Séquence ordonnée de barres pour une paire (symbole, timeframe)
///
/// CONCEPT RUST : Ownership
/// - BarSeries possède le Vec
/// - Le Vec possède toutes les Bar
/// - Produite fraîche à chaque fetch, jamais persistée : le caller en est
///   l'unique propriétaire pendant un cycle de rendu
///
/// Invariant : les `time` sont strictement croissants (les doublons sont
/// éliminés pendant la normalisation, voir api::frame)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    /// Symbole demandé par le caller (ex: "EURUSD", pas la forme provider)
    pub symbol: String,

    /// Intervalle d'échantillonnage des barres
    pub timeframe: Timeframe,

    /// Liste des barres, triées par timestamp strictement croissant
    pub bars: Vec<Bar>,
}

impl BarSeries {
    /// Crée une nouvelle série vide
    pub fn new(symbol: String, timeframe: Timeframe) -> Self {
        Self {
            symbol,
            timeframe,
            bars: Vec::new(),
        }
    }

    /// Retourne le nombre de barres
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Vérifie si la série est vide
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Retourne la barre la plus récente
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Prix actuel : close de la dernière barre de la série complète
    ///
    /// C'est le niveau de référence que le graphique marque d'une ligne
    /// horizontale, même quand seule une fenêtre de la série est affichée.
    pub fn current_price(&self) -> Option<f64> {
        self.last().map(|b| b.close)
    }

    /// Tronque la série pour ne garder que les `requested_bars` plus récentes
    ///
    /// CONCEPT : Tail-truncate
    /// - Si la série est plus courte que demandé, on ne touche à rien
    ///   (pas de padding : 40 barres reçues pour 100 demandées → 40 barres)
    /// - L'ordre chronologique est préservé
    pub fn truncate_tail(&mut self, requested_bars: usize) {
        if self.bars.len() > requested_bars {
            let start = self.bars.len() - requested_bars;
            self.bars.drain(..start);
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
