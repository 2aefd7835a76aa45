// ============================================================================
// Structure : RawFrame
// ============================================================================
// Représentation tabulaire brute d'une réponse provider, avant normalisation
//
// CONCEPT : Deux layouts possibles côté provider
// - Layout "plat" : colonnes simples ("Open", "High", ...) + index datetime
// - Layout "hiérarchique" : colonnes à deux niveaux, un niveau pour le type
//   de champ ("Open") et un niveau pour le ticker ("AUDJPY=X")
// Les deux doivent se normaliser vers les mêmes champs canoniques :
// time, open, high, low, close (+ volume optionnel)
//
// CONCEPT RUST : Enum pour modéliser les deux formes de clé de colonne
// - Le compilateur force à gérer les deux cas (exhaustivité)
// ============================================================================

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::api::error::FetchError;
use crate::models::{Bar, BarSeries, Timeframe};

/// Clé d'une colonne dans une réponse provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnKey {
    /// Layout plat : juste le nom du champ (ex: "Open")
    Flat(String),

    /// Layout hiérarchique : (champ, ticker), ex: ("Open", "AUDJPY=X")
    Nested { field: String, ticker: String },
}

impl ColumnKey {
    /// Retourne le nom de champ, quel que soit le layout
    fn field(&self) -> &str {
        match self {
            ColumnKey::Flat(name) => name,
            ColumnKey::Nested { field, .. } => field,
        }
    }
}

/// Une colonne de valeurs numériques
///
/// CONCEPT RUST : Vec<Option<f64>>
/// - Some(v) : valeur présente à cette ligne
/// - None : trou dans les données (le provider en laisse régulièrement)
#[derive(Debug, Clone)]
pub struct RawColumn {
    pub key: ColumnKey,
    pub values: Vec<Option<f64>>,
}

/// Réponse tabulaire brute : un index datetime + des colonnes de valeurs
#[derive(Debug, Clone, Default)]
pub struct RawFrame {
    /// L'index datetime, promu en champ `time` à la normalisation
    pub index: Vec<DateTime<Utc>>,

    /// Les colonnes, dans l'ordre retourné par le provider
    pub columns: Vec<RawColumn>,
}

impl RawFrame {
    /// Cherche une colonne par nom de champ, insensible à la casse
    ///
    /// "Open", "open" et "OPEN" désignent la même colonne canonique
    fn find_column(&self, canonical: &str) -> Option<&RawColumn> {
        self.columns
            .iter()
            .find(|c| c.key.field().eq_ignore_ascii_case(canonical))
    }

    /// Normalise le frame brut en BarSeries canonique
    ///
    /// Étapes :
    /// 1. Vérifie que les champs obligatoires existent (open/high/low/close,
    ///    plus l'index promu en time) → SchemaMismatch sinon, en nommant
    ///    les champs manquants
    /// 2. Assemble les barres ligne par ligne, en sautant celles qui ont
    ///    des trous (comportement hérité du parsing Yahoo)
    /// 3. Élimine les timestamps dupliqués ou non croissants : l'invariant
    ///    de BarSeries est un `time` strictement croissant
    ///
    /// Le volume est optionnel : présent seulement si le provider l'a fourni
    /// (les paires forex n'en ont généralement pas)
    pub fn normalize(&self, symbol: &str, timeframe: Timeframe) -> Result<BarSeries, FetchError> {
        // Cas dégénéré : aucune ligne du tout. Une réponse vide est une
        // affaire de NoData (politique du caller), pas de schéma — sauf si
        // des valeurs existent sans index, ce qui est un frame malformé
        if self.index.is_empty() {
            if self.columns.iter().any(|c| !c.values.is_empty()) {
                return Err(FetchError::SchemaMismatch {
                    missing: vec!["time".to_string()],
                });
            }
            return Ok(BarSeries::new(symbol.to_string(), timeframe));
        }

        // 1. Schema-completeness check
        let mut missing = Vec::new();
        for field in ["open", "high", "low", "close"] {
            if self.find_column(field).is_none() {
                missing.push(field.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(FetchError::SchemaMismatch { missing });
        }

        // Unwrap sûr : la présence vient d'être vérifiée
        let opens = &self.find_column("open").unwrap().values;
        let highs = &self.find_column("high").unwrap().values;
        let lows = &self.find_column("low").unwrap().values;
        let closes = &self.find_column("close").unwrap().values;
        let volumes = self.find_column("volume").map(|c| &c.values);

        let mut series = BarSeries::new(symbol.to_string(), timeframe);
        let mut skipped = 0usize;
        let mut dropped_order = 0usize;

        // 2. Assemble les barres ligne par ligne
        for (i, &time) in self.index.iter().enumerate() {
            // CONCEPT RUST : Option chaining
            // - .get(i) : Option<&Option<f64>> (la ligne peut manquer)
            // - .and_then(|v| *v) : aplati vers Option<f64>
            let row = (
                opens.get(i).and_then(|v| *v),
                highs.get(i).and_then(|v| *v),
                lows.get(i).and_then(|v| *v),
                closes.get(i).and_then(|v| *v),
            );

            let (open, high, low, close) = match row {
                (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
                _ => {
                    skipped += 1;
                    continue; // Skip cette barre si données incomplètes
                }
            };

            // 3. Invariant : time strictement croissant
            if let Some(last) = series.bars.last() {
                if time <= last.time {
                    dropped_order += 1;
                    continue;
                }
            }

            let volume = volumes.and_then(|vs| vs.get(i).and_then(|v| *v));
            series.bars.push(Bar::new(time, open, high, low, close, volume));
        }

        if skipped > 0 {
            warn!(skipped, total = self.index.len(), "Barres incomplètes ignorées");
        }
        if dropped_order > 0 {
            warn!(
                dropped = dropped_order,
                "Timestamps dupliqués ou non croissants éliminés"
            );
        }

        Ok(series)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
