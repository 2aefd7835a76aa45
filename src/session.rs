// ============================================================================
// Session : orchestration d'un cycle symbole → fetch → indicateurs → PNG
// ============================================================================
// La session appartient à l'appelant : aucun état global, aucun singleton.
// Deux sessions sur le même couple (symbole, timeframe) écrivent le même
// fichier PNG ; le dernier écrivain gagne, c'est assumé.
//
// CONCEPT RUST : composition d'erreurs
// - SessionError agrège FetchError et RenderError via #[from], le cycle
//   n'a qu'un seul type d'échec à rapporter par timeframe
// ============================================================================

use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info, instrument};

use crate::api::{FetchError, YahooClient};
use crate::chart::{self, RenderError};
use crate::models::{BarSeries, Timeframe};

/// Nombre de barres demandées par défaut
const DEFAULT_REQUESTED_BARS: usize = 100;

/// Échec d'une étape du cycle pour un timeframe donné
#[derive(Debug, Error)]
pub enum SessionError {
    /// L'acquisition ou la normalisation des données a échoué
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// La construction de la figure a échoué (série trop courte)
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Paramètres d'un cycle de rendu
#[derive(Debug, Clone)]
pub struct ChartOptions {
    /// Nombre de barres demandées au provider (après troncature)
    pub requested_bars: usize,

    /// Fenêtre visible : Some(n) pour n'afficher que les n dernières
    /// barres, None pour toute la série
    pub visible_bars: Option<usize>,

    /// Répertoire de sortie des PNG
    pub out_dir: PathBuf,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            requested_bars: DEFAULT_REQUESTED_BARS,
            visible_bars: None,
            out_dir: PathBuf::from("."),
        }
    }
}

/// Résultat du cycle pour un timeframe
#[derive(Debug)]
pub struct TimeframeOutcome {
    pub timeframe: Timeframe,
    pub result: Result<CycleSuccess, SessionError>,
}

/// Ce qu'un timeframe réussi a produit
#[derive(Debug)]
pub struct CycleSuccess {
    /// Nombre de barres effectivement tracées
    pub bars: usize,

    /// Chemin du PNG, absent si tous les backends de rendu ont échoué
    /// (la figure a quand même été construite)
    pub artifact: Option<PathBuf>,
}

/// Bilan d'un cycle complet sur tous les timeframes
#[derive(Debug)]
pub struct CycleReport {
    pub symbol: String,
    pub outcomes: Vec<TimeframeOutcome>,
}

impl CycleReport {
    /// Nombre de timeframes tentés
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    /// Nombre de timeframes ayant produit une figure
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Vrai si tous les timeframes tentés ont réussi
    pub fn is_full_success(&self) -> bool {
        self.succeeded() == self.attempted()
    }
}

/// Session de travail : un client HTTP réutilisé, un cache de séries,
/// des options de rendu
pub struct Session {
    client: YahooClient,
    options: ChartOptions,

    /// Symbole actuellement sélectionné (fixé par select_symbol ou par le
    /// dernier run_cycle)
    selected: Option<String>,

    /// Dernière série obtenue par couple (symbole, timeframe)
    /// CONCEPT : le cache évite de re-télécharger quand l'appelant
    /// redemande le même couple dans la même session (ex: changement de
    /// fenêtre visible sans nouveau fetch)
    cache: HashMap<(String, Timeframe), BarSeries>,
}

impl Session {
    /// Construit une session ; échoue seulement si le client HTTP ne
    /// peut pas être initialisé
    pub fn new(options: ChartOptions) -> Result<Self, FetchError> {
        Ok(Self {
            client: YahooClient::new()?,
            options,
            selected: None,
            cache: HashMap::new(),
        })
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    /// Change le symbole sélectionné
    pub fn select_symbol(&mut self, symbol: &str) {
        self.selected = Some(symbol.to_string());
    }

    /// Symbole actuellement sélectionné
    pub fn selected_symbol(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Change la fenêtre visible pour les rendus suivants
    ///
    /// Les séries restant en cache, un nouveau rendu avec une autre fenêtre
    /// ne redéclenche pas de fetch
    pub fn set_visible_bars(&mut self, visible_bars: Option<usize>) {
        self.options.visible_bars = visible_bars;
    }

    /// Série en cache pour un couple (symbole, timeframe), si présente
    pub fn cached(&self, symbol: &str, timeframe: Timeframe) -> Option<&BarSeries> {
        self.cache.get(&(symbol.to_string(), timeframe))
    }

    /// Récupère une série, depuis le cache ou le provider
    pub async fn series(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<&BarSeries, FetchError> {
        let key = (symbol.to_string(), timeframe);
        if !self.cache.contains_key(&key) {
            let series = self
                .client
                .fetch(symbol, timeframe, self.options.requested_bars)
                .await?;
            self.cache.insert(key.clone(), series);
        }
        // Unwrap sûr : la clé vient d'être insérée ou existait déjà
        Ok(self.cache.get(&key).unwrap())
    }

    /// Fetch + figure + PNG pour un seul timeframe
    #[instrument(skip(self))]
    pub async fn render_timeframe(
        &mut self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<CycleSuccess, SessionError> {
        let visible = self.options.visible_bars;
        let out_dir = self.options.out_dir.clone();

        let series = self.series(symbol, timeframe).await?;
        let render = chart::render(series, symbol, timeframe.label(), visible, &out_dir)?;

        Ok(CycleSuccess {
            bars: render.figure.len(),
            artifact: render.artifact().map(|a| a.path.clone()),
        })
    }

    /// Cycle complet : chaque timeframe est tenté séquentiellement, un
    /// échec n'interrompt pas les suivants
    pub async fn run_cycle(&mut self, symbol: &str) -> CycleReport {
        self.select_symbol(symbol);
        let mut outcomes = Vec::with_capacity(Timeframe::all().len());

        for timeframe in Timeframe::all() {
            let result = self.render_timeframe(symbol, timeframe).await;
            match &result {
                Ok(success) => {
                    info!(
                        symbol,
                        timeframe = timeframe.label(),
                        bars = success.bars,
                        artifact = ?success.artifact,
                        "Timeframe rendu"
                    );
                }
                Err(e) => {
                    error!(
                        symbol,
                        timeframe = timeframe.label(),
                        error = %e,
                        "Timeframe en échec, on continue"
                    );
                }
            }
            outcomes.push(TimeframeOutcome { timeframe, result });
        }

        CycleReport {
            symbol: symbol.to_string(),
            outcomes,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bar;
    use chrono::{Duration, TimeZone, Utc};

    fn series(symbol: &str, timeframe: Timeframe, n: usize) -> BarSeries {
        let mut s = BarSeries::new(symbol.to_string(), timeframe);
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        for i in 0..n {
            let p = 150.0 + i as f64 * 0.1;
            s.bars.push(Bar::new(
                t0 + Duration::hours(i as i64),
                p,
                p + 0.3,
                p - 0.3,
                p + 0.1,
                None,
            ));
        }
        s
    }

    #[test]
    fn test_options_defaults() {
        let opts = ChartOptions::default();
        assert_eq!(opts.requested_bars, 100);
        assert!(opts.visible_bars.is_none());
    }

    #[test]
    fn test_cache_is_keyed_by_symbol_and_timeframe() {
        let mut session = Session::new(ChartOptions::default()).unwrap();
        session.cache.insert(
            ("EURUSD".to_string(), Timeframe::H1),
            series("EURUSD", Timeframe::H1, 10),
        );

        assert!(session.cached("EURUSD", Timeframe::H1).is_some());
        // Même symbole, autre timeframe : entrée distincte
        assert!(session.cached("EURUSD", Timeframe::D1).is_none());
        assert!(session.cached("USDJPY", Timeframe::H1).is_none());
    }

    #[tokio::test]
    async fn test_cached_series_skips_provider() {
        let mut session = Session::new(ChartOptions::default()).unwrap();
        let seeded = series("EURUSD", Timeframe::H1, 10);
        session
            .cache
            .insert(("EURUSD".to_string(), Timeframe::H1), seeded.clone());

        // La série vient du cache : aucun appel réseau
        let got = session.series("EURUSD", Timeframe::H1).await.unwrap();
        assert_eq!(*got, seeded);
    }

    #[tokio::test]
    async fn test_render_timeframe_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(ChartOptions {
            requested_bars: 100,
            visible_bars: Some(20),
            out_dir: dir.path().to_path_buf(),
        })
        .unwrap();
        session.cache.insert(
            ("EURUSD".to_string(), Timeframe::H1),
            series("EURUSD", Timeframe::H1, 60),
        );

        let success = session
            .render_timeframe("EURUSD", Timeframe::H1)
            .await
            .unwrap();

        // Fenêtre visible de 20 barres, PNG nommé {symbole}_{timeframe}.png
        assert_eq!(success.bars, 20);
        let artifact = success.artifact.expect("un backend doit réussir");
        assert_eq!(
            artifact.file_name().unwrap().to_str().unwrap(),
            "EURUSD_H1.png"
        );
    }

    #[tokio::test]
    async fn test_render_timeframe_short_series_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(ChartOptions {
            requested_bars: 100,
            visible_bars: None,
            out_dir: dir.path().to_path_buf(),
        })
        .unwrap();
        session.cache.insert(
            ("EURUSD".to_string(), Timeframe::H1),
            series("EURUSD", Timeframe::H1, 3),
        );

        let err = session
            .render_timeframe("EURUSD", Timeframe::H1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Render(RenderError::InsufficientData { got: 3, min: 5 })
        ));
    }

    #[tokio::test]
    async fn test_rerender_with_new_window_reuses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(ChartOptions {
            requested_bars: 100,
            visible_bars: Some(30),
            out_dir: dir.path().to_path_buf(),
        })
        .unwrap();
        session.select_symbol("EURUSD");
        session.cache.insert(
            ("EURUSD".to_string(), Timeframe::H1),
            series("EURUSD", Timeframe::H1, 60),
        );

        let first = session
            .render_timeframe("EURUSD", Timeframe::H1)
            .await
            .unwrap();
        assert_eq!(first.bars, 30);

        // Nouvelle fenêtre visible : la série vient du cache, pas de fetch
        session.set_visible_bars(Some(10));
        let second = session
            .render_timeframe("EURUSD", Timeframe::H1)
            .await
            .unwrap();
        assert_eq!(second.bars, 10);
        assert_eq!(session.selected_symbol(), Some("EURUSD"));
    }

    #[test]
    fn test_cycle_report_counts() {
        let report = CycleReport {
            symbol: "EURUSD".to_string(),
            outcomes: vec![
                TimeframeOutcome {
                    timeframe: Timeframe::M5,
                    result: Ok(CycleSuccess {
                        bars: 100,
                        artifact: None,
                    }),
                },
                TimeframeOutcome {
                    timeframe: Timeframe::H1,
                    result: Err(SessionError::Render(RenderError::InsufficientData {
                        got: 2,
                        min: 5,
                    })),
                },
                TimeframeOutcome {
                    timeframe: Timeframe::D1,
                    result: Ok(CycleSuccess {
                        bars: 100,
                        artifact: None,
                    }),
                },
            ],
        };

        assert_eq!(report.attempted(), 3);
        assert_eq!(report.succeeded(), 2);
        assert!(!report.is_full_success());
    }
}
