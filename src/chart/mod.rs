// ============================================================================
// Module chart : construction de la figure et rasterisation PNG
// ============================================================================
// Le pipeline est en deux temps, volontairement séparés :
// 1. ChartFigure::build — purement calculatoire (indicateurs, fenêtre
//    visible, titre, prix actuel), testable sans toucher au disque
// 2. render — essaie chaque backend raster dans l'ordre jusqu'au premier
//    succès ; si tous échouent la figure reste exploitable, seul
//    l'artefact PNG est absent
// ============================================================================

pub mod backend;
pub mod figure;
pub mod plotters_backend;
pub mod software;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::models::BarSeries;

pub use backend::{default_backends, RasterBackend};
pub use figure::{ChartFigure, MIN_BARS};
pub use plotters_backend::PlottersBackend;
pub use software::SoftwareBackend;

/// Erreurs du pipeline de rendu
///
/// CONCEPT RUST : thiserror
/// - #[derive(Error)] génère Display et std::error::Error à partir des
///   attributs #[error(...)], sans boilerplate manuel
#[derive(Debug, Error)]
pub enum RenderError {
    /// Série trop courte pour tracer quoi que ce soit d'utile
    #[error("série trop courte pour un graphique : {got} barres (minimum {min})")]
    InsufficientData { got: usize, min: usize },

    /// Échec d'un backend de rasterisation (le suivant sera tenté)
    #[error("échec du backend de rendu : {0}")]
    Backend(String),

    /// Tous les backends ont échoué, aucun PNG n'a été produit
    #[error("aucun artefact PNG disponible pour {path}")]
    ArtifactUnavailable { path: PathBuf },
}

/// Fichier PNG effectivement écrit sur disque
#[derive(Debug, Clone)]
pub struct ChartArtifact {
    pub path: PathBuf,
    /// Nom du backend qui a produit le fichier
    pub backend: &'static str,
}

/// Résultat d'un rendu : la figure est toujours là, l'artefact seulement
/// si au moins un backend a réussi
#[derive(Debug)]
pub struct ChartRender {
    pub figure: ChartFigure,
    /// Chemin déterministe visé, que le fichier existe ou non
    path: PathBuf,
    artifact: Option<ChartArtifact>,
}

impl ChartRender {
    /// Artefact PNG s'il existe
    pub fn artifact(&self) -> Option<&ChartArtifact> {
        self.artifact.as_ref()
    }

    /// Variante stricte pour les appelants qui exigent le fichier
    pub fn require_artifact(&self) -> Result<&ChartArtifact, RenderError> {
        self.artifact
            .as_ref()
            .ok_or_else(|| RenderError::ArtifactUnavailable {
                path: self.path.clone(),
            })
    }
}

/// Chemin de l'artefact : {symbole}_{timeframe}.png dans out_dir
///
/// Un rendu ultérieur du même couple (symbole, timeframe) écrase le
/// fichier ; le dernier écrivain gagne.
pub fn artifact_path(out_dir: &Path, symbol: &str, timeframe_label: &str) -> PathBuf {
    out_dir.join(format!("{}_{}.png", symbol, timeframe_label))
}

/// Construit la figure puis tente chaque backend dans l'ordre
///
/// Les indicateurs sont calculés sur la série COMPLÈTE avant découpe de
/// la fenêtre visible (voir ChartFigure::build). L'échec d'un backend est
/// loggé puis le suivant est tenté ; l'échec de tous les backends n'est
/// pas une erreur, la figure est retournée sans artefact.
pub fn render(
    series: &BarSeries,
    symbol: &str,
    timeframe_label: &str,
    visible_bars: Option<usize>,
    out_dir: &Path,
) -> Result<ChartRender, RenderError> {
    render_with(
        series,
        symbol,
        timeframe_label,
        visible_bars,
        out_dir,
        &default_backends(),
    )
}

/// Variante à backends injectés (testable sans plotters)
pub fn render_with(
    series: &BarSeries,
    symbol: &str,
    timeframe_label: &str,
    visible_bars: Option<usize>,
    out_dir: &Path,
    backends: &[Box<dyn RasterBackend>],
) -> Result<ChartRender, RenderError> {
    let figure = ChartFigure::build(series, symbol, timeframe_label, visible_bars)?;
    let path = artifact_path(out_dir, symbol, timeframe_label);

    let mut artifact = None;
    for backend in backends {
        match backend.render_to_file(&figure, &path) {
            Ok(()) => {
                info!(
                    backend = backend.name(),
                    path = %path.display(),
                    "Graphique rasterisé"
                );
                artifact = Some(ChartArtifact {
                    path: path.clone(),
                    backend: backend.name(),
                });
                break;
            }
            Err(e) => {
                warn!(
                    backend = backend.name(),
                    error = %e,
                    "Backend de rendu en échec, tentative du suivant"
                );
            }
        }
    }

    if artifact.is_none() {
        warn!(
            symbol,
            timeframe = timeframe_label,
            "Tous les backends ont échoué, figure retournée sans PNG"
        );
    }

    Ok(ChartRender {
        figure,
        path,
        artifact,
    })
}

// ============================================================================
// TESTS
// ============================================================================
