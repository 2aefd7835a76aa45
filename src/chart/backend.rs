// ============================================================================
// Trait : RasterBackend
// ============================================================================
// Contrat commun des backends de rasterisation
//
// CONCEPT RUST : Trait objects (dyn)
// - Chaque backend implémente le même contrat render_to_file
// - L'export essaie une liste ordonnée de stratégies jusqu'au premier
//   succès : plotters d'abord, puis le rasterizer logiciel de secours
// - Box<dyn RasterBackend> : dispatch dynamique, la liste est hétérogène
// ============================================================================

use std::path::Path;

use crate::chart::figure::ChartFigure;
use crate::chart::plotters_backend::PlottersBackend;
use crate::chart::software::SoftwareBackend;
use crate::chart::RenderError;

/// Contrat d'un backend de rasterisation : figure → fichier PNG
pub trait RasterBackend {
    /// Nom du backend, pour les logs
    fn name(&self) -> &'static str;

    /// Rasterise la figure vers un fichier PNG au chemin donné
    fn render_to_file(&self, figure: &ChartFigure, path: &Path) -> Result<(), RenderError>;
}

/// La liste ordonnée des backends, du préféré au backend de secours
pub fn default_backends() -> Vec<Box<dyn RasterBackend>> {
    vec![Box::new(PlottersBackend), Box::new(SoftwareBackend)]
}
