// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod bar;       // Déclaration du module bar (fichier bar.rs)
pub mod symbol;    // Déclaration du module symbol (fichier symbol.rs)
pub mod timeframe; // Déclaration du module timeframe (fichier timeframe.rs)

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use lazychart::models::bar::Bar;
// On peut faire : use lazychart::models::Bar;
pub use bar::{Bar, BarSeries};
pub use symbol::{to_yahoo_symbol, ALL_SYMBOLS};
pub use timeframe::Timeframe;
