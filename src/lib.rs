// ============================================================================
// LazyChart - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;        // Client Yahoo Finance et normalisation des données
pub mod chart;      // Construction de figures et rasterisation PNG
pub mod indicators; // Moyennes mobiles, RSI, niveaux support/résistance
pub mod models;     // Structures de données (barres, timeframes, symboles)
pub mod session;    // Orchestration d'un cycle symbole → graphiques
