// ============================================================================
// LazyChart : graphiques chandeliers forex/crypto depuis Yahoo Finance
// ============================================================================
// Pour chaque symbole passé en argument (ou un jeu par défaut), récupère
// l'historique sur les trois timeframes (M5, H1, D1), calcule les
// indicateurs (MA20, MA50, RSI14, support/résistance) et écrit un PNG
// par couple (symbole, timeframe) dans ./charts/.
//
// CONCEPTS RUST CLÉS :
// 1. Async dans sync : tokio::runtime::Runtime pour les appels API
// 2. anyhow::Result au niveau binaire, erreurs typées dans la lib
// 3. Un échec de timeframe n'interrompt pas le cycle (bilan en fin)
// ============================================================================

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info};

use lazychart::models::ALL_SYMBOLS;
use lazychart::session::{ChartOptions, Session};

/// Symboles tracés quand aucun argument n'est fourni
/// (`lazychart all` parcourt le catalogue complet)
const DEFAULT_SYMBOLS: &[&str] = &["EURUSD", "GBPUSD", "USDJPY", "BTCUSD"];

// ============================================================================
// Logging
// ============================================================================

fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = std::path::PathBuf::from("./logs");

    // Crée le répertoire s'il n'existe pas
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    // Rotation quotidienne : lazychart.log.2024-01-15, etc.
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "lazychart.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(
            // CONCEPT : EnvFilter
            // - RUST_LOG=debug : tous les logs debug+
            // - Par défaut : debug pour lazychart, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazychart=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée
// ============================================================================

fn main() -> Result<()> {
    // Logging d'abord ; s'il échoue on continue sans
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("LazyChart starting up");

    // Symboles : arguments de la ligne de commande, ou jeu par défaut
    let args: Vec<String> = std::env::args().skip(1).collect();
    let symbols: Vec<String> = match args.as_slice() {
        [] => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        // "all" : tout le catalogue du dashboard (28 paires forex + BTCUSD)
        [single] if single == "all" => ALL_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        _ => args,
    };

    let out_dir = PathBuf::from("./charts");
    std::fs::create_dir_all(&out_dir).context("Échec de la création du répertoire de sortie")?;

    // CONCEPT RUST : Async dans sync
    // - .block_on() exécute la future de manière bloquante
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(symbols, out_dir))
}

async fn run(symbols: Vec<String>, out_dir: PathBuf) -> Result<()> {
    let mut session = Session::new(ChartOptions {
        requested_bars: 100,
        visible_bars: None,
        out_dir,
    })
    .context("Échec de l'initialisation du client HTTP")?;

    let mut total_ok = 0usize;
    let mut total_attempted = 0usize;

    for symbol in &symbols {
        println!("📊 {} ...", symbol);
        let report = session.run_cycle(symbol).await;

        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(success) => {
                    let artifact = success
                        .artifact
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "(pas de PNG)".to_string());
                    println!(
                        "   ✅ {} : {} barres → {}",
                        outcome.timeframe.label(),
                        success.bars,
                        artifact
                    );
                }
                Err(e) => {
                    println!("   ❌ {} : {}", outcome.timeframe.label(), e);
                    error!(symbol = %symbol, timeframe = outcome.timeframe.label(), error = %e, "Échec");
                }
            }
        }

        total_ok += report.succeeded();
        total_attempted += report.attempted();
    }

    println!("\nBilan : {}/{} graphiques générés", total_ok, total_attempted);
    info!(total_ok, total_attempted, "Cycle terminé");
    Ok(())
}
