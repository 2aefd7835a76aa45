// ============================================================================
// Backend principal : plotters
// ============================================================================
// Rasterise la figure à deux panneaux en PNG avec la bibliothèque plotters
//
// Layout (1000×800) :
// - Panneau supérieur (70%) : chandeliers, MA20 jaune, MA50 orange,
//   résistance rouge, support vert, ligne horizontale du prix actuel
// - Panneau inférieur (30%) : RSI violet, lignes de référence 70/30,
//   axe Y fixé à [0, 100]
//
// CONCEPT RUST : Conversion d'erreurs
// - Les erreurs plotters sont génériques sur le backend ; on les aplatit
//   en RenderError::Backend(String) pour garder un type d'erreur simple
// ============================================================================

use std::path::Path;

use plotters::prelude::*;
use tracing::debug;

use crate::chart::backend::RasterBackend;
use crate::chart::figure::ChartFigure;
use crate::chart::RenderError;

/// Largeur de l'image en pixels
const WIDTH: u32 = 1000;
/// Hauteur de l'image en pixels
const HEIGHT: u32 = 800;
/// Hauteur du panneau supérieur : 70% de la figure
const UPPER_HEIGHT: u32 = 560;

/// Couleur de fond (thème sombre, comme le dashboard d'origine)
const BACKGROUND: RGBColor = RGBColor(17, 17, 17);
/// Violet du RSI
const PURPLE: RGBColor = RGBColor(160, 32, 240);
/// Orange de la MA50
const ORANGE: RGBColor = RGBColor(255, 165, 0);

/// Backend plotters (BitMapBackend → PNG)
pub struct PlottersBackend;

/// Aplatit n'importe quelle erreur plotters en RenderError::Backend
fn backend_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Backend(format!("plotters: {}", e))
}

impl RasterBackend for PlottersBackend {
    fn name(&self) -> &'static str {
        "plotters"
    }

    fn render_to_file(&self, figure: &ChartFigure, path: &Path) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&BACKGROUND).map_err(backend_err)?;

        // Deux panneaux empilés partageant l'axe du temps
        let (upper, lower) = root.split_vertically(UPPER_HEIGHT);

        let n = figure.len();
        let x_range = -0.5f64..(n as f64 - 0.5);
        let (price_lo, price_hi) = figure.price_range();

        // ====================================================================
        // Panneau supérieur : chandeliers + overlays
        // ====================================================================
        let mut price_chart = ChartBuilder::on(&upper)
            .caption(
                &figure.title,
                ("sans-serif", 22).into_font().color(&WHITE),
            )
            .margin(8)
            .x_label_area_size(0)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range.clone(), price_lo..price_hi)
            .map_err(backend_err)?;

        price_chart
            .configure_mesh()
            .disable_x_mesh()
            .light_line_style(RGBColor(40, 40, 40))
            .axis_style(RGBColor(120, 120, 120))
            .label_style(("sans-serif", 12).into_font().color(&WHITE))
            .draw()
            .map_err(backend_err)?;

        // Chandeliers : largeur adaptée au nombre de barres visibles
        let candle_width = ((WIDTH / (n as u32 + 2)).saturating_sub(2)).max(1);
        price_chart
            .draw_series(figure.bars.iter().enumerate().map(|(i, bar)| {
                CandleStick::new(
                    i as f64,
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    GREEN.filled(),
                    RED.filled(),
                    candle_width,
                )
            }))
            .map_err(backend_err)?;

        // Overlays : polylignes sur les valeurs définies
        // CONCEPT : les None (fenêtre d'indicateur incomplète) sont sautés
        let overlays: [(&[Option<f64>], RGBColor, &str); 4] = [
            (&figure.ma_fast, YELLOW, "20 MA"),
            (&figure.ma_slow, ORANGE, "50 MA"),
            (&figure.resistance, RED, "Resistance"),
            (&figure.support, GREEN, "Support"),
        ];
        for (column, color, label) in overlays {
            let points: Vec<(f64, f64)> = column
                .iter()
                .enumerate()
                .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
                .collect();
            if points.is_empty() {
                continue;
            }
            price_chart
                .draw_series(LineSeries::new(points, color.stroke_width(1)))
                .map_err(backend_err)?
                .label(label)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2))
                });
        }

        // Ligne horizontale du prix actuel + label formaté
        price_chart
            .draw_series(LineSeries::new(
                vec![
                    (x_range.start, figure.current_price),
                    (x_range.end, figure.current_price),
                ],
                RED.stroke_width(2),
            ))
            .map_err(backend_err)?;
        price_chart
            .draw_series(std::iter::once(Text::new(
                figure.current_price_label.clone(),
                (x_range.start + 0.5, figure.current_price),
                ("sans-serif", 14).into_font().color(&WHITE),
            )))
            .map_err(backend_err)?;

        price_chart
            .configure_series_labels()
            .background_style(BLACK.mix(0.5))
            .border_style(RGBColor(80, 80, 80))
            .label_font(("sans-serif", 12).into_font().color(&WHITE))
            .position(SeriesLabelPosition::UpperLeft)
            .draw()
            .map_err(backend_err)?;

        // ====================================================================
        // Panneau inférieur : RSI, axe fixé à [0, 100]
        // ====================================================================
        let mut rsi_chart = ChartBuilder::on(&lower)
            .margin(8)
            .x_label_area_size(28)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range.clone(), 0f64..100f64)
            .map_err(backend_err)?;

        rsi_chart
            .configure_mesh()
            .disable_x_mesh()
            .y_desc("RSI")
            .light_line_style(RGBColor(40, 40, 40))
            .axis_style(RGBColor(120, 120, 120))
            .label_style(("sans-serif", 12).into_font().color(&WHITE))
            .x_label_formatter(&|x| {
                // L'axe partagé affiche la date de la barre correspondante
                let i = x.round() as usize;
                figure
                    .bars
                    .get(i)
                    .map(|b| b.time.format("%d/%m").to_string())
                    .unwrap_or_default()
            })
            .draw()
            .map_err(backend_err)?;

        let rsi_points: Vec<(f64, f64)> = figure
            .rsi
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
            .collect();
        if !rsi_points.is_empty() {
            rsi_chart
                .draw_series(LineSeries::new(rsi_points, PURPLE.stroke_width(1)))
                .map_err(backend_err)?;
        }

        // Lignes de référence surachat/survente
        for (level, color) in [(70.0, RED), (30.0, GREEN)] {
            rsi_chart
                .draw_series(LineSeries::new(
                    vec![(x_range.start, level), (x_range.end, level)],
                    color.stroke_width(1),
                ))
                .map_err(backend_err)?;
        }

        root.present().map_err(backend_err)?;
        debug!(path = %path.display(), "Artefact PNG écrit (plotters)");
        Ok(())
    }
}
