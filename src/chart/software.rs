// ============================================================================
// Backend de secours : rasterisation logicielle
// ============================================================================
// Dessine la figure directement dans un buffer RGB avec la crate image,
// sans aucune dépendance à des polices système. C'est le filet de sécurité
// quand plotters échoue (typiquement : environnement sans fontconfig).
//
// Volontairement minimal : chandeliers, polylignes des indicateurs, ligne
// du prix actuel, panneau RSI. Pas de texte ni de graduations.
//
// CONCEPT RUST : dessin pixel par pixel
// - image::RgbImage est un simple buffer ; put_pixel est borné à la main
// - Les segments sont tracés par interpolation linéaire (pas de Bresenham
//   complet, inutile pour des polylignes denses)
// ============================================================================

use std::path::Path;

use image::{Rgb, RgbImage};
use tracing::debug;

use crate::chart::backend::RasterBackend;
use crate::chart::figure::ChartFigure;
use crate::chart::RenderError;

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 800;
/// Frontière entre panneau prix (haut) et panneau RSI (bas) : 70%
const SPLIT: u32 = 560;
/// Marge intérieure des panneaux, en pixels
const PAD: u32 = 10;

const BACKGROUND: Rgb<u8> = Rgb([17, 17, 17]);
const GREEN: Rgb<u8> = Rgb([0, 200, 80]);
const RED: Rgb<u8> = Rgb([220, 50, 50]);
const YELLOW: Rgb<u8> = Rgb([240, 220, 60]);
const ORANGE: Rgb<u8> = Rgb([255, 165, 0]);
const PURPLE: Rgb<u8> = Rgb([160, 32, 240]);
const GREY: Rgb<u8> = Rgb([90, 90, 90]);

/// Backend logiciel sans police ni dépendance système
pub struct SoftwareBackend;

/// Projection d'une valeur dans une bande verticale de l'image
/// (min en bas, max en haut)
struct VScale {
    top: u32,
    bottom: u32,
    lo: f64,
    hi: f64,
}

impl VScale {
    fn y(&self, value: f64) -> i64 {
        let span = (self.hi - self.lo).max(f64::EPSILON);
        let frac = ((value - self.lo) / span).clamp(0.0, 1.0);
        let h = (self.bottom - self.top) as f64;
        self.bottom as i64 - (frac * h) as i64
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn vline(img: &mut RgbImage, x: i64, y0: i64, y1: i64, color: Rgb<u8>) {
    let (a, b) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
    for y in a..=b {
        put(img, x, y, color);
    }
}

fn hline(img: &mut RgbImage, x0: i64, x1: i64, y: i64, color: Rgb<u8>) {
    let (a, b) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
    for x in a..=b {
        put(img, x, y, color);
    }
}

/// Segment quelconque par interpolation linéaire sur l'axe dominant
fn line(img: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let steps = dx.max(dy).max(1);
    for s in 0..=steps {
        let t = s as f64 / steps as f64;
        let x = x0 + ((x1 - x0) as f64 * t).round() as i64;
        let y = y0 + ((y1 - y0) as f64 * t).round() as i64;
        put(img, x, y, color);
    }
}

/// Polyligne sur les valeurs définies d'une colonne d'indicateur
fn polyline(
    img: &mut RgbImage,
    column: &[Option<f64>],
    x_of: &dyn Fn(usize) -> i64,
    scale: &VScale,
    color: Rgb<u8>,
) {
    let mut prev: Option<(i64, i64)> = None;
    for (i, v) in column.iter().enumerate() {
        match v {
            Some(v) => {
                let p = (x_of(i), scale.y(*v));
                if let Some((px, py)) = prev {
                    line(img, px, py, p.0, p.1, color);
                }
                prev = Some(p);
            }
            // Fenêtre incomplète : on coupe la polyligne
            None => prev = None,
        }
    }
}

impl RasterBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn render_to_file(&self, figure: &ChartFigure, path: &Path) -> Result<(), RenderError> {
        let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

        let n = figure.len();
        let slot = (WIDTH - 2 * PAD) as f64 / n as f64;
        let x_of = move |i: usize| (PAD as f64 + (i as f64 + 0.5) * slot) as i64;
        // Demi-largeur du corps des chandeliers
        let half = ((slot / 2.0) - 1.0).max(0.0) as i64;

        let (lo, hi) = figure.price_range();
        let price = VScale {
            top: PAD,
            bottom: SPLIT - PAD,
            lo,
            hi,
        };

        // Chandeliers : mèche sur toute la plage haut/bas, corps plein
        for (i, bar) in figure.bars.iter().enumerate() {
            let x = x_of(i);
            let color = if bar.is_bullish() { GREEN } else { RED };
            vline(&mut img, x, price.y(bar.high), price.y(bar.low), color);
            let (body_top, body_bottom) = if bar.is_bullish() {
                (price.y(bar.close), price.y(bar.open))
            } else {
                (price.y(bar.open), price.y(bar.close))
            };
            for dx in -half..=half {
                vline(&mut img, x + dx, body_top, body_bottom, color);
            }
        }

        // Overlays d'indicateurs
        polyline(&mut img, &figure.ma_fast, &x_of, &price, YELLOW);
        polyline(&mut img, &figure.ma_slow, &x_of, &price, ORANGE);
        polyline(&mut img, &figure.resistance, &x_of, &price, RED);
        polyline(&mut img, &figure.support, &x_of, &price, GREEN);

        // Ligne du prix actuel
        let y_now = price.y(figure.current_price);
        hline(&mut img, PAD as i64, (WIDTH - PAD) as i64, y_now, RED);

        // Panneau RSI : axe fixé à [0, 100], références 70/30
        let rsi = VScale {
            top: SPLIT + PAD,
            bottom: HEIGHT - PAD,
            lo: 0.0,
            hi: 100.0,
        };
        hline(&mut img, PAD as i64, (WIDTH - PAD) as i64, SPLIT as i64, GREY);
        hline(&mut img, PAD as i64, (WIDTH - PAD) as i64, rsi.y(70.0), RED);
        hline(&mut img, PAD as i64, (WIDTH - PAD) as i64, rsi.y(30.0), GREEN);
        polyline(&mut img, &figure.rsi, &x_of, &rsi, PURPLE);

        img.save(path)
            .map_err(|e| RenderError::Backend(format!("software: {}", e)))?;
        debug!(path = %path.display(), "Artefact PNG écrit (software)");
        Ok(())
    }
}
