//! Periodogram Rendering

use crate::error::SpectralError;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use std::io::Cursor;

/// Image width in pixels
pub const PLOT_WIDTH: u32 = 640;
/// Image height in pixels
pub const PLOT_HEIGHT: u32 = 480;

const MARGIN_LEFT: u32 = 60;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 20;
const MARGIN_BOTTOM: u32 = 40;
const GRID_DIVISIONS: u32 = 5;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const GRID: Rgb<u8> = Rgb([220, 220, 220]);
const AXES: Rgb<u8> = Rgb([0, 0, 0]);
const TRACE: Rgb<u8> = Rgb([31, 119, 180]);

/// Plot power in dB against frequency and encode the image as PNG
pub fn render_psd(frequencies: &[f64], power: &[f64]) -> Result<Vec<u8>, SpectralError> {
    if frequencies.is_empty() || frequencies.len() != power.len() {
        return Err(SpectralError::Render(format!(
            "need matching non-empty axes, got {} frequencies and {} powers",
            frequencies.len(),
            power.len()
        )));
    }

    let decibels: Vec<f64> = power
        .iter()
        .map(|&p| 10.0 * p.max(f64::MIN_POSITIVE).log10())
        .collect();
    let (mut db_min, mut db_max) = decibels
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !db_min.is_finite() {
        return Err(SpectralError::Render("power contains no finite values".into()));
    }
    if db_max - db_min < 1e-9 {
        db_min -= 1.0;
        db_max += 1.0;
    }
    let f_min = frequencies[0];
    let f_max = frequencies[frequencies.len() - 1];
    let f_span = if f_max > f_min { f_max - f_min } else { 1.0 };

    let plot_w = PLOT_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = PLOT_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let (x0, y0) = (MARGIN_LEFT as f32, MARGIN_TOP as f32);
    let (x1, y1) = ((MARGIN_LEFT + plot_w) as f32, (MARGIN_TOP + plot_h) as f32);

    let mut img = RgbImage::from_pixel(PLOT_WIDTH, PLOT_HEIGHT, BACKGROUND);

    for i in 1..GRID_DIVISIONS {
        let fx = x0 + (x1 - x0) * i as f32 / GRID_DIVISIONS as f32;
        let fy = y0 + (y1 - y0) * i as f32 / GRID_DIVISIONS as f32;
        draw_line_segment_mut(&mut img, (fx, y0), (fx, y1), GRID);
        draw_line_segment_mut(&mut img, (x0, fy), (x1, fy), GRID);
    }

    let to_pixel = |f: f64, db: f64| -> (f32, f32) {
        let x = x0 as f64 + (f - f_min) / f_span * plot_w as f64;
        let db = if db.is_finite() { db } else { db_min };
        let y = y1 as f64 - (db - db_min) / (db_max - db_min) * plot_h as f64;
        (x as f32, y as f32)
    };

    let points: Vec<(f32, f32)> = frequencies
        .iter()
        .zip(&decibels)
        .map(|(&f, &db)| to_pixel(f, db))
        .collect();
    for pair in points.windows(2) {
        draw_line_segment_mut(&mut img, pair[0], pair[1], TRACE);
    }

    draw_hollow_rect_mut(
        &mut img,
        Rect::at(MARGIN_LEFT as i32, MARGIN_TOP as i32).of_size(plot_w + 1, plot_h + 1),
        AXES,
    );

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| SpectralError::Render(e.to_string()))?;
    Ok(bytes)
}
