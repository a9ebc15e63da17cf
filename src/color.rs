use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
/// Used for the donut slices.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = 180.0 + (i as f32 / n as f32) * 120.0;
            let hsl = Hsl::new(hue, 0.70, 0.60);
            hsl_to_color32(hsl)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sequential ramp for the correlation heatmaps
// ---------------------------------------------------------------------------

/// Map a Pearson coefficient in [-1, 1] to a heatmap cell colour.
///
/// The ramp runs dark blue-violet (−1) through teal to yellow-green (+1);
/// NaN cells (degenerate columns) render neutral grey.
pub fn correlation_color(r: f64) -> Color32 {
    if r.is_nan() {
        return Color32::GRAY;
    }
    let t = ((r + 1.0) / 2.0).clamp(0.0, 1.0) as f32;
    let hue = 265.0 - t * 180.0;
    let lightness = 0.25 + t * 0.45;
    hsl_to_color32(Hsl::new(hue, 0.65, lightness))
}

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_length() {
        assert!(generate_palette(0).is_empty());
        assert_eq!(generate_palette(2).len(), 2);
        // Distinct hues for distinct slices.
        let p = generate_palette(2);
        assert_ne!(p[0], p[1]);
    }

    #[test]
    fn correlation_endpoints_differ_and_nan_is_grey() {
        assert_ne!(correlation_color(-1.0), correlation_color(1.0));
        assert_eq!(correlation_color(f64::NAN), Color32::GRAY);
    }
}
