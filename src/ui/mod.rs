//! Ratatui rendering: treemap widget, metric cards, and page navigation.

pub mod cards;
pub mod pages;
pub mod treemap;

use ratatui::style::Color;

// Palette: cream highlight on a dark slate base, mirroring the web dashboard.
pub const CREAM: Color = Color::Rgb(0xF7, 0xF3, 0xE9);
pub const SLATE: Color = Color::Rgb(0x4A, 0x55, 0x68);
pub const ACCENT: Color = Color::Rgb(0x37, 0x72, 0xFF);
pub const TEAL: Color = Color::Rgb(0x5A, 0xC4, 0xBE);
pub const MAGENTA: Color = Color::Rgb(0xC2, 0x00, 0xFB);
pub const UP: Color = Color::Rgb(0x4E, 0xCD, 0xC4);
pub const DOWN: Color = Color::Rgb(0xFF, 0x6B, 0x6B);
pub const DIM: Color = Color::Rgb(0x6B, 0x72, 0x80);
pub const BRIGHT: Color = Color::Rgb(0xE2, 0xE8, 0xF0);

/// Colour for a signed percentage change.
pub fn change_color(change: f64) -> Color {
    if change >= 0.0 {
        UP
    } else {
        DOWN
    }
}

/// Scale an RGB colour by `factor` in `[0.0, 1.0]`.
pub fn scale_rgb(color: Color, factor: f64) -> Color {
    let f = factor.clamp(0.0, 1.0);
    match color {
        Color::Rgb(r, g, b) => Color::Rgb(
            (r as f64 * f) as u8,
            (g as f64 * f) as u8,
            (b as f64 * f) as u8,
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_rgb_bounds() {
        assert_eq!(scale_rgb(Color::Rgb(100, 200, 50), 1.0), Color::Rgb(100, 200, 50));
        assert_eq!(scale_rgb(Color::Rgb(100, 200, 50), 0.0), Color::Rgb(0, 0, 0));
        assert_eq!(scale_rgb(Color::Rgb(100, 200, 50), 0.5), Color::Rgb(50, 100, 25));
        // Out-of-range factors clamp instead of wrapping
        assert_eq!(scale_rgb(Color::Rgb(200, 200, 200), 2.0), Color::Rgb(200, 200, 200));
    }

    #[test]
    fn test_change_color_sign() {
        assert_eq!(change_color(1.5), UP);
        assert_eq!(change_color(0.0), UP);
        assert_eq!(change_color(-0.1), DOWN);
    }
}
