use eframe::egui::{self, Color32, RichText};
use palette::{FromColor, Hsl, Lighten, Srgb};

use crate::config::{ConfigError, ThemeConfig};

pub const CELL_PADDING: f32 = 8.0;
pub const CELL_FONT_SIZE: f32 = 14.0;
pub const BORDER_WIDTH: f32 = 1.0;

// ---------------------------------------------------------------------------
// Hex colour parsing
// ---------------------------------------------------------------------------

/// Parse `#rrggbb` (or `rrggbb`) into an sRGB colour.
fn parse_hex(key: &'static str, value: &str) -> Result<Srgb<u8>, ConfigError> {
    value.parse::<Srgb<u8>>().map_err(|_| ConfigError::InvalidColor {
        key,
        value: value.to_string(),
    })
}

fn to_color32(rgb: Srgb<u8>) -> Color32 {
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

/// Same hue, lighter by `amount` (0..1) in HSL space.
fn lighten(rgb: Srgb<u8>, amount: f32) -> Color32 {
    let hsl: Hsl = Hsl::from_color(rgb.into_format::<f32>());
    let lighter: Srgb = Srgb::from_color(hsl.lighten(amount));
    to_color32(lighter.into_format())
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Resolved dashboard colours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub site_bg: Color32,
    pub sidebar_bg: Color32,
    pub text: Color32,
    pub header: Color32,
    pub header_text: Color32,
    pub cell_bg: Color32,
    pub cell_text: Color32,
    pub border: Color32,
    /// Selection and hover tint, derived from `header`.
    pub highlight: Color32,
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Result<Self, ConfigError> {
        let header = parse_hex("header", &config.header)?;
        Ok(Theme {
            site_bg: to_color32(parse_hex("site_bg", &config.site_bg)?),
            sidebar_bg: to_color32(parse_hex("sidebar_bg", &config.sidebar_bg)?),
            text: to_color32(parse_hex("text", &config.text)?),
            header: to_color32(header),
            header_text: to_color32(parse_hex("header_text", &config.header_text)?),
            cell_bg: to_color32(parse_hex("cell_bg", &config.cell_bg)?),
            cell_text: to_color32(parse_hex("cell_text", &config.cell_text)?),
            border: to_color32(parse_hex("border", &config.border)?),
            highlight: lighten(header, 0.6),
        })
    }

    /// Install the light visuals with the dashboard colours.
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::light();
        visuals.panel_fill = self.site_bg;
        visuals.window_fill = self.site_bg;
        visuals.override_text_color = Some(self.text);
        visuals.selection.bg_fill = self.highlight;
        visuals.widgets.hovered.weak_bg_fill = self.highlight;
        ctx.set_visuals(visuals);
    }

    pub fn sidebar_frame(&self, style: &egui::Style) -> egui::Frame {
        egui::Frame::side_top_panel(style).fill(self.sidebar_bg)
    }

    /// Bold text in the header colour, for titles.
    pub fn heading(&self, text: impl Into<String>) -> RichText {
        RichText::new(text).color(self.header).strong()
    }

    pub fn header_cell(&self, text: &str) -> RichText {
        RichText::new(text)
            .color(self.header_text)
            .strong()
            .size(CELL_FONT_SIZE)
    }

    pub fn body_cell(&self, text: &str) -> RichText {
        RichText::new(text).color(self.cell_text).size(CELL_FONT_SIZE)
    }
}

impl Default for Theme {
    fn default() -> Self {
        let gray = Color32::from_rgb(0xcc, 0xcc, 0xcc);
        Theme {
            site_bg: Color32::from_rgb(0xf5, 0xf7, 0xfa),
            sidebar_bg: Color32::from_rgb(0xe2, 0xe8, 0xf0),
            text: Color32::from_rgb(0x1f, 0x29, 0x37),
            header: Color32::from_rgb(0x25, 0x63, 0xeb),
            header_text: Color32::WHITE,
            cell_bg: Color32::WHITE,
            cell_text: Color32::from_rgb(0x1f, 0x29, 0x37),
            border: gray,
            highlight: Color32::from_rgb(0xbf, 0xd1, 0xf9),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_builtin_palette() {
        let theme = Theme::from_config(&ThemeConfig::default()).unwrap();
        let builtin = Theme::default();
        assert_eq!(theme.site_bg, builtin.site_bg);
        assert_eq!(theme.header, builtin.header);
        assert_eq!(theme.header_text, Color32::WHITE);
        assert_eq!(theme.border, builtin.border);
    }

    #[test]
    fn highlight_is_lighter_than_header() {
        let theme = Theme::from_config(&ThemeConfig::default()).unwrap();
        let sum = |c: Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
        assert!(sum(theme.highlight) > sum(theme.header));
    }

    #[test]
    fn rejects_bad_hex() {
        let config = ThemeConfig {
            header: "blue-ish".into(),
            ..Default::default()
        };
        let err = Theme::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidColor { key: "header", .. }));
    }
}
