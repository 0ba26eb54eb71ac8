pub mod color;
pub mod extractor;

use iced::Color;

/// The palette used before any cover image has been loaded, and whenever
/// extraction fails.
const DEFAULT_BACKGROUND: &str = "#1a1a2e";
const DEFAULT_TEXT: &str = "#eaeaea";
const DEFAULT_TRACKS: [&str; 6] = [
    "#00d9ff", "#ff6b6b", "#ffd93d", "#6bcb77", "#b39ddb", "#ff9f43",
];

/// A named bundle of display colors, each a `#rrggbb` hex string.
///
/// `tracks` is guaranteed to hold at least two entries; the constructor pads
/// with a white/black fallback chosen against the background so that cyclic
/// track coloring always has something to contrast with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThemePalette {
    pub background: String,
    pub scope: String,
    pub text: String,
    tracks: Vec<String>,
}

impl ThemePalette {
    pub fn new(background: String, mut tracks: Vec<String>) -> Self {
        let fallback = if color::is_dark(&background) {
            "#ffffff"
        } else {
            "#000000"
        };

        while tracks.len() < 2 {
            tracks.push(fallback.to_owned());
        }

        Self {
            scope: tracks[0].clone(),
            text: tracks[0].clone(),
            background,
            tracks,
        }
    }

    pub fn tracks(&self) -> &[String] {
        &self.tracks
    }

    /// Whether the background calls for light-on-dark styling.
    pub fn is_dark(&self) -> bool {
        color::is_dark(&self.background)
    }

    /// The display color for a note group.
    ///
    /// Deterministic and stable across frames for any `track`/`channel`,
    /// however large.
    pub fn track_color(&self, track: u32, channel: u8) -> Color {
        let index = (track as usize + usize::from(channel)) % self.tracks.len();
        parse_or(&self.tracks[index], Color::WHITE)
    }

    pub fn background_color(&self) -> Color {
        parse_or(&self.background, parse_or(DEFAULT_BACKGROUND, Color::BLACK))
    }

    pub fn scope_color(&self) -> Color {
        parse_or(&self.scope, Color::WHITE)
    }

    pub fn text_color(&self) -> Color {
        parse_or(&self.text, Color::WHITE)
    }

    /// Derives the application-wide iced theme from this palette, so the
    /// surrounding chrome picks up the extracted colors too.
    pub fn to_iced(&self) -> iced::Theme {
        let base = if self.is_dark() {
            iced::theme::Palette::DARK
        } else {
            iced::theme::Palette::LIGHT
        };

        iced::Theme::custom(
            "rollscope".to_owned(),
            iced::theme::Palette {
                background: self.background_color(),
                text: self.text_color(),
                primary: self.scope_color(),
                ..base
            },
        )
    }
}

impl Default for ThemePalette {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND.to_owned(),
            scope: DEFAULT_TRACKS[0].to_owned(),
            text: DEFAULT_TEXT.to_owned(),
            tracks: DEFAULT_TRACKS.map(str::to_owned).to_vec(),
        }
    }
}

fn parse_or(hex: &str, fallback: Color) -> Color {
    color::hex_to_rgb(hex).map_or(fallback, |(r, g, b)| Color::from_rgb8(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_holds_invariants() {
        let palette = ThemePalette::default();

        assert!(palette.tracks().len() >= 2);
        assert!(palette.is_dark());
    }

    #[test]
    fn constructor_pads_to_two_tracks() {
        let dark = ThemePalette::new("#000000".to_owned(), vec![]);
        assert_eq!(dark.tracks(), ["#ffffff", "#ffffff"]);

        let light = ThemePalette::new("#ffffff".to_owned(), vec!["#123456".to_owned()]);
        assert_eq!(light.tracks(), ["#123456", "#000000"]);
        assert_eq!(light.scope, "#123456");
        assert_eq!(light.text, "#123456");
    }

    #[test]
    fn track_color_index_is_always_valid() {
        let palette = ThemePalette::default();

        // no panic for arbitrarily large track/channel combinations
        for (track, channel) in [(0, 0), (3, 9), (u32::MAX, u8::MAX), (12_345, 16)] {
            let _color = palette.track_color(track, channel);
        }
    }

    #[test]
    fn track_color_cycles_deterministically() {
        let palette = ThemePalette::new(
            "#000000".to_owned(),
            vec!["#ff0000".to_owned(), "#00ff00".to_owned()],
        );

        assert_eq!(palette.track_color(0, 0), palette.track_color(1, 1));
        assert_eq!(palette.track_color(0, 1), palette.track_color(2, 1));
        assert_ne!(palette.track_color(0, 0), palette.track_color(0, 1));
    }

    #[test]
    fn malformed_entries_fall_back_instead_of_failing() {
        let palette = ThemePalette::new(
            "not-a-color".to_owned(),
            vec!["also bad".to_owned(), "#00ff00".to_owned()],
        );

        assert_eq!(palette.track_color(0, 0), Color::WHITE);
        assert_eq!(palette.background_color(), Color::from_rgb8(0x1a, 0x1a, 0x2e));
    }
}
