//! Hex color parsing and the brightness/contrast math shared by the palette
//! extractor and the renderers.

/// Parses a strict 6-digit hex color, with or without a leading `#`.
///
/// Anything else yields `None`; callers substitute their own default instead
/// of surfacing an error.
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);

    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Formats an rgb triplet as `#rrggbb`, clamping each channel to `[0, 255]`.
pub fn rgb_to_hex(r: i32, g: i32, b: i32) -> String {
    format!(
        "#{:02x}{:02x}{:02x}",
        r.clamp(0, 255),
        g.clamp(0, 255),
        b.clamp(0, 255)
    )
}

/// ITU-R BT.709 relative luminance on the unnormalized 0-255 scale.
///
/// Unparseable input counts as 0, so malformed colors classify as dark.
pub fn luminance(hex: &str) -> f32 {
    hex_to_rgb(hex).map_or(0.0, |(r, g, b)| {
        0.2126f32.mul_add(
            f32::from(r),
            0.7152f32.mul_add(f32::from(g), 0.0722 * f32::from(b)),
        )
    })
}

/// Backgrounds below this luminance get light-on-dark contrast treatment.
pub const DARK_THRESHOLD: f32 = 128.0;

/// Whether a color should be treated as a dark background.
pub fn is_dark(hex: &str) -> bool {
    luminance(hex) < DARK_THRESHOLD
}

/// Applies contrast, then brightness, to every channel of `hex`.
///
/// Both parameters are percentages centered at 100. Contrast pivots around
/// the channel midpoint; brightness then shifts by `(brightness - 100) * 1.5`
/// per channel. The 1.5 factor is a calibration constant: brightness is meant
/// to move visibly faster than contrast.
///
/// Unparseable input is returned unchanged.
pub fn adjust(hex: &str, brightness: f32, contrast: f32) -> String {
    let Some((r, g, b)) = hex_to_rgb(hex) else {
        return hex.to_owned();
    };

    let channel = |v: u8| {
        let v = (f32::from(v) - 128.0).mul_add(contrast / 100.0, 128.0);
        let v = (brightness - 100.0).mul_add(1.5, v);
        v.round() as i32
    };

    rgb_to_hex(channel(r), channel(g), channel(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_with_and_without_hash() {
        assert_eq!(hex_to_rgb("#102030"), Some((0x10, 0x20, 0x30)));
        assert_eq!(hex_to_rgb("102030"), Some((0x10, 0x20, 0x30)));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert_eq!(hex_to_rgb(""), None);
        assert_eq!(hex_to_rgb("#fff"), None);
        assert_eq!(hex_to_rgb("#12345"), None);
        assert_eq!(hex_to_rgb("#1234567"), None);
        assert_eq!(hex_to_rgb("#12g456"), None);
        assert_eq!(hex_to_rgb("not a color"), None);
    }

    #[test]
    fn round_trips_through_hex_with_clamping() {
        for (r, g, b) in [(0, 0, 0), (255, 255, 255), (12, 128, 200), (-5, 300, 128)] {
            let hex = rgb_to_hex(r, g, b);
            assert_eq!(
                hex_to_rgb(&hex),
                Some((
                    r.clamp(0, 255) as u8,
                    g.clamp(0, 255) as u8,
                    b.clamp(0, 255) as u8
                ))
            );
        }
    }

    #[test]
    fn adjust_is_identity_at_defaults() {
        for hex in ["#000000", "#ffffff", "#808080", "#12ab9f"] {
            assert_eq!(adjust(hex, 100.0, 100.0), hex);
        }
    }

    #[test]
    fn adjust_returns_malformed_input_unchanged() {
        assert_eq!(adjust("nope", 150.0, 120.0), "nope");
    }

    #[test]
    fn brightness_saturates_midpoint_gray() {
        // contrast leaves the 128 midpoint alone; brightness moves it by
        // (b - 100) * 1.5 per channel, clamped
        assert_eq!(adjust("#808080", 200.0, 100.0), "#ffffff");
        assert_eq!(adjust("#808080", 0.0, 100.0), "#000000");
    }

    #[test]
    fn luminance_is_monotonic_per_channel() {
        let lum = |r: i32, g: i32, b: i32| luminance(&rgb_to_hex(r, g, b));

        for v in 0..255 {
            assert!(lum(v + 1, 40, 40) > lum(v, 40, 40));
            assert!(lum(40, v + 1, 40) > lum(40, v, 40));
            assert!(lum(40, 40, v + 1) > lum(40, 40, v));
        }
    }

    #[test]
    fn dark_classification() {
        assert!(is_dark("#000000"));
        assert!(is_dark("#202040"));
        assert!(!is_dark("#ffffff"));
        assert!(is_dark("garbage"));
    }
}
