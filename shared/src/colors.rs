/// Parse `#rrggbb` (leading `#` optional) into an RGB triple.
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

pub fn rgb_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Relative luminance (sRGB, 0..1) per WCAG.
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    fn channel(c: u8) -> f64 {
        let c = c as f64 / 255.0;
        if c <= 0.039_28 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
}

/// Dark or light caption color for text drawn on top of `background`.
/// Unparseable backgrounds get dark text.
pub fn contrasting_text_color(background: &str) -> &'static str {
    match parse_hex_color(background) {
        Some((r, g, b)) if relative_luminance(r, g, b) < 0.4 => "#ffffff",
        _ => "#1a1a1a",
    }
}

#[cfg(test)]
mod tests {
    use super::{contrasting_text_color, parse_hex_color, relative_luminance, rgb_hex};

    fn assert_close(actual: f64, expected: f64) {
        let diff = (actual - expected).abs();
        assert!(
            diff < 1e-9,
            "expected {expected}, got {actual} (diff: {diff})"
        );
    }

    #[test]
    fn parse_hex_color_accepts_with_and_without_hash() {
        assert_eq!(parse_hex_color("#1e88e5"), Some((0x1e, 0x88, 0xe5)));
        assert_eq!(parse_hex_color("E53935"), Some((0xe5, 0x39, 0x35)));
    }

    #[test]
    fn parse_hex_color_rejects_bad_input() {
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
        assert_eq!(parse_hex_color("#ééé"), None);
        assert_eq!(parse_hex_color(""), None);
    }

    #[test]
    fn hex_formatting_is_lowercase_and_padded() {
        assert_eq!(rgb_hex(1, 171, 255), "#01abff");
    }

    #[test]
    fn luminance_of_black_and_white() {
        assert_close(relative_luminance(0, 0, 0), 0.0);
        assert_close(relative_luminance(255, 255, 255), 1.0);
    }

    #[test]
    fn caption_color_contrasts_with_background() {
        assert_eq!(contrasting_text_color("#1e3a8a"), "#ffffff");
        assert_eq!(contrasting_text_color("#fff59d"), "#1a1a1a");
        assert_eq!(contrasting_text_color("not-a-color"), "#1a1a1a");
    }
}
