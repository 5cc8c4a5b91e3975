use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::colors::contrasting_text_color;
use crate::layer::LayerConfiguration;
use crate::properties::escape_html;

const FONT_SIZE_PX: u32 = 11;
const CHAR_WIDTH_PX: u32 = 7;
const PADDING_X_PX: u32 = 4;
const HEIGHT_PX: u32 = 16;
const MAX_LABEL_CHARS: usize = 24;

/// Inline image used as the icon of a text-label marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelIcon {
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

impl LabelIcon {
    /// Offset that puts the caption's top-left corner just right of the point.
    pub const fn anchor(&self) -> (u32, u32) {
        (0, self.height / 2)
    }
}

/// Render `text` as a small pill in the layer color and wrap it as a data URI.
pub fn label_icon(text: &str, layer: &LayerConfiguration) -> LabelIcon {
    let caption: String = text.chars().take(MAX_LABEL_CHARS).collect();
    let width = caption.chars().count() as u32 * CHAR_WIDTH_PX + PADDING_X_PX * 2;
    let text_color = contrasting_text_color(&layer.color);
    let svg = format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}">"#,
            r#"<rect x="0" y="0" width="{w}" height="{h}" rx="3" ry="3" fill="{bg}" fill-opacity="0.85"/>"#,
            r#"<text x="{px}" y="{ty}" font-family="monospace" font-size="{fs}" fill="{fg}">{text}</text>"#,
            "</svg>"
        ),
        w = width,
        h = HEIGHT_PX,
        bg = escape_html(&layer.color),
        px = PADDING_X_PX,
        ty = HEIGHT_PX - 4,
        fs = FONT_SIZE_PX,
        fg = text_color,
        text = escape_html(&caption),
    );
    LabelIcon {
        data_uri: format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg)),
        width,
        height: HEIGHT_PX,
    }
}
