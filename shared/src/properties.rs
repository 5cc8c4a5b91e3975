use geojson::JsonObject;
use serde_json::Value;

/// Untyped property bag of a GeoJSON feature, as handed to selection callbacks.
pub type FeatureProperties = serde_json::Map<String, Value>;

const TITLE_KEY: &str = "name";
const LABEL_KEYS: [&str; 4] = ["label", "number", "node", "name"];

/// Copy a feature's property object into a flat record. Missing properties
/// yield an empty record.
pub fn flatten_properties(properties: Option<&JsonObject>) -> FeatureProperties {
    properties.cloned().unwrap_or_default()
}

/// Human-readable rendering of one property value.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Info-window body for a clicked feature: `name` first, then every other
/// property in record order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoWindowContent {
    pub title: Option<String>,
    pub rows: Vec<(String, String)>,
}

impl InfoWindowContent {
    pub fn from_properties(properties: &FeatureProperties) -> Self {
        let title = properties.get(TITLE_KEY).map(display_value);
        let rows = properties
            .iter()
            .filter(|(key, _)| key.as_str() != TITLE_KEY)
            .map(|(key, value)| (key.clone(), display_value(value)))
            .collect();
        Self { title, rows }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from(r#"<div class="fm-info">"#);
        if let Some(title) = &self.title {
            html.push_str(r#"<div class="fm-info-title">"#);
            html.push_str(&escape_html(title));
            html.push_str("</div>");
        }
        for (key, value) in &self.rows {
            html.push_str(r#"<div class="fm-info-row"><span class="fm-info-key">"#);
            html.push_str(&escape_html(key));
            html.push_str(r#"</span> <span class="fm-info-value">"#);
            html.push_str(&escape_html(value));
            html.push_str("</span></div>");
        }
        html.push_str("</div>");
        html
    }
}

/// Caption for a label overlay, if the feature carries one.
pub fn label_text(properties: &FeatureProperties) -> Option<String> {
    LABEL_KEYS.iter().find_map(|key| match properties.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
