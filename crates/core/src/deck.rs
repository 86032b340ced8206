//! Deck specification: the JSON description of a deck to generate.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Layout used when a slide spec names none.
pub const DEFAULT_SLIDE_LAYOUT: &str = "Title Slide";

/// Series name used when a chart spec does not provide one.
pub const DEFAULT_SERIES_NAME: &str = "Series 1";

/// A deck to build on top of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSpec {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub slides: Vec<SlideSpec>,

    #[serde(default = "default_meta")]
    pub meta: BTreeMap<String, String>,
}

impl Default for DeckSpec {
    fn default() -> Self {
        Self {
            title: None,
            slides: Vec::new(),
            meta: default_meta(),
        }
    }
}

fn default_meta() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("locale".to_string(), "en-US".to_string()),
        ("timezone".to_string(), "Europe/Warsaw".to_string()),
    ])
}

/// One slide of a [`DeckSpec`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bullets: Vec<TextValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSpec>,
}

impl SlideSpec {
    /// Layout to use: `layoutName`, then `layout`, then "Title Slide".
    pub fn layout_name(&self) -> &str {
        self.layout_name
            .as_deref()
            .or(self.layout.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SLIDE_LAYOUT)
    }

    /// Bullet texts as strings.
    pub fn bullet_texts(&self) -> Vec<String> {
        self.bullets.iter().map(|b| b.0.clone()).collect()
    }
}

/// A free-form JSON scalar coerced to its display text.
///
/// Strings keep their content; numbers and booleans use their JSON form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Value", into = "String")]
pub struct TextValue(pub String);

impl From<Value> for TextValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self(s),
            Value::Null => Self(String::new()),
            other => Self(other.to_string()),
        }
    }
}

impl From<TextValue> for String {
    fn from(value: TextValue) -> Self {
        value.0
    }
}

impl From<&str> for TextValue {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single-series chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(rename = "type", default)]
    pub chart_type: ChartType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub data: Vec<ChartPoint>,
}

/// Supported chart kinds. Unknown names fall back to a clustered column chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ChartType {
    Bar,
    #[default]
    Column,
    Line,
    Pie,
}

impl From<String> for ChartType {
    fn from(name: String) -> Self {
        match name.trim().to_lowercase().as_str() {
            "bar" => Self::Bar,
            "line" => Self::Line,
            "pie" => Self::Pie,
            _ => Self::Column,
        }
    }
}

/// One `[category, value]` row of chart data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(TextValue, f64)", into = "(String, f64)")]
pub struct ChartPoint {
    pub category: String,
    pub value: f64,
}

impl ChartPoint {
    pub fn new(category: impl Into<String>, value: f64) -> Self {
        Self {
            category: category.into(),
            value,
        }
    }
}

impl From<(TextValue, f64)> for ChartPoint {
    fn from((category, value): (TextValue, f64)) -> Self {
        Self {
            category: category.0,
            value,
        }
    }
}

impl From<ChartPoint> for (String, f64) {
    fn from(point: ChartPoint) -> Self {
        (point.category, point.value)
    }
}
